use std::collections::HashMap;
use std::error::Error as StdError;
use std::fmt::{self, Display};
use std::future::ready;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use huddle_wire::{
    ApiError, ApiErrorKind, ChatApi, Conversation, ConversationId, Message,
    MessageId, NewMessage, UserId, UserRef, WorkItemId,
};

const CREATED_AT: &str = "2024-05-01T10:00:00Z";

/// Error type for [`MemoryApi`].
#[derive(Debug)]
pub struct Error {
    message: &'static str,
    kind: ApiErrorKind,
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.message.fmt(f)
    }
}

impl StdError for Error {}

impl ApiError for Error {
    #[inline]
    fn kind(&self) -> ApiErrorKind {
        self.kind
    }
}

#[derive(Default)]
struct State {
    conversations: HashMap<WorkItemId, Conversation>,
    messages: HashMap<ConversationId, Vec<Message>>,
    next_conversation: u32,
    next_message: u32,
}

struct Inner {
    author: UserRef,
    state: Mutex<State>,
    fail_next_create: AtomicBool,
    fail_next_list: AtomicBool,
    fail_next_delete: AtomicBool,
}

/// An in-memory chat service.
///
/// Conversations are created lazily per work item, message ids are
/// assigned by the fake "server", and everything written can be read
/// back for assertions. Calls can be primed to fail once.
#[derive(Clone)]
pub struct MemoryApi {
    inner: Arc<Inner>,
}

impl Default for MemoryApi {
    fn default() -> Self {
        Self::with_author(UserRef {
            id: UserId::from("you"),
            display_name: "You".to_owned(),
            contact: "you@example.com".to_owned(),
        })
    }
}

impl MemoryApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a service that attributes created messages to `author`.
    pub fn with_author(author: UserRef) -> Self {
        Self {
            inner: Arc::new(Inner {
                author,
                state: Mutex::default(),
                fail_next_create: AtomicBool::new(false),
                fail_next_list: AtomicBool::new(false),
                fail_next_delete: AtomicBool::new(false),
            }),
        }
    }

    /// Makes the next `create_message` call fail.
    pub fn fail_next_create(&self) {
        self.inner.fail_next_create.store(true, Ordering::Relaxed);
    }

    /// Makes the next `list_messages` call fail.
    pub fn fail_next_list(&self) {
        self.inner.fail_next_list.store(true, Ordering::Relaxed);
    }

    /// Makes the next `delete_message` call fail.
    pub fn fail_next_delete(&self) {
        self.inner.fail_next_delete.store(true, Ordering::Relaxed);
    }

    /// Pre-seeds the message log of a conversation.
    pub fn seed_messages(
        &self,
        conversation: &ConversationId,
        messages: Vec<Message>,
    ) {
        let mut state = self.inner.state.lock().unwrap();
        state.messages.insert(conversation.clone(), messages);
    }

    /// The messages stored for a conversation.
    pub fn messages_in(&self, conversation: &ConversationId) -> Vec<Message> {
        let state = self.inner.state.lock().unwrap();
        state.messages.get(conversation).cloned().unwrap_or_default()
    }

    /// The conversation attached to a work item, if one was created.
    pub fn conversation_for(
        &self,
        work_item: &WorkItemId,
    ) -> Option<Conversation> {
        let state = self.inner.state.lock().unwrap();
        state.conversations.get(work_item).cloned()
    }

    fn take_flag(flag: &AtomicBool) -> bool {
        flag.swap(false, Ordering::Relaxed)
    }
}

impl ChatApi for MemoryApi {
    type Error = Error;

    fn get_or_create_conversation(
        &self,
        work_item: &WorkItemId,
    ) -> impl Future<Output = Result<Conversation, Self::Error>> + Send + 'static
    {
        let inner = Arc::clone(&self.inner);
        let mut state = inner.state.lock().unwrap();
        let conversation = match state.conversations.get(work_item) {
            Some(found) => found.clone(),
            None => {
                state.next_conversation += 1;
                let conversation = Conversation {
                    id: ConversationId::new(format!(
                        "conv-{}",
                        state.next_conversation
                    )),
                    work_item: work_item.clone(),
                    participants: vec![inner.author.clone()],
                    created_at: CREATED_AT.to_owned(),
                };
                state
                    .conversations
                    .insert(work_item.clone(), conversation.clone());
                conversation
            }
        };
        drop(state);
        ready(Ok(conversation))
    }

    fn list_messages(
        &self,
        conversation: &ConversationId,
    ) -> impl Future<Output = Result<Vec<Message>, Self::Error>> + Send + 'static
    {
        if Self::take_flag(&self.inner.fail_next_list) {
            return ready(Err(Error {
                message: "list failed by script",
                kind: ApiErrorKind::Network,
            }));
        }
        ready(Ok(self.messages_in(conversation)))
    }

    fn create_message(
        &self,
        conversation: &ConversationId,
        message: NewMessage,
    ) -> impl Future<Output = Result<Message, Self::Error>> + Send + 'static
    {
        if Self::take_flag(&self.inner.fail_next_create) {
            return ready(Err(Error {
                message: "create failed by script",
                kind: ApiErrorKind::Network,
            }));
        }
        let mut state = self.inner.state.lock().unwrap();
        state.next_message += 1;
        let created = Message {
            id: MessageId::new(format!("msg-{}", state.next_message)),
            author: self.inner.author.clone(),
            body: message.body,
            attachment: message.attachment,
            voice: message.voice,
            reply_to: message.reply_to,
            created_at: CREATED_AT.to_owned(),
        };
        state
            .messages
            .entry(conversation.clone())
            .or_default()
            .push(created.clone());
        drop(state);
        ready(Ok(created))
    }

    fn delete_message(
        &self,
        conversation: &ConversationId,
        message: &MessageId,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'static {
        if Self::take_flag(&self.inner.fail_next_delete) {
            return ready(Err(Error {
                message: "delete failed by script",
                kind: ApiErrorKind::Network,
            }));
        }
        let mut state = self.inner.state.lock().unwrap();
        let result = match state.messages.get_mut(conversation) {
            Some(log) => {
                let before = log.len();
                log.retain(|m| m.id != *message);
                if log.len() < before {
                    Ok(())
                } else {
                    Err(Error {
                        message: "no such message",
                        kind: ApiErrorKind::NotFound,
                    })
                }
            }
            None => Err(Error {
                message: "no such conversation",
                kind: ApiErrorKind::NotFound,
            }),
        };
        drop(state);
        ready(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_get_or_create_is_idempotent() {
        let api = MemoryApi::new();
        let work_item = WorkItemId::from("w1");
        let first =
            api.get_or_create_conversation(&work_item).await.unwrap();
        let second =
            api.get_or_create_conversation(&work_item).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_create_assigns_ids_in_order() {
        let api = MemoryApi::new();
        let conversation = ConversationId::from("c1");
        let m1 = api
            .create_message(
                &conversation,
                NewMessage {
                    body: Some("one".to_owned()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let m2 = api
            .create_message(
                &conversation,
                NewMessage {
                    body: Some("two".to_owned()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_ne!(m1.id, m2.id);
        assert_eq!(api.messages_in(&conversation).len(), 2);
    }
}
