//! The per-conversation message cache.

use huddle_wire::{Conversation, Message, MessageId, ReplyPreview, RoomEvent};

/// Longest quoted excerpt carried by a reply pointer.
const EXCERPT_LEN: usize = 120;

/// The ordered message list of the active conversation, plus the
/// pending reply pointer.
///
/// This is the single source of truth a view renders. Messages are kept
/// in the order their create events were observed; the store never
/// re-sorts. Switching conversations replaces the whole cache so stale
/// messages can never bleed across rooms.
#[derive(Default)]
pub struct SessionStore {
    conversation: Option<Conversation>,
    messages: Vec<Message>,
    reply_target: Option<ReplyPreview>,
}

impl SessionStore {
    /// Creates an empty store with no active conversation.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the active conversation, if any.
    #[inline]
    pub fn conversation(&self) -> Option<&Conversation> {
        self.conversation.as_ref()
    }

    /// Returns the cached messages in arrival order.
    #[inline]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Drops the whole cache, leaving no active conversation.
    pub fn clear(&mut self) {
        self.conversation = None;
        self.messages.clear();
        self.reply_target = None;
    }

    /// Replaces the whole cache with a fresh snapshot.
    ///
    /// A reply pointer from the previous conversation would dangle, so
    /// it is dropped as well.
    pub fn hydrate(
        &mut self,
        conversation: Conversation,
        messages: Vec<Message>,
    ) {
        self.conversation = Some(conversation);
        self.messages = messages;
        self.reply_target = None;
    }

    /// Applies one room event and reports whether the list changed.
    ///
    /// Creates append, updates replace in place, deletes remove; an
    /// update or delete for an unknown id is a no-op. A duplicate
    /// create for an id already present is ignored, since the channel may
    /// deliver an event more than once.
    pub fn apply(&mut self, event: RoomEvent) -> bool {
        match event {
            RoomEvent::Created(message) => {
                if self.position_of(&message.id).is_some() {
                    trace!("ignoring duplicate create for {}", message.id);
                    return false;
                }
                self.messages.push(message);
                true
            }
            RoomEvent::Updated(message) => {
                match self.position_of(&message.id) {
                    Some(idx) => {
                        self.messages[idx] = message;
                        true
                    }
                    None => false,
                }
            }
            RoomEvent::Deleted(id) => match self.position_of(&id) {
                Some(idx) => {
                    self.messages.remove(idx);
                    true
                }
                None => false,
            },
        }
    }

    /// Records the message the next send should reference, or clears
    /// it.
    #[inline]
    pub fn set_reply_target(&mut self, target: Option<ReplyPreview>) {
        self.reply_target = target;
    }

    /// Returns the pending reply pointer, if any.
    #[inline]
    pub fn reply_target(&self) -> Option<&ReplyPreview> {
        self.reply_target.as_ref()
    }

    /// Clears the pending reply pointer.
    #[inline]
    pub fn clear_reply_target(&mut self) {
        self.reply_target = None;
    }

    /// Builds a denormalized reply pointer to a cached message.
    pub fn reply_preview_for(&self, id: &MessageId) -> Option<ReplyPreview> {
        let message = self
            .messages
            .iter()
            .find(|message| message.id == *id)?;
        Some(ReplyPreview {
            id: message.id.clone(),
            author_name: message.author.display_name.clone(),
            excerpt: excerpt_of(message),
        })
    }

    /// Returns the messages whose body or author name contains `query`
    /// (case-insensitive), preserving arrival order.
    ///
    /// This is a pure projection; the cache itself is untouched.
    pub fn search<'a>(&'a self, query: &str) -> Vec<&'a Message> {
        search_in(&self.messages, query)
    }

    /// Clones the store's contents for a view to render.
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            conversation: self.conversation.clone(),
            messages: self.messages.clone(),
            reply_target: self.reply_target.clone(),
        }
    }

    fn position_of(&self, id: &MessageId) -> Option<usize> {
        self.messages.iter().position(|message| message.id == *id)
    }
}

/// An owned copy of the session contents, handed to render callbacks.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionSnapshot {
    /// The active conversation, if any.
    pub conversation: Option<Conversation>,
    /// The cached messages in arrival order.
    pub messages: Vec<Message>,
    /// The pending reply pointer, if any.
    pub reply_target: Option<ReplyPreview>,
}

impl SessionSnapshot {
    /// Same projection as [`SessionStore::search`], over the snapshot.
    pub fn search<'a>(&'a self, query: &str) -> Vec<&'a Message> {
        search_in(&self.messages, query)
    }
}

fn search_in<'a>(messages: &'a [Message], query: &str) -> Vec<&'a Message> {
    let query = query.to_lowercase();
    messages
        .iter()
        .filter(|message| {
            message
                .body
                .as_deref()
                .is_some_and(|body| body.to_lowercase().contains(&query))
                || message
                    .author
                    .display_name
                    .to_lowercase()
                    .contains(&query)
        })
        .collect()
}

fn excerpt_of(message: &Message) -> String {
    if let Some(body) = &message.body {
        return body.chars().take(EXCERPT_LEN).collect();
    }
    if let Some(attachment) = &message.attachment {
        return attachment.file_name.clone();
    }
    if message.voice.is_some() {
        return "Voice note".to_owned();
    }
    String::new()
}

#[cfg(test)]
mod tests {
    use huddle_wire::{Attachment, UserId, UserRef};

    use super::*;

    fn author(name: &str) -> UserRef {
        UserRef {
            id: UserId::from(name),
            display_name: name.to_owned(),
            contact: format!("{name}@example.com"),
        }
    }

    fn text_message(id: &str, from: &str, body: &str) -> Message {
        Message {
            id: MessageId::from(id),
            author: author(from),
            body: Some(body.to_owned()),
            attachment: None,
            voice: None,
            reply_to: None,
            created_at: "2024-05-01T10:00:00Z".to_owned(),
        }
    }

    fn conversation() -> Conversation {
        Conversation {
            id: huddle_wire::ConversationId::from("c1"),
            work_item: huddle_wire::WorkItemId::from("w1"),
            participants: vec![author("ana"), author("bo")],
            created_at: "2024-05-01T09:00:00Z".to_owned(),
        }
    }

    fn hydrated_store() -> SessionStore {
        let mut store = SessionStore::new();
        store.hydrate(conversation(), vec![]);
        store
    }

    #[test]
    fn test_replay_matches_per_event_semantics() {
        let mut store = hydrated_store();
        let events = vec![
            RoomEvent::Created(text_message("m1", "ana", "one")),
            RoomEvent::Created(text_message("m2", "bo", "two")),
            RoomEvent::Updated(text_message("m1", "ana", "one, edited")),
            RoomEvent::Created(text_message("m3", "ana", "three")),
            RoomEvent::Deleted(MessageId::from("m2")),
            // Unknown targets must be no-ops.
            RoomEvent::Updated(text_message("m9", "bo", "ghost")),
            RoomEvent::Deleted(MessageId::from("m8")),
        ];
        for event in events {
            store.apply(event);
        }

        let bodies: Vec<_> = store
            .messages()
            .iter()
            .map(|m| m.body.as_deref().unwrap())
            .collect();
        assert_eq!(bodies, ["one, edited", "three"]);
    }

    #[test]
    fn test_duplicate_create_is_ignored() {
        let mut store = hydrated_store();
        assert!(store.apply(RoomEvent::Created(text_message(
            "m1", "ana", "hello"
        ))));
        assert!(!store.apply(RoomEvent::Created(text_message(
            "m1", "ana", "hello"
        ))));
        assert_eq!(store.messages().len(), 1);
    }

    #[test]
    fn test_hydrate_replaces_and_drops_reply_target() {
        let mut store = hydrated_store();
        store.apply(RoomEvent::Created(text_message("m1", "ana", "old")));
        let target = store.reply_preview_for(&MessageId::from("m1"));
        store.set_reply_target(target);
        assert!(store.reply_target().is_some());

        store.hydrate(
            conversation(),
            vec![text_message("m7", "bo", "fresh")],
        );
        assert_eq!(store.messages().len(), 1);
        assert_eq!(store.messages()[0].id, MessageId::from("m7"));
        assert!(store.reply_target().is_none());
    }

    #[test]
    fn test_reply_preview_carries_author_and_excerpt() {
        let mut store = hydrated_store();
        store.apply(RoomEvent::Created(text_message(
            "m1",
            "ana",
            "please look at the invoice",
        )));
        let preview =
            store.reply_preview_for(&MessageId::from("m1")).unwrap();
        assert_eq!(preview.author_name, "ana");
        assert_eq!(preview.excerpt, "please look at the invoice");
        assert!(store.reply_preview_for(&MessageId::from("nope")).is_none());
    }

    #[test]
    fn test_excerpt_prefers_body_then_file_name() {
        let mut store = hydrated_store();
        let mut message = text_message("m1", "ana", "x");
        message.body = None;
        message.attachment = Some(Attachment {
            url: "https://blobs/x".to_owned(),
            file_name: "report.pdf".to_owned(),
            mime_type: "application/pdf".to_owned(),
            byte_len: 1024,
        });
        store.apply(RoomEvent::Created(message));
        let preview =
            store.reply_preview_for(&MessageId::from("m1")).unwrap();
        assert_eq!(preview.excerpt, "report.pdf");
    }

    #[test]
    fn test_search_is_case_insensitive_and_ordered() {
        let mut store = hydrated_store();
        for (id, from, body) in [
            ("m1", "ana", "the INVOICE is due"),
            ("m2", "bo", "lunch?"),
            ("m3", "Invoice Bot", "ping"),
            ("m4", "ana", "resend the invoice please"),
        ] {
            store.apply(RoomEvent::Created(text_message(id, from, body)));
        }

        let hits: Vec<_> = store
            .search("invoice")
            .iter()
            .map(|m| m.id.as_str().to_owned())
            .collect();
        assert_eq!(hits, ["m1", "m3", "m4"]);
        // The cache itself is untouched.
        assert_eq!(store.messages().len(), 4);
    }
}
