use std::error::Error;

use crate::conversation::Conversation;
use crate::ids::{ConversationId, MessageId, WorkItemId};
use crate::message::{Message, NewMessage};

/// The kind of error raised by the chat service.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ApiErrorKind {
    /// The caller's credentials were rejected.
    Unauthorized,
    /// The addressed conversation or message does not exist.
    NotFound,
    /// The request never made it to the service, or the response never
    /// made it back.
    Network,
    /// Any other errors.
    Other,
}

/// The error type for the chat service.
pub trait ApiError: Error + Send + Sync + 'static {
    /// Returns the kind of this error.
    fn kind(&self) -> ApiErrorKind;
}

/// The REST boundary of the chat service.
///
/// This is the durable write path: every mutation goes through here
/// first and is echoed back over the event channel to all room members,
/// including the caller. Implementations should behave like stateless
/// objects and must not retry failed calls on their own.
pub trait ChatApi: Send + Sync + 'static {
    /// The error type that may be returned by the service.
    type Error: ApiError;

    /// Returns the conversation attached to a work item, creating it on
    /// first access. The call is idempotent.
    fn get_or_create_conversation(
        &self,
        work_item: &WorkItemId,
    ) -> impl Future<Output = Result<Conversation, Self::Error>> + Send + 'static;

    /// Returns the full message snapshot of a conversation, oldest
    /// first.
    fn list_messages(
        &self,
        conversation: &ConversationId,
    ) -> impl Future<Output = Result<Vec<Message>, Self::Error>> + Send + 'static;

    /// Creates a message and returns it with its server-assigned
    /// identity, author, and timestamp filled in.
    fn create_message(
        &self,
        conversation: &ConversationId,
        message: NewMessage,
    ) -> impl Future<Output = Result<Message, Self::Error>> + Send + 'static;

    /// Removes a message.
    fn delete_message(
        &self,
        conversation: &ConversationId,
        message: &MessageId,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'static;
}
