use crate::ids::{ConversationId, MessageId};
use crate::message::Message;

/// A room-scoped mutation observed on the event channel.
///
/// Events arrive in the order the server fanned them out; the client
/// applies them as-is and never reorders.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RoomEvent {
    /// A message was created in the joined room.
    Created(Message),
    /// A message was replaced in the joined room.
    Updated(Message),
    /// A message was removed from the joined room.
    Deleted(MessageId),
}

/// A best-effort outbound fan-out hint.
///
/// The durable write path is always the REST call; these hints only let
/// other open clients update without polling, so failures to deliver
/// them are not errors.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ClientHint {
    /// Tells the room about a message that was just created.
    Send {
        /// The room to fan out to.
        conversation: ConversationId,
        /// The message as returned by the create call.
        message: Message,
    },
    /// Tells the room about a message that was just deleted.
    Delete {
        /// The room to fan out to.
        conversation: ConversationId,
        /// The deleted message.
        message: MessageId,
    },
}
