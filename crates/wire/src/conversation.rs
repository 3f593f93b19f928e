use serde::{Deserialize, Serialize};

use crate::ids::{ConversationId, WorkItemId};
use crate::message::UserRef;

/// A conversation scoped to one work item.
///
/// Conversations are owned by the server and created lazily on first
/// access; the client only holds a read/write projection.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    /// Stable identity, derived from the work item by the server.
    pub id: ConversationId,
    /// The work item this conversation is attached to.
    pub work_item: WorkItemId,
    /// Users participating in the conversation.
    pub participants: Vec<UserRef>,
    /// Server-issued creation timestamp, opaque to the client.
    pub created_at: String,
}
