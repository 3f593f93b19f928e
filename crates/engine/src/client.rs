//! The engine's front door: one actor per chat view.

mod builder;
mod state;
#[cfg(test)]
mod tests;

use bytes::Bytes;
use huddle_actor::{Actor, Message};
use huddle_wire::{MessageId, WorkItemId};

use crate::scroll::Viewport;
use state::ClientState;

pub use builder::ClientBuilder;

/// What the recorder is doing, for the view's record control.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecorderUpdate {
    /// Nothing is being recorded.
    Idle,
    /// Waiting for the platform to grant the microphone.
    Requesting,
    /// Actively recording.
    Recording {
        /// Whole seconds captured so far.
        elapsed_secs: u32,
    },
    /// A finished clip is on its way to storage.
    Uploading,
}

/// One live chat view over a work item's conversation.
///
/// All methods post a message to the view's actor and return
/// immediately; outcomes arrive through the callbacks configured on
/// [`ClientBuilder`]. Every mutation here takes the durable REST path
/// and is reflected in the cache only when the service echoes it back
/// over the event channel, the same way every other room member sees
/// it.
pub struct ChatClient {
    actor: Actor<ClientState>,
}

impl ChatClient {
    /// Selects the conversation for a work item: joins its room and
    /// replaces the message cache with a fresh snapshot.
    pub fn open_conversation(&self, work_item: WorkItemId) {
        self.post(state::OpenConversation(work_item));
    }

    /// Reports the message list's scroll geometry. Feeds the
    /// auto-follow decision; the engine never scrolls a view it wasn't
    /// told about.
    pub fn set_viewport(&self, viewport: Viewport) {
        self.post(state::SetViewport(viewport));
    }

    /// Replaces the draft of the next text message.
    pub fn set_draft<S: Into<String>>(&self, text: S) {
        self.post(state::SetDraft(text.into()));
    }

    /// Points the next send at a cached message, or clears the pointer
    /// with `None`.
    pub fn set_reply_target(&self, target: Option<MessageId>) {
        self.post(state::SetReplyTarget(target));
    }

    /// Sends the current draft (and reply pointer, if set).
    ///
    /// An empty draft with no reply pointer is rejected synchronously
    /// with a notice; nothing goes on the wire.
    pub fn send_draft(&self) {
        self.post(state::SendDraft);
    }

    /// Validates and sends a file attachment.
    pub fn send_attachment<S: Into<String>>(
        &self,
        file_name: S,
        content_type: S,
        bytes: Bytes,
    ) {
        self.post(state::SendAttachment {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes,
        });
    }

    /// Deletes a message. The cache entry goes away when the deletion
    /// echo comes back.
    pub fn delete_message(&self, message: MessageId) {
        self.post(state::DeleteMessage(message));
    }

    /// Starts a voice take by requesting the microphone.
    pub fn begin_recording(&self) {
        self.post(state::BeginRecording);
    }

    /// Discards the current take: no network call, microphone released
    /// immediately.
    pub fn cancel_recording(&self) {
        self.post(state::CancelRecording);
    }

    /// Ends the current take and sends it as a voice note, unless it
    /// is too short to be worth sending.
    pub fn finish_recording(&self) {
        self.post(state::FinishRecording);
    }

    /// Tears the view down. Queued work is finished first, then the
    /// state is dropped, which releases the microphone and any timers.
    pub fn close(&self) {
        self.actor.close();
    }

    #[inline]
    fn post<M: Message<ClientState>>(&self, msg: M) {
        self.actor
            .send(msg)
            .expect("chat client has been closed too early");
    }

    #[inline]
    pub(crate) fn from_actor(actor: Actor<ClientState>) -> Self {
        Self { actor }
    }
}
