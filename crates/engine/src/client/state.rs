use std::fmt::{self, Debug};
use std::time::Duration;

use bytes::Bytes;
use huddle_actor::{Actor, Message, Ticker};
use huddle_wire::{
    ClientHint, Conversation, ConversationId, MediaKind, Message as WireMessage,
    MessageId, NewMessage, RoomEvent, UploadPayload, WorkItemId,
};
use tokio::select;
use tokio::sync::oneshot;
use tracing::Instrument;

use crate::api::Api;
use crate::client::RecorderUpdate;
use crate::composer::{self, Composer};
use crate::connection::{Channel, ChannelSignal};
use crate::media::{BoxedCapture, Mic};
use crate::notice::Notice;
use crate::recorder::{Finish, Recorder};
use crate::scroll::{FollowTracker, Viewport};
use crate::session::{SessionSnapshot, SessionStore};
use crate::uploads::Uploader;

const VOICE_FILE_NAME: &str = "voice-note.webm";
const VOICE_CONTENT_TYPE: &str = "audio/webm";

pub(crate) type SessionCallback =
    Box<dyn Fn(SessionSnapshot) + Send + Sync>;
pub(crate) type ScrollCallback = Box<dyn Fn() + Send + Sync>;
pub(crate) type RecorderCallback =
    Box<dyn Fn(RecorderUpdate) + Send + Sync>;
pub(crate) type NoticeCallback = Box<dyn Fn(Notice) + Send + Sync>;

#[derive(Default)]
pub(crate) struct Callbacks {
    pub(crate) on_session: Option<SessionCallback>,
    pub(crate) on_scroll_to_bottom: Option<ScrollCallback>,
    pub(crate) on_recorder: Option<RecorderCallback>,
    pub(crate) on_notice: Option<NoticeCallback>,
}

pub(crate) struct ClientState {
    api: Api,
    channel: Channel,
    uploader: Uploader,
    mic: Option<Mic>,
    session: SessionStore,
    composer: Composer,
    follow: FollowTracker,
    recorder: Recorder,
    // Bumped on every conversation switch. In-flight work carries the
    // epoch it was started under; results whose epoch no longer
    // matches must not touch the now-active conversation.
    epoch: u64,
    callbacks: Callbacks,
}

impl ClientState {
    pub(crate) fn new(
        api: Api,
        channel: Channel,
        uploader: Uploader,
        mic: Option<Mic>,
        callbacks: Callbacks,
    ) -> Self {
        Self {
            api,
            channel,
            uploader,
            mic,
            session: SessionStore::new(),
            composer: Composer::default(),
            follow: FollowTracker::new(),
            recorder: Recorder::new(),
            epoch: 0,
            callbacks,
        }
    }

    fn emit_session(&self) {
        if let Some(on_session) = &self.callbacks.on_session {
            on_session(self.session.snapshot());
        }
    }

    fn emit_scroll(&self) {
        if let Some(on_scroll) = &self.callbacks.on_scroll_to_bottom {
            on_scroll();
        }
    }

    fn emit_recorder(&self, update: RecorderUpdate) {
        if let Some(on_recorder) = &self.callbacks.on_recorder {
            on_recorder(update);
        }
    }

    fn emit_notice(&self, notice: Notice) {
        debug!("notice: {notice}");
        if let Some(on_notice) = &self.callbacks.on_notice {
            on_notice(notice);
        }
    }

    fn active_conversation(&self) -> Option<ConversationId> {
        self.session.conversation().map(|c| c.id.clone())
    }
}

/// Selects the conversation for a work item.
#[derive(Debug)]
pub(crate) struct OpenConversation(pub(crate) WorkItemId);

impl Message<ClientState> for OpenConversation {
    fn handle(self, state: &mut ClientState, actor: &Actor<ClientState>) {
        state.epoch += 1;
        let epoch = state.epoch;
        // Empty the cache right away so the previous room's messages
        // can never show under the new conversation.
        state.session.clear();
        state.emit_session();

        let api = state.api.clone();
        let channel = state.channel.clone();
        let actor = actor.clone();
        tokio::spawn(
            async move {
                let conversation = match api
                    .get_or_create_conversation(self.0)
                    .await
                {
                    Ok(conversation) => conversation,
                    Err(err) => {
                        actor
                            .send(HydrateFailed {
                                epoch,
                                reason: format!("{err}"),
                            })
                            .ok();
                        return;
                    }
                };
                // Join before fetching the snapshot; events raced with
                // the fetch are superseded by it anyway.
                channel.join(&conversation.id);
                match api.list_messages(conversation.id.clone()).await {
                    Ok(messages) => {
                        actor
                            .send(Hydrated {
                                epoch,
                                conversation,
                                messages,
                            })
                            .ok();
                    }
                    Err(err) => {
                        actor
                            .send(HydrateFailed {
                                epoch,
                                reason: format!("{err}"),
                            })
                            .ok();
                    }
                }
            }
            .instrument(trace_span!("open conversation")),
        );
    }
}

#[derive(Debug)]
struct Hydrated {
    epoch: u64,
    conversation: Conversation,
    messages: Vec<WireMessage>,
}

impl Message<ClientState> for Hydrated {
    fn handle(self, state: &mut ClientState, _actor: &Actor<ClientState>) {
        if self.epoch != state.epoch {
            debug!("dropping hydrate for a conversation we left");
            return;
        }
        state.session.hydrate(self.conversation, self.messages);
        state.follow.on_conversation_switch();
        state.emit_session();
        state.emit_scroll();
    }
}

#[derive(Debug)]
struct HydrateFailed {
    epoch: u64,
    reason: String,
}

impl Message<ClientState> for HydrateFailed {
    fn handle(self, state: &mut ClientState, _actor: &Actor<ClientState>) {
        if self.epoch != state.epoch {
            return;
        }
        state.emit_notice(Notice::LoadFailed {
            reason: self.reason,
        });
    }
}

/// A signal forwarded from the event channel.
#[derive(Debug)]
pub(crate) struct SignalReceived(pub(crate) ChannelSignal);

impl Message<ClientState> for SignalReceived {
    fn handle(self, state: &mut ClientState, _actor: &Actor<ClientState>) {
        match self.0 {
            ChannelSignal::Event(event) => {
                if state.session.conversation().is_none() {
                    // Between a switch and its hydrate there is no
                    // active conversation to apply events to.
                    return;
                }
                let created = matches!(&event, RoomEvent::Created(_));
                if !state.session.apply(event) {
                    return;
                }
                if created && state.follow.on_new_message() {
                    state.emit_scroll();
                }
                state.emit_session();
            }
            ChannelSignal::Closed(reason) => {
                state.emit_notice(Notice::ChannelDown { reason });
            }
        }
    }
}

/// Reports the latest scroll geometry of the message list.
#[derive(Debug)]
pub(crate) struct SetViewport(pub(crate) Viewport);

impl Message<ClientState> for SetViewport {
    #[inline]
    fn handle(self, state: &mut ClientState, _actor: &Actor<ClientState>) {
        state.follow.observe(self.0);
    }
}

/// Replaces the text draft.
#[derive(Debug)]
pub(crate) struct SetDraft(pub(crate) String);

impl Message<ClientState> for SetDraft {
    #[inline]
    fn handle(self, state: &mut ClientState, _actor: &Actor<ClientState>) {
        state.composer.set_draft(self.0);
    }
}

/// Points the next send at a cached message, or clears the pointer.
#[derive(Debug)]
pub(crate) struct SetReplyTarget(pub(crate) Option<MessageId>);

impl Message<ClientState> for SetReplyTarget {
    fn handle(self, state: &mut ClientState, _actor: &Actor<ClientState>) {
        match self.0 {
            Some(id) => {
                let preview = state.session.reply_preview_for(&id);
                if preview.is_none() {
                    debug!("reply target {id} is not in the cache");
                    return;
                }
                state.session.set_reply_target(preview);
            }
            None => state.session.set_reply_target(None),
        }
        state.emit_session();
    }
}

/// Sends the current draft and reply pointer.
#[derive(Debug)]
pub(crate) struct SendDraft;

impl Message<ClientState> for SendDraft {
    fn handle(self, state: &mut ClientState, actor: &Actor<ClientState>) {
        let Some(conversation) = state.active_conversation() else {
            state.emit_notice(Notice::NoConversation);
            return;
        };
        let reply_to = state.session.reply_target().cloned();
        let Some(message) = state.composer.build_text(reply_to) else {
            state.emit_notice(Notice::EmptyMessage);
            return;
        };

        let epoch = state.epoch;
        spawn_create(
            state,
            actor,
            conversation,
            message,
            move |result| TextSent { epoch, result },
        );
    }
}

#[derive(Debug)]
struct TextSent {
    epoch: u64,
    result: Result<(), String>,
}

impl Message<ClientState> for TextSent {
    fn handle(self, state: &mut ClientState, _actor: &Actor<ClientState>) {
        match self.result {
            Ok(()) => {
                if self.epoch != state.epoch {
                    // The send targeted a conversation we already left;
                    // the new view's draft must stay untouched.
                    return;
                }
                state.composer.clear();
                state.session.clear_reply_target();
                state.emit_session();
            }
            Err(reason) => {
                // The draft is preserved so the user can retry.
                state.emit_notice(Notice::SendFailed { reason });
            }
        }
    }
}

/// Validates and sends a file attachment.
pub(crate) struct SendAttachment {
    pub(crate) file_name: String,
    pub(crate) content_type: String,
    pub(crate) bytes: Bytes,
}

impl Debug for SendAttachment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SendAttachment")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("byte_len", &self.bytes.len())
            .finish()
    }
}

impl Message<ClientState> for SendAttachment {
    fn handle(self, state: &mut ClientState, actor: &Actor<ClientState>) {
        let Some(conversation) = state.active_conversation() else {
            state.emit_notice(Notice::NoConversation);
            return;
        };
        let byte_len = self.bytes.len() as u64;
        if let Err(violation) = state.uploader.check(
            MediaKind::ChatFile,
            &self.content_type,
            byte_len,
        ) {
            state.emit_notice(Notice::UploadRejected(violation));
            return;
        }

        let uploader = state.uploader.clone();
        let api = state.api.clone();
        let channel = state.channel.clone();
        let actor = actor.clone();
        tokio::spawn(
            async move {
                let payload = UploadPayload {
                    bytes: self.bytes,
                    file_name: self.file_name.clone(),
                    content_type: self.content_type.clone(),
                };
                let blob = match uploader
                    .put(MediaKind::ChatFile, payload)
                    .await
                {
                    Ok(blob) => blob,
                    Err(err) => {
                        // The source file is still in the user's hands;
                        // they can re-trigger from the same input.
                        actor
                            .send(Failed(Notice::UploadFailed {
                                reason: format!("{err}"),
                            }))
                            .ok();
                        return;
                    }
                };
                let message = composer::attachment_message(
                    blob,
                    self.file_name,
                    self.content_type,
                    byte_len,
                );
                match api
                    .create_message(conversation.clone(), message)
                    .await
                {
                    Ok(created) => {
                        channel.emit(ClientHint::Send {
                            conversation,
                            message: created,
                        });
                    }
                    Err(err) => {
                        actor
                            .send(Failed(Notice::SendFailed {
                                reason: format!("{err}"),
                            }))
                            .ok();
                    }
                }
            }
            .instrument(trace_span!("send attachment")),
        );
    }
}

/// Deletes a message through the durable path.
#[derive(Debug)]
pub(crate) struct DeleteMessage(pub(crate) MessageId);

impl Message<ClientState> for DeleteMessage {
    fn handle(self, state: &mut ClientState, actor: &Actor<ClientState>) {
        let Some(conversation) = state.active_conversation() else {
            state.emit_notice(Notice::NoConversation);
            return;
        };
        let api = state.api.clone();
        let channel = state.channel.clone();
        let actor = actor.clone();
        tokio::spawn(async move {
            match api
                .delete_message(conversation.clone(), self.0.clone())
                .await
            {
                Ok(()) => {
                    // The cache entry goes away when the deletion is
                    // echoed back to the room.
                    channel.emit(ClientHint::Delete {
                        conversation,
                        message: self.0,
                    });
                }
                Err(err) => {
                    actor
                        .send(Failed(Notice::DeleteFailed {
                            reason: format!("{err}"),
                        }))
                        .ok();
                }
            }
        });
    }
}

/// Surfaces a failure from a background task.
#[derive(Debug)]
struct Failed(Notice);

impl Message<ClientState> for Failed {
    #[inline]
    fn handle(self, state: &mut ClientState, _actor: &Actor<ClientState>) {
        state.emit_notice(self.0);
    }
}

/// Starts a voice take.
#[derive(Debug)]
pub(crate) struct BeginRecording;

impl Message<ClientState> for BeginRecording {
    fn handle(self, state: &mut ClientState, actor: &Actor<ClientState>) {
        if state.session.conversation().is_none() {
            state.emit_notice(Notice::NoConversation);
            return;
        }
        let Some(mic) = state.mic.clone() else {
            state.emit_notice(Notice::MicrophoneUnavailable {
                reason: "no audio input device is configured".to_owned(),
            });
            return;
        };
        let Some(attempt) = state.recorder.begin() else {
            // Only one take can exist at a time.
            warn!("a recording is already active");
            return;
        };
        state.emit_recorder(RecorderUpdate::Requesting);

        let actor = actor.clone();
        tokio::spawn(async move {
            let result = mic.open().await;
            actor.send(DeviceOpened { attempt, result }).ok();
        });
    }
}

struct DeviceOpened {
    attempt: u64,
    result: crate::media::OpenResult,
}

impl Debug for DeviceOpened {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceOpened")
            .field("attempt", &self.attempt)
            .field("granted", &self.result.is_ok())
            .finish()
    }
}

impl Message<ClientState> for DeviceOpened {
    fn handle(self, state: &mut ClientState, actor: &Actor<ClientState>) {
        let capture = match self.result {
            Ok(capture) => capture,
            Err(err) => {
                if state.recorder.device_failed(self.attempt) {
                    state.emit_notice(Notice::MicrophoneUnavailable {
                        reason: format!("{err}"),
                    });
                    state.emit_recorder(RecorderUpdate::Idle);
                }
                return;
            }
        };
        if !state.recorder.is_awaiting_device(self.attempt) {
            // Cancelled while the platform was showing its permission
            // prompt. Dropping the capture releases the device.
            return;
        }

        let attempt = self.attempt;
        let (stop_tx, stop_rx) = oneshot::channel();
        spawn_drain(capture, stop_rx, actor.clone(), attempt);
        let ticker =
            Ticker::every(Duration::from_secs(1), actor, move |_| {
                RecorderTick { attempt }
            });
        state.recorder.device_ready(attempt, ticker, stop_tx);
        state.emit_recorder(RecorderUpdate::Recording { elapsed_secs: 0 });
    }
}

fn spawn_drain(
    mut capture: BoxedCapture,
    mut stop_rx: oneshot::Receiver<()>,
    actor: Actor<ClientState>,
    attempt: u64,
) {
    tokio::spawn(
        async move {
            loop {
                select! {
                    biased;

                    _ = &mut stop_rx => break,
                    chunk = capture.next_chunk() => match chunk {
                        Some(bytes) => {
                            let msg = CaptureChunk { attempt, bytes };
                            if actor.send(msg).is_err() {
                                break;
                            }
                        }
                        None => {
                            actor.send(CaptureEnded { attempt }).ok();
                            break;
                        }
                    },
                }
            }
            // The capture is dropped here, releasing the device.
        }
        .instrument(trace_span!("capture drain")),
    );
}

struct CaptureChunk {
    attempt: u64,
    bytes: Bytes,
}

impl Debug for CaptureChunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CaptureChunk")
            .field("attempt", &self.attempt)
            .field("byte_len", &self.bytes.len())
            .finish()
    }
}

impl Message<ClientState> for CaptureChunk {
    #[inline]
    fn handle(self, state: &mut ClientState, _actor: &Actor<ClientState>) {
        state.recorder.push_chunk(self.attempt, self.bytes);
    }
}

#[derive(Debug)]
struct CaptureEnded {
    attempt: u64,
}

impl Message<ClientState> for CaptureEnded {
    fn handle(self, state: &mut ClientState, _actor: &Actor<ClientState>) {
        if !state.recorder.is_recording(self.attempt) {
            return;
        }
        // The device stream died under us; the take is unusable.
        state.recorder.cancel();
        state.emit_notice(Notice::RecordingFailed {
            reason: "the capture stream ended unexpectedly".to_owned(),
        });
        state.emit_recorder(RecorderUpdate::Idle);
    }
}

#[derive(Debug)]
struct RecorderTick {
    attempt: u64,
}

impl Message<ClientState> for RecorderTick {
    fn handle(self, state: &mut ClientState, _actor: &Actor<ClientState>) {
        if let Some(elapsed_secs) = state.recorder.tick(self.attempt) {
            state.emit_recorder(RecorderUpdate::Recording { elapsed_secs });
        }
    }
}

/// Discards the current take.
#[derive(Debug)]
pub(crate) struct CancelRecording;

impl Message<ClientState> for CancelRecording {
    fn handle(self, state: &mut ClientState, _actor: &Actor<ClientState>) {
        if state.recorder.cancel() {
            state.emit_recorder(RecorderUpdate::Idle);
        }
    }
}

/// Ends the current take and sends it as a voice note.
#[derive(Debug)]
pub(crate) struct FinishRecording;

impl Message<ClientState> for FinishRecording {
    fn handle(self, state: &mut ClientState, actor: &Actor<ClientState>) {
        let Some(conversation) = state.active_conversation() else {
            if state.recorder.cancel() {
                state.emit_recorder(RecorderUpdate::Idle);
            }
            state.emit_notice(Notice::NoConversation);
            return;
        };
        let (bytes, duration_secs) = match state.recorder.finish() {
            Finish::Inactive => return,
            Finish::TooShort => {
                state.emit_notice(Notice::RecordingTooShort);
                state.emit_recorder(RecorderUpdate::Idle);
                return;
            }
            Finish::Clip {
                bytes,
                duration_secs,
            } => (bytes, duration_secs),
        };
        if let Err(violation) = state.uploader.check(
            MediaKind::VoiceNote,
            VOICE_CONTENT_TYPE,
            bytes.len() as u64,
        ) {
            state.emit_notice(Notice::UploadRejected(violation));
            state.emit_recorder(RecorderUpdate::Idle);
            return;
        }
        state.emit_recorder(RecorderUpdate::Uploading);

        let uploader = state.uploader.clone();
        let api = state.api.clone();
        let channel = state.channel.clone();
        let actor = actor.clone();
        tokio::spawn(
            async move {
                let payload = UploadPayload {
                    bytes,
                    file_name: VOICE_FILE_NAME.to_owned(),
                    content_type: VOICE_CONTENT_TYPE.to_owned(),
                };
                let blob = match uploader
                    .put(MediaKind::VoiceNote, payload)
                    .await
                {
                    Ok(blob) => blob,
                    Err(err) => {
                        // The clip is dropped with this task; the user
                        // records again.
                        actor
                            .send(VoiceSent {
                                result: Err(Notice::UploadFailed {
                                    reason: format!("{err}"),
                                }),
                            })
                            .ok();
                        return;
                    }
                };
                let message = composer::voice_message(
                    blob,
                    VOICE_FILE_NAME.to_owned(),
                    duration_secs,
                );
                let result = match api
                    .create_message(conversation.clone(), message)
                    .await
                {
                    Ok(created) => {
                        channel.emit(ClientHint::Send {
                            conversation,
                            message: created,
                        });
                        Ok(())
                    }
                    Err(err) => Err(Notice::SendFailed {
                        reason: format!("{err}"),
                    }),
                };
                actor.send(VoiceSent { result }).ok();
            }
            .instrument(trace_span!("send voice note")),
        );
    }
}

#[derive(Debug)]
struct VoiceSent {
    result: Result<(), Notice>,
}

impl Message<ClientState> for VoiceSent {
    fn handle(self, state: &mut ClientState, _actor: &Actor<ClientState>) {
        state.emit_recorder(RecorderUpdate::Idle);
        if let Err(notice) = self.result {
            state.emit_notice(notice);
        }
    }
}

fn spawn_create<M, F>(
    state: &ClientState,
    actor: &Actor<ClientState>,
    conversation: ConversationId,
    message: NewMessage,
    done: F,
) where
    M: Message<ClientState>,
    F: FnOnce(Result<(), String>) -> M + Send + 'static,
{
    let api = state.api.clone();
    let channel = state.channel.clone();
    let actor = actor.clone();
    tokio::spawn(
        async move {
            let result = match api
                .create_message(conversation.clone(), message)
                .await
            {
                Ok(created) => {
                    channel.emit(ClientHint::Send {
                        conversation,
                        message: created,
                    });
                    Ok(())
                }
                Err(err) => Err(format!("{err}")),
            };
            actor.send(done(result)).ok();
        }
        .instrument(trace_span!("send message")),
    );
}
