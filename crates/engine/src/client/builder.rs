use huddle_actor::Actor;
use huddle_wire::{BlobStore, ChatApi, MicSource};
use tracing::Instrument;

use super::{ChatClient, RecorderUpdate};
use crate::api::Api;
use crate::client::state::{Callbacks, ClientState, SignalReceived};
use crate::connection::{Channel, ChannelEvents};
use crate::media::Mic;
use crate::notice::Notice;
use crate::session::SessionSnapshot;
use crate::uploads::{UploadPolicy, Uploader};

/// [`ChatClient`] builder.
///
/// The channel handle is shared: open it once per view and inject the
/// same handle here; the builder never opens a connection of its own.
pub struct ClientBuilder {
    api: Api,
    channel: Channel,
    events: ChannelEvents,
    uploader: Uploader,
    mic: Option<Mic>,
    callbacks: Callbacks,
}

impl ClientBuilder {
    /// Creates a builder from the chat service, the blob store, and an
    /// open channel.
    pub fn new<A: ChatApi, S: BlobStore>(
        api: A,
        blobs: S,
        channel: Channel,
        events: ChannelEvents,
    ) -> Self {
        Self {
            api: Api::new(api),
            channel,
            events,
            uploader: Uploader::new(blobs),
            mic: None,
            callbacks: Callbacks::default(),
        }
    }

    /// Attaches an audio input device for voice notes. Without one,
    /// starting a recording surfaces a notice instead.
    #[inline]
    pub fn with_mic<M: MicSource>(self, mic: M) -> Self {
        self.with_mic_handle(Mic::new(mic))
    }

    /// Attaches an already-erased device handle.
    #[inline]
    pub fn with_mic_handle(mut self, mic: Mic) -> Self {
        self.mic = Some(mic);
        self
    }

    /// Overrides the default upload validation policy.
    #[inline]
    pub fn with_upload_policy(mut self, policy: UploadPolicy) -> Self {
        self.uploader.set_policy(policy);
        self
    }

    /// Attaches a callback invoked with a fresh snapshot whenever the
    /// session contents change.
    #[inline]
    pub fn on_session(
        mut self,
        on_session: impl Fn(SessionSnapshot) + Send + Sync + 'static,
    ) -> Self {
        self.callbacks.on_session = Some(Box::new(on_session));
        self
    }

    /// Attaches a callback invoked when the view should scroll to the
    /// newest message.
    #[inline]
    pub fn on_scroll_to_bottom(
        mut self,
        on_scroll: impl Fn() + Send + Sync + 'static,
    ) -> Self {
        self.callbacks.on_scroll_to_bottom = Some(Box::new(on_scroll));
        self
    }

    /// Attaches a callback invoked when the recorder changes state.
    #[inline]
    pub fn on_recorder(
        mut self,
        on_recorder: impl Fn(RecorderUpdate) + Send + Sync + 'static,
    ) -> Self {
        self.callbacks.on_recorder = Some(Box::new(on_recorder));
        self
    }

    /// Attaches a callback invoked with user-facing failure notices.
    #[inline]
    pub fn on_notice(
        mut self,
        on_notice: impl Fn(Notice) + Send + Sync + 'static,
    ) -> Self {
        self.callbacks.on_notice = Some(Box::new(on_notice));
        self
    }

    /// Builds the client and starts consuming channel signals.
    pub fn build(self) -> ChatClient {
        let ClientBuilder {
            api,
            channel,
            mut events,
            uploader,
            mic,
            callbacks,
        } = self;

        let state = ClientState::new(api, channel, uploader, mic, callbacks);
        let actor = Actor::spawn(state, "chat-client");

        let forwarder = actor.clone();
        tokio::spawn(
            async move {
                while let Some(signal) = events.recv().await {
                    if forwarder.send(SignalReceived(signal)).is_err() {
                        break;
                    }
                }
            }
            .instrument(trace_span!("channel signals")),
        );

        ChatClient::from_actor(actor)
    }
}
