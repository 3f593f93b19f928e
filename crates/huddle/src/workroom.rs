use bytes::Bytes;
use huddle_engine::{
    Channel, ChatClient, ClientBuilder, Mic, Notice, RecorderUpdate,
    SessionSnapshot, UploadPolicy, Viewport,
};
use huddle_http::{HttpApi, HttpBlobStore, HttpConfigBuilder};
use huddle_socket::{SocketConfigBuilder, SocketProvider};
use huddle_wire::{MessageId, MicSource, WorkItemId};

type SessionCallback = Box<dyn Fn(SessionSnapshot) + Send + Sync>;
type ScrollCallback = Box<dyn Fn() + Send + Sync>;
type RecorderCallback = Box<dyn Fn(RecorderUpdate) + Send + Sync>;
type NoticeCallback = Box<dyn Fn(Notice) + Send + Sync>;

/// [`Workroom`] builder.
///
/// Collects the deployment endpoints and the view callbacks, then
/// connects everything with [`connect`](WorkroomBuilder::connect).
pub struct WorkroomBuilder {
    base_url: String,
    socket_url: String,
    token: Option<String>,
    mic: Option<Mic>,
    policy: Option<UploadPolicy>,
    on_session: Option<SessionCallback>,
    on_scroll_to_bottom: Option<ScrollCallback>,
    on_recorder: Option<RecorderCallback>,
    on_notice: Option<NoticeCallback>,
}

impl WorkroomBuilder {
    /// Creates a builder for a deployment's REST and WebSocket
    /// endpoints.
    pub fn new<S: Into<String>>(base_url: S, socket_url: S) -> Self {
        Self {
            base_url: base_url.into(),
            socket_url: socket_url.into(),
            token: None,
            mic: None,
            policy: None,
            on_session: None,
            on_scroll_to_bottom: None,
            on_recorder: None,
            on_notice: None,
        }
    }

    /// Sets the bearer token presented to both endpoints.
    #[inline]
    pub fn with_token<S: Into<String>>(mut self, token: S) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Attaches an audio input device for voice notes.
    #[inline]
    pub fn with_mic<M: MicSource>(mut self, mic: M) -> Self {
        self.mic = Some(Mic::new(mic));
        self
    }

    /// Overrides the default upload validation policy.
    #[inline]
    pub fn with_upload_policy(mut self, policy: UploadPolicy) -> Self {
        self.policy = Some(policy);
        self
    }

    /// Attaches a callback invoked with a fresh snapshot whenever the
    /// session contents change.
    #[inline]
    pub fn on_session(
        mut self,
        on_session: impl Fn(SessionSnapshot) + Send + Sync + 'static,
    ) -> Self {
        self.on_session = Some(Box::new(on_session));
        self
    }

    /// Attaches a callback invoked when the view should scroll to the
    /// newest message.
    #[inline]
    pub fn on_scroll_to_bottom(
        mut self,
        on_scroll: impl Fn() + Send + Sync + 'static,
    ) -> Self {
        self.on_scroll_to_bottom = Some(Box::new(on_scroll));
        self
    }

    /// Attaches a callback invoked when the recorder changes state.
    #[inline]
    pub fn on_recorder(
        mut self,
        on_recorder: impl Fn(RecorderUpdate) + Send + Sync + 'static,
    ) -> Self {
        self.on_recorder = Some(Box::new(on_recorder));
        self
    }

    /// Attaches a callback invoked with user-facing failure notices.
    #[inline]
    pub fn on_notice(
        mut self,
        on_notice: impl Fn(Notice) + Send + Sync + 'static,
    ) -> Self {
        self.on_notice = Some(Box::new(on_notice));
        self
    }

    /// Opens the event channel and builds the wired client.
    pub async fn connect(self) -> Result<Workroom, huddle_socket::Error> {
        let mut socket = SocketConfigBuilder::with_url(self.socket_url);
        if let Some(token) = &self.token {
            socket = socket.with_token(token.clone());
        }
        let provider = SocketProvider::new(socket.build());
        let (channel, events) = Channel::open(&provider).await?;

        let mut http = HttpConfigBuilder::with_base_url(self.base_url);
        if let Some(token) = &self.token {
            http = http.with_token(token.clone());
        }
        let config = http.build();
        let api = HttpApi::new(config.clone());
        let blobs = HttpBlobStore::new(config);

        let mut builder = ClientBuilder::new(api, blobs, channel, events);
        if let Some(mic) = self.mic {
            builder = builder.with_mic_handle(mic);
        }
        if let Some(policy) = self.policy {
            builder = builder.with_upload_policy(policy);
        }
        if let Some(on_session) = self.on_session {
            builder = builder.on_session(on_session);
        }
        if let Some(on_scroll) = self.on_scroll_to_bottom {
            builder = builder.on_scroll_to_bottom(on_scroll);
        }
        if let Some(on_recorder) = self.on_recorder {
            builder = builder.on_recorder(on_recorder);
        }
        if let Some(on_notice) = self.on_notice {
            builder = builder.on_notice(on_notice);
        }

        Ok(Workroom {
            client: builder.build(),
        })
    }
}

/// A fully wired chat view talking to a real deployment.
///
/// This is a thin delegate around the engine's client; see
/// [`ChatClient`] for the behavior of each operation.
pub struct Workroom {
    client: ChatClient,
}

impl Workroom {
    /// Selects the conversation for a work item.
    #[inline]
    pub fn open_conversation(&self, work_item: WorkItemId) {
        self.client.open_conversation(work_item);
    }

    /// Reports the message list's scroll geometry.
    #[inline]
    pub fn set_viewport(&self, viewport: Viewport) {
        self.client.set_viewport(viewport);
    }

    /// Replaces the draft of the next text message.
    #[inline]
    pub fn set_draft<S: Into<String>>(&self, text: S) {
        self.client.set_draft(text);
    }

    /// Points the next send at a cached message, or clears the pointer.
    #[inline]
    pub fn set_reply_target(&self, target: Option<MessageId>) {
        self.client.set_reply_target(target);
    }

    /// Sends the current draft and reply pointer.
    #[inline]
    pub fn send_draft(&self) {
        self.client.send_draft();
    }

    /// Sets the draft and sends it in one go.
    pub fn send<S: Into<String>>(&self, text: S) {
        self.client.set_draft(text);
        self.client.send_draft();
    }

    /// Validates and sends a file attachment.
    #[inline]
    pub fn send_attachment<S: Into<String>>(
        &self,
        file_name: S,
        content_type: S,
        bytes: Bytes,
    ) {
        self.client.send_attachment(file_name, content_type, bytes);
    }

    /// Deletes a message through the durable path.
    #[inline]
    pub fn delete_message(&self, message: MessageId) {
        self.client.delete_message(message);
    }

    /// Starts a voice take.
    #[inline]
    pub fn begin_recording(&self) {
        self.client.begin_recording();
    }

    /// Discards the current take without any network call.
    #[inline]
    pub fn cancel_recording(&self) {
        self.client.cancel_recording();
    }

    /// Ends the current take and sends it as a voice note.
    #[inline]
    pub fn finish_recording(&self) {
        self.client.finish_recording();
    }

    /// Tears the view down, releasing the device and timers.
    #[inline]
    pub fn close(&self) {
        self.client.close();
    }
}
