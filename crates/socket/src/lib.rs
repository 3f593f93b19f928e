//! The event channel over a WebSocket connection.
//!
//! One connection carries all room traffic for the life of a view:
//! joining a different room is just another frame on the same socket.
//! Frames are JSON objects tagged with a `type` field, mirroring the
//! chat service's fan-out protocol.

#[macro_use]
extern crate tracing;

mod config;
mod conn;
mod frames;

use std::error::Error as StdError;
use std::fmt::{self, Display};
use std::sync::Arc;

use huddle_wire::{ChannelError, ChannelErrorKind, ChannelProvider};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::header;

pub use config::{SocketConfig, SocketConfigBuilder};
pub use conn::{SocketEvents, SocketSender};

/// Error type for [`SocketProvider`].
#[derive(Debug)]
pub struct Error {
    message: String,
    kind: ChannelErrorKind,
}

impl Error {
    fn new(message: impl Into<String>, kind: ChannelErrorKind) -> Self {
        Self {
            message: message.into(),
            kind,
        }
    }

    /// Returns the error message.
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl StdError for Error {}

impl ChannelError for Error {
    #[inline]
    fn kind(&self) -> ChannelErrorKind {
        self.kind
    }
}

/// WebSocket-backed event channel provider.
#[derive(Clone, Debug)]
pub struct SocketProvider {
    config: Arc<SocketConfig>,
}

impl SocketProvider {
    /// Creates a new `SocketProvider` with the given configuration.
    #[inline]
    pub fn new(config: SocketConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }
}

impl ChannelProvider for SocketProvider {
    type Error = Error;
    type Sender = SocketSender;
    type Events = SocketEvents;

    fn connect(
        &self,
    ) -> impl Future<Output = Result<(Self::Sender, Self::Events), Self::Error>>
    + Send
    + 'static {
        let config = Arc::clone(&self.config);
        async move {
            let mut request = config
                .url()
                .into_client_request()
                .map_err(|err| {
                    Error::new(format!("{err}"), ChannelErrorKind::Connect)
                })?;
            if let Some(token) = config.token() {
                let value = format!("Bearer {token}").parse().map_err(
                    |err| {
                        Error::new(
                            format!("{err}"),
                            ChannelErrorKind::Connect,
                        )
                    },
                )?;
                request.headers_mut().insert(header::AUTHORIZATION, value);
            }

            let (socket, _) =
                connect_async(request).await.map_err(|err| {
                    Error::new(format!("{err}"), ChannelErrorKind::Connect)
                })?;
            debug!("connected to {}", config.url());

            Ok(conn::split(socket))
        }
    }
}
