use std::error::Error;

use crate::event::{ClientHint, RoomEvent};
use crate::ids::ConversationId;

/// The kind of error raised by an event channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChannelErrorKind {
    /// The channel endpoint could not be reached or refused us.
    Connect,
    /// The established connection failed mid-stream.
    Transport,
    /// The peer sent something we could not make sense of.
    Protocol,
}

/// The error type for an event channel.
pub trait ChannelError: Error + Send + Sync + 'static {
    /// Returns the kind of this error.
    fn kind(&self) -> ChannelErrorKind;
}

/// A factory for event-channel connections.
///
/// One connection is expected to serve the whole life of a view;
/// switching conversations re-joins a room on the same connection
/// instead of reconnecting. Providers do not retry on their own; when
/// a connection goes stale, the caller decides when to call
/// [`connect`](ChannelProvider::connect) again.
pub trait ChannelProvider: Send + Sync {
    /// The error type that may be returned by the provider.
    type Error: ChannelError;

    /// The outbound half of an established connection.
    type Sender: RoomSender<Error = Self::Error>;

    /// The inbound half of an established connection.
    type Events: RoomEvents<Error = Self::Error>;

    /// Establishes a connection and returns its two halves.
    fn connect(
        &self,
    ) -> impl Future<Output = Result<(Self::Sender, Self::Events), Self::Error>>
    + Send
    + 'static;
}

/// The outbound half of an event-channel connection.
pub trait RoomSender: Send + 'static {
    /// The error type that may be returned by the sender.
    type Error: ChannelError;

    /// Subscribes to one room's events, leaving any previous room.
    fn join(
        &mut self,
        room: &ConversationId,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Emits a best-effort fan-out hint to the joined room.
    fn emit(
        &mut self,
        hint: ClientHint,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;
}

/// The inbound half of an event-channel connection.
pub trait RoomEvents: Send + 'static {
    /// The error type that may be returned by the event stream.
    type Error: ChannelError;

    /// Waits for the next room event.
    ///
    /// Returns `Ok(None)` once the connection has closed gracefully;
    /// calling the method again after that point is allowed and keeps
    /// returning `Ok(None)`.
    fn next_event(
        &mut self,
    ) -> impl Future<Output = Result<Option<RoomEvent>, Self::Error>> + Send;
}
