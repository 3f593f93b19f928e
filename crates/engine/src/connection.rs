//! The shared event-channel handle.
//!
//! One connection serves a whole view for its lifetime. The handle is
//! cheap to clone and is injected wherever room traffic is needed;
//! nothing in the engine ever opens a second connection on its own.
//! When the pump stops (the peer closed, or the transport failed), the
//! engine is told once and the host decides when to reopen.

use huddle_wire::{
    ChannelProvider, ClientHint, ConversationId, RoomEvent, RoomEvents,
    RoomSender,
};
use tokio::select;
use tokio::sync::mpsc;
use tracing::Instrument;

/// What the channel reports to its consumer.
#[derive(Debug)]
pub enum ChannelSignal {
    /// An event arrived for the joined room.
    Event(RoomEvent),
    /// The connection is gone; no further events will arrive.
    Closed(Option<String>),
}

/// The consumer half of an open channel: the stream of inbound signals.
pub struct ChannelEvents {
    rx: mpsc::UnboundedReceiver<ChannelSignal>,
}

impl ChannelEvents {
    /// Waits for the next signal; `None` once the pump is gone and the
    /// queue has drained.
    #[inline]
    pub async fn recv(&mut self) -> Option<ChannelSignal> {
        self.rx.recv().await
    }
}

enum Command {
    Join(ConversationId),
    Emit(ClientHint),
}

/// Cloneable handle to one live event-channel connection.
///
/// Joining a different room reuses the same connection; emits are
/// best-effort fan-out hints and are never retried or acknowledged.
#[derive(Clone)]
pub struct Channel {
    cmd_tx: mpsc::UnboundedSender<Command>,
}

impl Channel {
    /// Establishes a connection and starts its pump.
    ///
    /// Connection errors are returned to the caller and are not retried
    /// here; detecting a stale channel (for example on window focus)
    /// and calling `open` again is the caller's job.
    pub async fn open<P: ChannelProvider>(
        provider: &P,
    ) -> Result<(Channel, ChannelEvents), P::Error> {
        let (sender, events) = provider.connect().await?;
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (signal_tx, signal_rx) = mpsc::unbounded_channel();
        tokio::spawn(
            drive(sender, events, cmd_rx, signal_tx)
                .instrument(debug_span!("channel")),
        );
        Ok((Channel { cmd_tx }, ChannelEvents { rx: signal_rx }))
    }

    /// Subscribes to a room, leaving any previous one.
    #[inline]
    pub fn join(&self, room: &ConversationId) {
        self.cmd_tx.send(Command::Join(room.clone())).ok();
    }

    /// Emits a fan-out hint. Delivery is best-effort by design; the
    /// durable write already happened over REST.
    #[inline]
    pub fn emit(&self, hint: ClientHint) {
        self.cmd_tx.send(Command::Emit(hint)).ok();
    }
}

async fn drive<S: RoomSender, E: RoomEvents>(
    mut sender: S,
    mut events: E,
    mut cmd_rx: mpsc::UnboundedReceiver<Command>,
    signal_tx: mpsc::UnboundedSender<ChannelSignal>,
) {
    debug!("pump started");
    loop {
        select! {
            cmd = cmd_rx.recv() => match cmd {
                Some(Command::Join(room)) => {
                    trace!("joining room {room}");
                    if let Err(err) = sender.join(&room).await {
                        warn!("join failed: {err}");
                        signal_tx
                            .send(ChannelSignal::Closed(Some(
                                format!("{err}"),
                            )))
                            .ok();
                        break;
                    }
                }
                Some(Command::Emit(hint)) => {
                    if let Err(err) = sender.emit(hint).await {
                        debug!("fan-out hint dropped: {err}");
                    }
                }
                None => break,
            },
            event = events.next_event() => match event {
                Ok(Some(event)) => {
                    if signal_tx.send(ChannelSignal::Event(event)).is_err() {
                        break;
                    }
                }
                Ok(None) => {
                    signal_tx.send(ChannelSignal::Closed(None)).ok();
                    break;
                }
                Err(err) => {
                    signal_tx
                        .send(ChannelSignal::Closed(Some(format!("{err}"))))
                        .ok();
                    break;
                }
            },
            // The consumer is gone; drop the connection with the pump.
            _ = signal_tx.closed() => break,
        }
    }
    debug!("pump stopped");
}
