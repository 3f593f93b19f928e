use std::error::Error as StdError;
use std::fmt::{self, Display};
use std::future::ready;
use std::pin::pin;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use huddle_wire::{
    ChannelError, ChannelErrorKind, ChannelProvider, ClientHint,
    ConversationId, RoomEvent, RoomEvents, RoomSender,
};
use tokio::sync::{Notify, mpsc};

/// Error type for [`ScriptedChannel`].
#[derive(Debug)]
pub struct Error {
    message: &'static str,
    kind: ChannelErrorKind,
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.message.fmt(f)
    }
}

impl StdError for Error {}

impl ChannelError for Error {
    #[inline]
    fn kind(&self) -> ChannelErrorKind {
        self.kind
    }
}

#[derive(Default)]
struct Inner {
    refuse_connect: AtomicBool,
    connect_count: AtomicU32,
    joins: Mutex<Vec<ConversationId>>,
    emits: Mutex<Vec<ClientHint>>,
    event_tx: Mutex<Option<mpsc::UnboundedSender<RoomEvent>>>,
    changed: Notify,
}

/// A scripted event channel.
///
/// Tests hold the `ScriptedChannel` and push room events through it at
/// will; the engine sees them exactly as it would see server fan-out.
/// Joins and emitted hints are recorded for assertions.
#[derive(Clone, Default)]
pub struct ScriptedChannel {
    inner: Arc<Inner>,
}

impl ScriptedChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent `connect` fail.
    pub fn refuse_connections(&self) {
        self.inner.refuse_connect.store(true, Ordering::Relaxed);
    }

    /// Delivers one room event to the connected client.
    ///
    /// # Panics
    ///
    /// Panics when no client is connected.
    pub fn push(&self, event: RoomEvent) {
        let tx = self.inner.event_tx.lock().unwrap();
        tx.as_ref()
            .expect("no client is connected")
            .send(event)
            .expect("the client stopped listening");
    }

    /// Closes the inbound stream, as if the server went away.
    pub fn close(&self) {
        self.inner.event_tx.lock().unwrap().take();
    }

    /// How many times a connection was established.
    pub fn connect_count(&self) -> u32 {
        self.inner.connect_count.load(Ordering::Relaxed)
    }

    /// The rooms joined so far, in order.
    pub fn joined_rooms(&self) -> Vec<ConversationId> {
        self.inner.joins.lock().unwrap().clone()
    }

    /// The fan-out hints emitted so far, in order.
    pub fn emitted(&self) -> Vec<ClientHint> {
        self.inner.emits.lock().unwrap().clone()
    }

    /// Waits until the client has joined the given room.
    pub async fn wait_for_join(&self, room: &ConversationId) {
        self.wait_until(|| {
            self.inner.joins.lock().unwrap().iter().any(|r| r == room)
        })
        .await;
    }

    /// Waits until at least `count` hints have been emitted, then
    /// returns all of them.
    pub async fn wait_for_emits(&self, count: usize) -> Vec<ClientHint> {
        self.wait_until(|| {
            self.inner.emits.lock().unwrap().len() >= count
        })
        .await;
        self.emitted()
    }

    async fn wait_until(&self, check: impl Fn() -> bool) {
        loop {
            let mut notified = pin!(self.inner.changed.notified());
            // Register for the next notification before checking, so a
            // mutation between the check and the await is not lost.
            notified.as_mut().enable();
            if check() {
                return;
            }
            notified.await;
        }
    }
}

impl ChannelProvider for ScriptedChannel {
    type Error = Error;
    type Sender = ScriptedSender;
    type Events = ScriptedEvents;

    fn connect(
        &self,
    ) -> impl Future<Output = Result<(Self::Sender, Self::Events), Self::Error>>
    + Send
    + 'static {
        let inner = Arc::clone(&self.inner);
        let result = if inner.refuse_connect.load(Ordering::Relaxed) {
            Err(Error {
                message: "connection refused by script",
                kind: ChannelErrorKind::Connect,
            })
        } else {
            inner.connect_count.fetch_add(1, Ordering::Relaxed);
            let (tx, rx) = mpsc::unbounded_channel();
            *inner.event_tx.lock().unwrap() = Some(tx);
            Ok((
                ScriptedSender {
                    inner: Arc::clone(&inner),
                },
                ScriptedEvents { rx },
            ))
        };
        ready(result)
    }
}

/// The outbound half handed to the engine.
pub struct ScriptedSender {
    inner: Arc<Inner>,
}

impl RoomSender for ScriptedSender {
    type Error = Error;

    async fn join(&mut self, room: &ConversationId) -> Result<(), Error> {
        self.inner.joins.lock().unwrap().push(room.clone());
        self.inner.changed.notify_waiters();
        Ok(())
    }

    async fn emit(&mut self, hint: ClientHint) -> Result<(), Error> {
        self.inner.emits.lock().unwrap().push(hint);
        self.inner.changed.notify_waiters();
        Ok(())
    }
}

/// The inbound half handed to the engine.
pub struct ScriptedEvents {
    rx: mpsc::UnboundedReceiver<RoomEvent>,
}

impl RoomEvents for ScriptedEvents {
    type Error = Error;

    async fn next_event(&mut self) -> Result<Option<RoomEvent>, Error> {
        Ok(self.rx.recv().await)
    }
}
