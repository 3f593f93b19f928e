use tokio::sync::mpsc;
use tracing::Instrument;

use crate::ActorClosedError;
use crate::mailbox::{DynMessage, Envelope, Message};

/// Handle to an actor.
///
/// Handles are cheap to clone and may be shared freely; the actor's
/// pump stops once every handle has been dropped and the queue has
/// drained, or earlier when [`close`](Actor::close) is called. Either
/// way, the state is dropped inside the pump task, so resources owned
/// by the state are released there.
pub struct Actor<S> {
    tx: mpsc::UnboundedSender<Envelope<S>>,
}

impl<S: Send + 'static> Actor<S> {
    /// Spawns a new actor around the given state.
    ///
    /// `label` names the actor in trace output.
    pub fn spawn(state: S, label: &str) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        // The pump must not keep its own actor alive, so it holds the
        // sender weakly and only upgrades for the span of one handler.
        let weak_tx = tx.downgrade();
        tokio::spawn(
            pump(state, rx, weak_tx)
                .instrument(debug_span!("actor", label = label)),
        );
        Self { tx }
    }

    /// Posts a message to the actor's queue.
    #[inline]
    pub fn send<M: Message<S>>(&self, msg: M) -> Result<(), ActorClosedError> {
        self.tx
            .send(Envelope::Deliver(Box::new(msg)))
            .map_err(|_| ActorClosedError)
    }

    /// Asks the actor to stop after the messages already queued ahead
    /// of this call.
    #[inline]
    pub fn close(&self) {
        self.tx.send(Envelope::Close).ok();
    }
}

impl<S> Clone for Actor<S> {
    #[inline]
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

async fn pump<S: Send + 'static>(
    mut state: S,
    mut rx: mpsc::UnboundedReceiver<Envelope<S>>,
    weak_tx: mpsc::WeakUnboundedSender<Envelope<S>>,
) {
    debug!("started");
    while let Some(envelope) = rx.recv().await {
        let msg: Box<dyn DynMessage<S>> = match envelope {
            Envelope::Deliver(msg) => msg,
            Envelope::Close => break,
        };
        trace!("received message: {msg:?}");

        let Some(tx) = weak_tx.upgrade() else {
            // Every external handle is gone, nobody can observe the
            // effects of this message anymore.
            break;
        };
        let actor = Actor { tx };
        trace_span!("handle message").in_scope(|| {
            msg.dispatch(&mut state, &actor);
        });
    }
    debug!("stopped");
}
