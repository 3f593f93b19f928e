use std::fmt::Debug;

use crate::Actor;

/// A message an actor with state `S` can handle.
pub trait Message<S>: Send + Debug + 'static {
    /// Handles the message with exclusive access to the actor's state.
    ///
    /// `actor` is the handle of the actor itself, for handlers that
    /// need to post follow-up messages (for example from a spawned
    /// task).
    fn handle(self, state: &mut S, actor: &Actor<S>);
}

/// Object-safe dispatch for boxed messages.
pub(crate) trait DynMessage<S>: Send + Debug {
    fn dispatch(self: Box<Self>, state: &mut S, actor: &Actor<S>);
}

impl<S, M: Message<S>> DynMessage<S> for M {
    #[inline]
    fn dispatch(self: Box<Self>, state: &mut S, actor: &Actor<S>) {
        (*self).handle(state, actor)
    }
}

/// What travels through an actor's queue.
pub(crate) enum Envelope<S> {
    Deliver(Box<dyn DynMessage<S>>),
    Close,
}
