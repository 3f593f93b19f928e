//! Single-threaded event processing for the chat engine.
//!
//! Engine state lives inside one task and is only ever touched by that
//! task; user commands, channel events, and timer ticks all arrive as
//! messages and are handled one at a time, in arrival order. This is
//! the whole concurrency model: there are no locks, and a handler can
//! rely on seeing a consistent state from start to finish.

#![deny(missing_docs)]

#[macro_use]
extern crate tracing;

mod error;
mod handle;
mod mailbox;
mod ticker;

pub use error::ActorClosedError;
pub use handle::Actor;
pub use mailbox::Message;
pub use ticker::Ticker;

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::sync::oneshot;
    use tokio::time::timeout;

    use super::*;

    #[derive(Default)]
    struct Counter {
        value: u32,
    }

    #[derive(Debug)]
    struct Add(u32);

    impl Message<Counter> for Add {
        fn handle(self, state: &mut Counter, _actor: &Actor<Counter>) {
            state.value += self.0;
        }
    }

    #[derive(Debug)]
    struct Report(oneshot::Sender<u32>);

    impl Message<Counter> for Report {
        fn handle(self, state: &mut Counter, _actor: &Actor<Counter>) {
            self.0.send(state.value).unwrap();
        }
    }

    #[tokio::test]
    async fn test_messages_run_in_order() {
        let actor = Actor::spawn(Counter::default(), "counter");
        actor.send(Add(40)).unwrap();
        actor.send(Add(2)).unwrap();

        let (tx, rx) = oneshot::channel();
        actor.send(Report(tx)).unwrap();
        assert_eq!(rx.await.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_send_after_close_fails() {
        let actor = Actor::spawn(Counter::default(), "counter");
        actor.close();

        // The pump drains in the background, so give it a moment.
        let deadline = tokio::time::Instant::now() + Duration::from_secs(1);
        loop {
            if actor.send(Add(1)).is_err() {
                break;
            }
            assert!(tokio::time::Instant::now() < deadline);
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticker_delivers_and_stops() {
        let actor = Actor::spawn(Counter::default(), "counter");
        let ticker =
            Ticker::every(Duration::from_secs(1), &actor, |_| Add(1));

        tokio::time::sleep(Duration::from_millis(3500)).await;
        let (tx, rx) = oneshot::channel();
        actor.send(Report(tx)).unwrap();
        let ticked = timeout(Duration::from_secs(1), rx)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(ticked, 3);

        // No more ticks once the ticker is dropped.
        drop(ticker);
        tokio::time::sleep(Duration::from_secs(5)).await;
        let (tx, rx) = oneshot::channel();
        actor.send(Report(tx)).unwrap();
        assert_eq!(rx.await.unwrap(), ticked);
    }
}
