use std::time::Duration;

use tokio::select;
use tokio::sync::oneshot;
use tokio::time::{self, MissedTickBehavior};

use crate::{Actor, Message};

/// A repeating timer bound to an actor.
///
/// Every period, the ticker posts one message to the actor. The timer
/// task is owned by the `Ticker` value: dropping it stops the timer,
/// which makes cleanup structural: state that owns a `Ticker` cannot
/// leave the timer running behind on any exit path.
pub struct Ticker {
    // Dropping the sender wakes the timer task, which then exits.
    _stop: oneshot::Sender<()>,
}

impl Ticker {
    /// Starts a ticker that posts `make_msg(n)` to `actor` every
    /// `period`, where `n` counts ticks from 1.
    ///
    /// The first message is posted one full period after this call, not
    /// immediately. The timer also stops on its own when the actor goes
    /// away.
    pub fn every<S, M, F>(
        period: Duration,
        actor: &Actor<S>,
        mut make_msg: F,
    ) -> Self
    where
        S: Send + 'static,
        M: Message<S>,
        F: FnMut(u64) -> M + Send + 'static,
    {
        let (stop_tx, mut stop_rx) = oneshot::channel::<()>();
        let actor = actor.clone();
        tokio::spawn(async move {
            let mut interval = time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // An interval yields right away; swallow that tick so the
            // count starts at one full period.
            interval.tick().await;

            let mut ticks: u64 = 0;
            loop {
                select! {
                    biased;

                    _ = &mut stop_rx => break,
                    _ = interval.tick() => {
                        ticks += 1;
                        if actor.send(make_msg(ticks)).is_err() {
                            break;
                        }
                    }
                }
            }
            trace!("ticker stopped after {ticks} ticks");
        });
        Self { _stop: stop_tx }
    }
}
