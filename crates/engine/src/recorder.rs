//! The microphone capture state machine.
//!
//! One take at a time: idle, waiting for the device, recording, then
//! back to idle through either a commit or a cancel. The take owns its
//! ticker and the stop handle of the capture drain, so every way out of
//! the recording stage (commit, cancel, device loss, or the whole
//! state being dropped) releases the device and the timer simply by
//! dropping the stage. No exit path may leave the microphone open.

use std::mem;

use bytes::{Bytes, BytesMut};
use huddle_actor::Ticker;
use tokio::sync::oneshot;

/// A clip must be strictly longer than this many seconds to be sent.
const MIN_CLIP_SECS: u32 = 1;

pub(crate) struct Recorder {
    stage: Stage,
    next_attempt: u64,
}

enum Stage {
    Idle,
    /// The platform has been asked for the device and has not answered.
    Requesting { attempt: u64 },
    Recording { attempt: u64, take: Take },
}

struct Take {
    chunks: Vec<Bytes>,
    elapsed_secs: u32,
    _ticker: Ticker,
    // Dropping this stops the drain task, which drops the capture and
    // with it the device handle.
    _capture_stop: oneshot::Sender<()>,
}

/// The outcome of a stop/submit request.
pub(crate) enum Finish {
    /// Nothing was being recorded.
    Inactive,
    /// The take was too short or empty; treated as a cancel.
    TooShort,
    /// A clip worth sending.
    Clip {
        bytes: Bytes,
        duration_secs: u32,
    },
}

impl Recorder {
    pub(crate) fn new() -> Self {
        Self {
            stage: Stage::Idle,
            next_attempt: 1,
        }
    }

    /// Starts a new take. Returns its attempt number, or `None` when a
    /// take is already active; at most one exists at a time.
    pub(crate) fn begin(&mut self) -> Option<u64> {
        if !matches!(self.stage, Stage::Idle) {
            return None;
        }
        let attempt = self.next_attempt;
        self.next_attempt += 1;
        self.stage = Stage::Requesting { attempt };
        Some(attempt)
    }

    /// Whether the given attempt is still waiting for its device.
    pub(crate) fn is_awaiting_device(&self, attempt: u64) -> bool {
        matches!(self.stage, Stage::Requesting { attempt: a } if a == attempt)
    }

    /// Whether the given attempt is actively recording.
    pub(crate) fn is_recording(&self, attempt: u64) -> bool {
        matches!(self.stage, Stage::Recording { attempt: a, .. } if a == attempt)
    }

    /// Moves a pending attempt into the recording stage, wiring in the
    /// resources that must die with it.
    pub(crate) fn device_ready(
        &mut self,
        attempt: u64,
        ticker: Ticker,
        capture_stop: oneshot::Sender<()>,
    ) {
        debug_assert!(self.is_awaiting_device(attempt));
        self.stage = Stage::Recording {
            attempt,
            take: Take {
                chunks: Vec::new(),
                elapsed_secs: 0,
                _ticker: ticker,
                _capture_stop: capture_stop,
            },
        };
    }

    /// Clears a pending attempt after the platform refused the device.
    /// Returns false when the attempt is no longer current.
    pub(crate) fn device_failed(&mut self, attempt: u64) -> bool {
        if !self.is_awaiting_device(attempt) {
            return false;
        }
        self.stage = Stage::Idle;
        true
    }

    /// Buffers one captured chunk.
    pub(crate) fn push_chunk(&mut self, attempt: u64, chunk: Bytes) {
        if let Stage::Recording { attempt: a, take } = &mut self.stage {
            if *a == attempt {
                take.chunks.push(chunk);
            }
        }
    }

    /// Advances the elapsed counter by one second and returns the new
    /// value, or `None` for a tick from a finished take.
    pub(crate) fn tick(&mut self, attempt: u64) -> Option<u32> {
        if let Stage::Recording { attempt: a, take } = &mut self.stage {
            if *a == attempt {
                take.elapsed_secs += 1;
                return Some(take.elapsed_secs);
            }
        }
        None
    }

    /// Discards the current take, if any. The buffered chunks are
    /// dropped and no network traffic ever happens.
    pub(crate) fn cancel(&mut self) -> bool {
        match mem::replace(&mut self.stage, Stage::Idle) {
            Stage::Idle => false,
            Stage::Requesting { .. } | Stage::Recording { .. } => true,
        }
    }

    /// Ends the current take for submission.
    ///
    /// A take of one second or less, or one that never produced a
    /// chunk, is an implicit cancel; near-empty clips are not worth a
    /// round-trip.
    pub(crate) fn finish(&mut self) -> Finish {
        match mem::replace(&mut self.stage, Stage::Idle) {
            Stage::Idle => Finish::Inactive,
            // Stopping before the device answered is just a cancel.
            Stage::Requesting { .. } => Finish::Inactive,
            Stage::Recording { take, .. } => {
                if take.elapsed_secs <= MIN_CLIP_SECS
                    || take.chunks.is_empty()
                {
                    return Finish::TooShort;
                }
                let duration_secs = take.elapsed_secs;
                Finish::Clip {
                    bytes: assemble(&take.chunks),
                    duration_secs,
                }
            }
        }
    }
}

fn assemble(chunks: &[Bytes]) -> Bytes {
    let total = chunks.iter().map(Bytes::len).sum();
    let mut buf = BytesMut::with_capacity(total);
    for chunk in chunks {
        buf.extend_from_slice(chunk);
    }
    buf.freeze()
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use huddle_actor::{Actor, Message};

    use super::*;

    #[derive(Debug)]
    struct Noop;

    impl Message<()> for Noop {
        fn handle(self, _state: &mut (), _actor: &Actor<()>) {}
    }

    // A ticker that will never fire within a test, plus a stop handle,
    // standing in for the real take resources.
    fn gear() -> (Ticker, oneshot::Sender<()>) {
        let actor = Actor::spawn((), "noop");
        let ticker =
            Ticker::every(Duration::from_secs(3600), &actor, |_| Noop);
        let (stop_tx, _stop_rx) = oneshot::channel();
        (ticker, stop_tx)
    }

    fn recording_recorder() -> (Recorder, u64) {
        let mut recorder = Recorder::new();
        let attempt = recorder.begin().unwrap();
        let (ticker, stop) = gear();
        recorder.device_ready(attempt, ticker, stop);
        (recorder, attempt)
    }

    #[tokio::test]
    async fn test_only_one_take_at_a_time() {
        let mut recorder = Recorder::new();
        assert!(recorder.begin().is_some());
        assert!(recorder.begin().is_none());
        recorder.cancel();
        assert!(recorder.begin().is_some());
    }

    #[tokio::test]
    async fn test_one_second_take_is_too_short() {
        let (mut recorder, attempt) = recording_recorder();
        recorder.push_chunk(attempt, Bytes::from_static(b"audio"));
        assert_eq!(recorder.tick(attempt), Some(1));
        assert!(matches!(recorder.finish(), Finish::TooShort));
    }

    #[tokio::test]
    async fn test_take_without_chunks_is_too_short() {
        let (mut recorder, attempt) = recording_recorder();
        recorder.tick(attempt);
        recorder.tick(attempt);
        recorder.tick(attempt);
        assert!(matches!(recorder.finish(), Finish::TooShort));
    }

    #[tokio::test]
    async fn test_two_second_take_produces_a_clip() {
        let (mut recorder, attempt) = recording_recorder();
        recorder.push_chunk(attempt, Bytes::from_static(b"left"));
        recorder.push_chunk(attempt, Bytes::from_static(b"right"));
        recorder.tick(attempt);
        recorder.tick(attempt);
        match recorder.finish() {
            Finish::Clip {
                bytes,
                duration_secs,
            } => {
                assert_eq!(&bytes[..], b"leftright");
                assert_eq!(duration_secs, 2);
            }
            _ => panic!("expected a clip"),
        }
        // The recorder is idle again afterwards.
        assert!(recorder.begin().is_some());
    }

    #[tokio::test]
    async fn test_finish_before_device_grant_is_a_cancel() {
        let mut recorder = Recorder::new();
        let attempt = recorder.begin().unwrap();
        assert!(matches!(recorder.finish(), Finish::Inactive));
        // The late grant must be rejected as stale.
        assert!(!recorder.is_awaiting_device(attempt));
    }

    #[tokio::test]
    async fn test_stale_chunks_and_ticks_are_ignored() {
        let (mut recorder, attempt) = recording_recorder();
        recorder.cancel();
        recorder.push_chunk(attempt, Bytes::from_static(b"late"));
        assert_eq!(recorder.tick(attempt), None);
        assert!(matches!(recorder.finish(), Finish::Inactive));
    }
}
