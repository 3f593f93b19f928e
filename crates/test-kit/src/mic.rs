use std::collections::VecDeque;
use std::error::Error as StdError;
use std::fmt::{self, Display};
use std::future::{pending, ready};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use huddle_wire::{Capture, DeviceError, DeviceErrorKind, MicSource};

/// Error type for [`ScriptedMic`].
#[derive(Debug)]
pub struct Error {
    message: &'static str,
    kind: DeviceErrorKind,
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.message.fmt(f)
    }
}

impl StdError for Error {}

impl DeviceError for Error {
    #[inline]
    fn kind(&self) -> DeviceErrorKind {
        self.kind
    }
}

#[derive(Default)]
struct Inner {
    chunks: Mutex<Vec<Bytes>>,
    deny: AtomicBool,
    open_count: AtomicU32,
    // Flipped by the drop of the most recent capture.
    released: Arc<AtomicBool>,
}

/// A microphone that plays back a prepared chunk script.
///
/// Every `open` hands out the same script; once it is exhausted the
/// capture stays open and silent, like a real device would. The fake
/// records whether the engine dropped the capture, which is how the
/// device gets released.
#[derive(Clone, Default)]
pub struct ScriptedMic {
    inner: Arc<Inner>,
}

impl ScriptedMic {
    /// A microphone that produces the given chunks.
    pub fn with_chunks<I>(chunks: I) -> Self
    where
        I: IntoIterator<Item = Bytes>,
    {
        let mic = Self::default();
        *mic.inner.chunks.lock().unwrap() = chunks.into_iter().collect();
        mic
    }

    /// Makes every subsequent `open` fail like a denied permission
    /// prompt.
    pub fn deny_access(&self) {
        self.inner.deny.store(true, Ordering::Relaxed);
    }

    /// How many times the device was opened.
    pub fn open_count(&self) -> u32 {
        self.inner.open_count.load(Ordering::Relaxed)
    }

    /// Whether the most recent capture has been dropped again.
    pub fn device_released(&self) -> bool {
        self.inner.released.load(Ordering::Relaxed)
    }
}

impl MicSource for ScriptedMic {
    type Error = Error;
    type Capture = ScriptedCapture;

    fn open(
        &self,
    ) -> impl Future<Output = Result<Self::Capture, Self::Error>> + Send + 'static
    {
        if self.inner.deny.load(Ordering::Relaxed) {
            return ready(Err(Error {
                message: "microphone access denied by script",
                kind: DeviceErrorKind::Denied,
            }));
        }
        self.inner.open_count.fetch_add(1, Ordering::Relaxed);
        self.inner.released.store(false, Ordering::Relaxed);
        ready(Ok(ScriptedCapture {
            chunks: self.inner.chunks.lock().unwrap().clone().into(),
            released: Arc::clone(&self.inner.released),
        }))
    }
}

/// A live capture handed out by [`ScriptedMic`].
pub struct ScriptedCapture {
    chunks: VecDeque<Bytes>,
    released: Arc<AtomicBool>,
}

impl Capture for ScriptedCapture {
    async fn next_chunk(&mut self) -> Option<Bytes> {
        if let Some(chunk) = self.chunks.pop_front() {
            return Some(chunk);
        }
        // The script is exhausted; a real device keeps the stream open
        // and silent until the capture is dropped.
        pending().await
    }
}

impl Drop for ScriptedCapture {
    fn drop(&mut self) {
        self.released.store(true, Ordering::Relaxed);
    }
}
