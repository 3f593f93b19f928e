//! Type-erased access to the audio input device.

use std::pin::Pin;
use std::sync::Arc;

use bytes::Bytes;
use huddle_wire::{Capture, DeviceError, MicSource};

type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;
pub(crate) type OpenResult =
    Result<BoxedCapture, Box<dyn DeviceError>>;
pub(crate) type BoxedCapture = Box<dyn CaptureObject>;

/// Object-safe form of [`Capture`].
pub(crate) trait CaptureObject: Send {
    fn next_chunk(
        &mut self,
    ) -> Pin<Box<dyn Future<Output = Option<Bytes>> + Send + '_>>;
}

struct AnyCapture<C: Capture>(C);

impl<C: Capture> CaptureObject for AnyCapture<C> {
    #[inline]
    fn next_chunk(
        &mut self,
    ) -> Pin<Box<dyn Future<Output = Option<Bytes>> + Send + '_>> {
        Box::pin(self.0.next_chunk())
    }
}

/// A wrapper around an audio input device that provides a type-erased
/// interface for the rest of the engine.
#[derive(Clone)]
pub struct Mic {
    open_fn: Arc<dyn Fn() -> BoxFuture<OpenResult> + Send + Sync>,
}

impl Mic {
    /// Wraps an audio input device.
    #[inline]
    pub fn new<M: MicSource>(source: M) -> Self {
        let open_fn = Arc::new(move || {
            let fut = source.open();
            let fut: BoxFuture<OpenResult> = Box::pin(async move {
                match fut.await {
                    Ok(capture) => {
                        Ok(Box::new(AnyCapture(capture)) as BoxedCapture)
                    }
                    Err(err) => Err(Box::new(err) as Box<dyn DeviceError>),
                }
            });
            fut
        });
        Self { open_fn }
    }

    #[inline]
    pub(crate) fn open(&self) -> BoxFuture<OpenResult> {
        (self.open_fn)()
    }
}
