use std::error::Error as StdError;
use std::fmt::{self, Display};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use huddle_wire::{
    BlobRef, BlobStore, MediaKind, StoreError, StoreErrorKind, UploadPayload,
};
use tokio::time::sleep;

/// Error type for [`MemoryBlobStore`].
#[derive(Debug)]
pub struct Error {
    message: &'static str,
    kind: StoreErrorKind,
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.message.fmt(f)
    }
}

impl StdError for Error {}

impl StoreError for Error {
    #[inline]
    fn kind(&self) -> StoreErrorKind {
        self.kind
    }
}

#[derive(Default)]
struct Inner {
    uploads: Mutex<Vec<(MediaKind, String, usize)>>,
    fail_next: AtomicBool,
    counter: AtomicU32,
    delay: Mutex<Duration>,
}

/// A blob store that remembers what was uploaded and can be primed to
/// fail or to take a while.
#[derive(Clone, Default)]
pub struct MemoryBlobStore {
    inner: Arc<Inner>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next upload fail.
    pub fn fail_next(&self) {
        self.inner.fail_next.store(true, Ordering::Relaxed);
    }

    /// Makes every upload take `delay` before completing.
    pub fn set_delay(&self, delay: Duration) {
        *self.inner.delay.lock().unwrap() = delay;
    }

    /// How many uploads completed successfully.
    pub fn upload_count(&self) -> usize {
        self.inner.uploads.lock().unwrap().len()
    }

    /// The `(kind, file name, byte length)` of every completed upload.
    pub fn uploads(&self) -> Vec<(MediaKind, String, usize)> {
        self.inner.uploads.lock().unwrap().clone()
    }
}

impl BlobStore for MemoryBlobStore {
    type Error = Error;

    fn upload(
        &self,
        kind: MediaKind,
        payload: UploadPayload,
    ) -> impl Future<Output = Result<BlobRef, Self::Error>> + Send + 'static
    {
        let inner = Arc::clone(&self.inner);
        async move {
            let delay = *inner.delay.lock().unwrap();
            if !delay.is_zero() {
                sleep(delay).await;
            }
            if inner.fail_next.swap(false, Ordering::Relaxed) {
                return Err(Error {
                    message: "upload failed by script",
                    kind: StoreErrorKind::Network,
                });
            }
            let n = inner.counter.fetch_add(1, Ordering::Relaxed) + 1;
            inner.uploads.lock().unwrap().push((
                kind,
                payload.file_name.clone(),
                payload.bytes.len(),
            ));
            Ok(BlobRef {
                url: format!("https://blobs.test/{}/{n}", kind.folder()),
                public_id: format!("blob-{n}"),
            })
        }
    }
}
