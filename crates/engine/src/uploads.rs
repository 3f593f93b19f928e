//! Pre-flight validation and the pipeline into the blob store.
//!
//! One policy value covers both payload classes. Validation is
//! synchronous and happens before any network traffic; the network leg
//! runs to success or failure with no retry.

use std::error::Error as StdError;
use std::fmt::{self, Display};
use std::pin::Pin;
use std::sync::Arc;

use huddle_wire::{
    BlobRef, BlobStore, MediaKind, StoreError, StoreErrorKind, UploadPayload,
};
use mime::Mime;

/// Hard ceiling for any single upload.
pub const MAX_UPLOAD_BYTES: u64 = 5 * 1024 * 1024;

/// Why a payload failed validation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PolicyViolation {
    /// The payload exceeds the byte ceiling.
    TooLarge {
        /// Size of the offending payload.
        actual: u64,
        /// The configured ceiling.
        limit: u64,
    },
    /// The payload's MIME type is not accepted for its category.
    UnsupportedType {
        /// The offending MIME type.
        content_type: String,
    },
}

impl Display for PolicyViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PolicyViolation::TooLarge { actual, limit } => write!(
                f,
                "the file is too large ({actual} bytes, limit {limit})"
            ),
            PolicyViolation::UnsupportedType { content_type } => {
                write!(f, "files of type {content_type} are not accepted")
            }
        }
    }
}

/// What the engine accepts for upload, applied uniformly to both
/// payload classes.
#[derive(Clone)]
pub struct UploadPolicy {
    max_bytes: u64,
    file_types: Vec<Mime>,
}

impl UploadPolicy {
    /// Creates a policy with an explicit ceiling and file-type
    /// allow-list. Voice notes are not checked against the list; any
    /// `audio/*` type passes.
    #[inline]
    pub fn new(max_bytes: u64, file_types: Vec<Mime>) -> Self {
        Self {
            max_bytes,
            file_types,
        }
    }

    /// Validates a payload before any network call.
    pub fn check(
        &self,
        kind: MediaKind,
        content_type: &str,
        byte_len: u64,
    ) -> Result<(), PolicyViolation> {
        let unsupported = || PolicyViolation::UnsupportedType {
            content_type: content_type.to_owned(),
        };
        let mime: Mime = content_type.parse().map_err(|_| unsupported())?;

        let accepted = match kind {
            MediaKind::ChatFile => self
                .file_types
                .iter()
                .any(|allowed| allowed.essence_str() == mime.essence_str()),
            MediaKind::VoiceNote => mime.type_() == mime::AUDIO,
        };
        if !accepted {
            return Err(unsupported());
        }

        if byte_len > self.max_bytes {
            return Err(PolicyViolation::TooLarge {
                actual: byte_len,
                limit: self.max_bytes,
            });
        }
        Ok(())
    }
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self {
            max_bytes: MAX_UPLOAD_BYTES,
            file_types: vec![
                mime::IMAGE_PNG,
                mime::IMAGE_JPEG,
                mime::IMAGE_GIF,
                mime::IMAGE_BMP,
                mime::APPLICATION_PDF,
            ],
        }
    }
}

/// Why an upload never produced a durable reference.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UploadError {
    /// The payload failed validation; nothing was sent.
    Rejected(PolicyViolation),
    /// The store failed or refused the payload.
    Store {
        /// The store's classification of the failure.
        kind: StoreErrorKind,
        /// Human-readable description.
        message: String,
    },
}

impl Display for UploadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UploadError::Rejected(violation) => violation.fmt(f),
            UploadError::Store { message, .. } => message.fmt(f),
        }
    }
}

impl StdError for UploadError {}

type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;
#[rustfmt::skip]
type UploadFn = Arc<
    dyn Fn(MediaKind, UploadPayload)
        -> BoxFuture<Result<BlobRef, UploadError>> + Send + Sync
>;

/// A wrapper around a blob store that carries the validation policy
/// and provides a type-erased interface for the engine.
#[derive(Clone)]
pub struct Uploader {
    policy: UploadPolicy,
    upload_fn: UploadFn,
}

impl Uploader {
    /// Wraps a blob store with the default policy.
    #[inline]
    pub fn new<S: BlobStore>(store: S) -> Self {
        Self::with_policy(store, UploadPolicy::default())
    }

    /// Wraps a blob store with an explicit policy.
    pub fn with_policy<S: BlobStore>(store: S, policy: UploadPolicy) -> Self {
        let upload_fn: UploadFn = Arc::new(move |kind, payload| {
            let fut = store.upload(kind, payload);
            Box::pin(async move {
                fut.await.map_err(|err| UploadError::Store {
                    kind: err.kind(),
                    message: format!("{err}"),
                })
            })
        });
        Self { policy, upload_fn }
    }

    /// Replaces the validation policy.
    #[inline]
    pub fn set_policy(&mut self, policy: UploadPolicy) {
        self.policy = policy;
    }

    /// Validates a payload synchronously, before any network call.
    #[inline]
    pub fn check(
        &self,
        kind: MediaKind,
        content_type: &str,
        byte_len: u64,
    ) -> Result<(), PolicyViolation> {
        self.policy.check(kind, content_type, byte_len)
    }

    /// Starts the network leg of an upload.
    ///
    /// The caller is expected to have run [`check`](Uploader::check)
    /// already; this method does not re-validate.
    #[inline]
    pub fn put(
        &self,
        kind: MediaKind,
        payload: UploadPayload,
    ) -> BoxFuture<Result<BlobRef, UploadError>> {
        (self.upload_fn)(kind, payload)
    }
}
