use std::error::Error;

use bytes::Bytes;

/// The kind of error raised by the blob store.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StoreErrorKind {
    /// The store refused the payload (type, size, or content).
    Rejected,
    /// The payload never made it to the store, or the receipt never
    /// made it back.
    Network,
    /// Any other errors.
    Other,
}

/// The error type for the blob store.
pub trait StoreError: Error + Send + Sync + 'static {
    /// Returns the kind of this error.
    fn kind(&self) -> StoreErrorKind;
}

/// The logical category a payload is stored under.
///
/// Each category maps to a distinct upload endpoint, but both share one
/// state contract: pending, then success or failure, with no automatic
/// retry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MediaKind {
    /// A file shared in a conversation.
    ChatFile,
    /// A recorded voice clip.
    VoiceNote,
}

impl MediaKind {
    /// Returns the folder name this category is stored under.
    #[inline]
    pub fn folder(self) -> &'static str {
        match self {
            MediaKind::ChatFile => "chat-files",
            MediaKind::VoiceNote => "voice-notes",
        }
    }
}

/// A binary payload handed to the blob store.
#[derive(Clone, Debug)]
pub struct UploadPayload {
    /// The raw payload.
    pub bytes: Bytes,
    /// File name to store the payload under.
    pub file_name: String,
    /// MIME type of the payload.
    pub content_type: String,
}

/// The durable reference returned once a payload is persisted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlobRef {
    /// Stable URL of the stored payload.
    pub url: String,
    /// Store-internal identifier of the payload.
    pub public_id: String,
}

/// External storage for binary payloads.
///
/// An upload runs to completion or failure once initiated; there is no
/// abort path and no automatic retry. Callers that still hold the
/// source payload may re-initiate themselves.
pub trait BlobStore: Send + Sync + 'static {
    /// The error type that may be returned by the store.
    type Error: StoreError;

    /// Persists a payload and returns its durable reference.
    fn upload(
        &self,
        kind: MediaKind,
        payload: UploadPayload,
    ) -> impl Future<Output = Result<BlobRef, Self::Error>> + Send + 'static;
}
