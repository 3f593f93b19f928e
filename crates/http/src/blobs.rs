use std::error::Error as StdError;
use std::fmt::{self, Display};
use std::sync::Arc;

use huddle_wire::{
    BlobRef, BlobStore, MediaKind, StoreError, StoreErrorKind, UploadPayload,
};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use serde::Deserialize;

use crate::HttpConfig;

/// Error type for [`HttpBlobStore`].
#[derive(Debug)]
pub struct BlobError {
    message: String,
    kind: StoreErrorKind,
}

impl BlobError {
    fn new(message: impl Into<String>, kind: StoreErrorKind) -> Self {
        Self {
            message: message.into(),
            kind,
        }
    }

    fn from_reqwest(err: reqwest::Error) -> Self {
        let kind = if let Some(status) = err.status() {
            match status.as_u16() {
                400 | 413 | 415 | 422 => StoreErrorKind::Rejected,
                _ => StoreErrorKind::Other,
            }
        } else if err.is_connect() || err.is_timeout() {
            StoreErrorKind::Network
        } else {
            StoreErrorKind::Other
        };
        Self::new(format!("{err}"), kind)
    }

    /// Returns the error message.
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for BlobError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl StdError for BlobError {}

impl StoreError for BlobError {
    #[inline]
    fn kind(&self) -> StoreErrorKind {
        self.kind
    }
}

/// The receipt the storage endpoint returns for a persisted payload.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UploadReceipt {
    url: String,
    public_id: String,
}

/// Blob storage client over HTTP multipart uploads.
#[derive(Clone, Debug)]
pub struct HttpBlobStore {
    client: Client,
    config: Arc<HttpConfig>,
}

impl HttpBlobStore {
    /// Creates a new `HttpBlobStore` with the given configuration.
    #[inline]
    pub fn new(config: HttpConfig) -> Self {
        Self {
            client: Client::new(),
            config: Arc::new(config),
        }
    }
}

impl BlobStore for HttpBlobStore {
    type Error = BlobError;

    fn upload(
        &self,
        kind: MediaKind,
        payload: UploadPayload,
    ) -> impl Future<Output = Result<BlobRef, Self::Error>> + Send + 'static
    {
        let url =
            format!("{}/uploads/{}", self.config.base_url, kind.folder());
        let client = self.client.clone();
        let token = self.config.token.clone();
        async move {
            let part = Part::bytes(payload.bytes.to_vec())
                .file_name(payload.file_name)
                .mime_str(&payload.content_type)
                .map_err(|err| {
                    BlobError::new(
                        format!("{err}"),
                        StoreErrorKind::Rejected,
                    )
                })?;
            let form = Form::new().part("file", part);

            let mut req = client.post(url).multipart(form);
            if let Some(token) = token {
                req = req.bearer_auth(token);
            }
            let resp = req
                .send()
                .await
                .and_then(Response::error_for_status)
                .map_err(BlobError::from_reqwest)?;

            let receipt: UploadReceipt = resp.json().await.map_err(|err| {
                BlobError::new(
                    format!("malformed upload receipt: {err}"),
                    StoreErrorKind::Other,
                )
            })?;
            debug!("stored blob as {}", receipt.public_id);
            Ok(BlobRef {
                url: receipt.url,
                public_id: receipt.public_id,
            })
        }
    }
}
