//! The REST boundary of the chat service, plus blob uploads.
//!
//! Everything durable goes through here: conversations are fetched and
//! mutated with plain JSON calls, and binary payloads are pushed to the
//! storage endpoints as multipart forms. Failures are terminal; the
//! caller decides whether anything is re-initiated.

#[macro_use]
extern crate tracing;

mod api;
mod blobs;
mod config;

use std::error::Error as StdError;
use std::fmt::{self, Display};

use huddle_wire::{ApiError, ApiErrorKind};

pub use api::HttpApi;
pub use blobs::{BlobError, HttpBlobStore};
pub use config::{HttpConfig, HttpConfigBuilder};

/// Error type for [`HttpApi`].
#[derive(Debug)]
pub struct Error {
    message: String,
    kind: ApiErrorKind,
}

impl Error {
    fn new(message: impl Into<String>, kind: ApiErrorKind) -> Self {
        Self {
            message: message.into(),
            kind,
        }
    }

    fn from_reqwest(err: reqwest::Error) -> Self {
        let kind = if let Some(status) = err.status() {
            match status.as_u16() {
                401 | 403 => ApiErrorKind::Unauthorized,
                404 => ApiErrorKind::NotFound,
                _ => ApiErrorKind::Other,
            }
        } else if err.is_connect() || err.is_timeout() {
            ApiErrorKind::Network
        } else {
            ApiErrorKind::Other
        };
        Self::new(format!("{err}"), kind)
    }

    /// Returns the error message.
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl StdError for Error {}

impl ApiError for Error {
    #[inline]
    fn kind(&self) -> ApiErrorKind {
        self.kind
    }
}
