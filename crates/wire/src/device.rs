use std::error::Error;

use bytes::Bytes;

/// The kind of error raised by the audio input device.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DeviceErrorKind {
    /// The user or platform denied access to the device.
    Denied,
    /// No usable input device is present.
    Unavailable,
    /// Any other errors.
    Other,
}

/// The error type for the audio input device.
pub trait DeviceError: Error + Send + Sync + 'static {
    /// Returns the kind of this error.
    fn kind(&self) -> DeviceErrorKind;
}

/// An audio input device the engine can record from.
///
/// Opening the device requests exclusive access and may suspend until
/// the platform grants or denies it.
pub trait MicSource: Send + Sync + 'static {
    /// The error type that may be returned by the device.
    type Error: DeviceError;

    /// The capture handle produced on a successful open.
    type Capture: Capture;

    /// Requests access to the device and starts capturing.
    fn open(
        &self,
    ) -> impl Future<Output = Result<Self::Capture, Self::Error>> + Send + 'static;
}

/// A live capture session on an audio input device.
///
/// Dropping the capture MUST release the underlying device handle and
/// stop buffering; the engine relies on this on every exit path of a
/// recording, so an implementation that leaks the device on drop is
/// broken.
pub trait Capture: Send + 'static {
    /// Waits for the next buffered chunk of encoded audio.
    ///
    /// Returns `None` once the device stream has ended; a healthy
    /// device never ends its stream while the capture is held.
    fn next_chunk(&mut self) -> impl Future<Output = Option<Bytes>> + Send;
}
