//! The user-facing failure surface.
//!
//! Every failure in the engine is terminal where it happens; what the
//! user sees is one of these notices. The engine never retries on its
//! own; a notice tells the user what stopped and what they can do
//! about it.

use std::fmt::{self, Display};

use crate::uploads::PolicyViolation;

/// A user-facing report of something that went wrong.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Notice {
    /// Microphone access was denied, or no device is present.
    MicrophoneUnavailable {
        /// Platform description of the refusal.
        reason: String,
    },
    /// The capture stream died while recording; the take is lost.
    RecordingFailed {
        /// Description of the failure.
        reason: String,
    },
    /// The clip was too short to send.
    RecordingTooShort,
    /// A payload failed validation; nothing was uploaded.
    UploadRejected(PolicyViolation),
    /// The storage endpoint failed or refused the payload.
    UploadFailed {
        /// Description of the failure.
        reason: String,
    },
    /// The create call failed; the draft is preserved for retry.
    SendFailed {
        /// Description of the failure.
        reason: String,
    },
    /// The delete call failed; the message is still there.
    DeleteFailed {
        /// Description of the failure.
        reason: String,
    },
    /// The conversation could not be loaded.
    LoadFailed {
        /// Description of the failure.
        reason: String,
    },
    /// There is nothing to send.
    EmptyMessage,
    /// No conversation is selected.
    NoConversation,
    /// Live updates stopped; messages may be stale until the view is
    /// re-entered.
    ChannelDown {
        /// Description of the failure, when one is known.
        reason: Option<String>,
    },
}

impl Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::MicrophoneUnavailable { reason } => {
                write!(f, "microphone unavailable: {reason}")
            }
            Notice::RecordingFailed { reason } => {
                write!(f, "recording failed: {reason}")
            }
            Notice::RecordingTooShort => {
                "hold the button a little longer to record".fmt(f)
            }
            Notice::UploadRejected(violation) => violation.fmt(f),
            Notice::UploadFailed { reason } => {
                write!(f, "upload failed: {reason}")
            }
            Notice::SendFailed { reason } => {
                write!(f, "message not sent: {reason}")
            }
            Notice::DeleteFailed { reason } => {
                write!(f, "message not deleted: {reason}")
            }
            Notice::LoadFailed { reason } => {
                write!(f, "could not load the conversation: {reason}")
            }
            Notice::EmptyMessage => "there is nothing to send".fmt(f),
            Notice::NoConversation => "select a conversation first".fmt(f),
            Notice::ChannelDown { reason } => match reason {
                Some(reason) => {
                    write!(f, "live updates stopped: {reason}")
                }
                None => "live updates stopped".fmt(f),
            },
        }
    }
}
