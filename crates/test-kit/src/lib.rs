//! Local fakes of the engine's collaborators, for testing purpose.
//!
//! Each fake implements one boundary trait from `huddle-wire` against
//! plain in-memory state: a scripted event channel, an in-memory chat
//! service, a counting blob store, and a scripted microphone. None of
//! them touch the network, and all of them record what the engine did
//! to them so tests can assert on it.
//!
//! # Note
//!
//! These types are not optimized for production use, there are heavy
//! memory copies involved. You should only use them for testing.

pub mod api;
pub mod blobs;
pub mod channel;
pub mod mic;

pub use api::MemoryApi;
pub use blobs::MemoryBlobStore;
pub use channel::ScriptedChannel;
pub use mic::{ScriptedCapture, ScriptedMic};
