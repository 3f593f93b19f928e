//! The protocol layer of the chat engine.
//!
//! This crate establishes the contracts between the engine and its
//! external collaborators: the real-time event channel, the REST chat
//! service, the blob store, and the audio input device. The engine is
//! written against the traits defined here, so hosts can swap concrete
//! implementations (production transports, in-memory fakes) without
//! touching the engine itself.
//!
//! Types in this crate don't define any behavior, instead they are the
//! constraints that the implementors should adhere to.

#![deny(missing_docs)]

mod api;
mod channel;
mod conversation;
mod device;
mod event;
mod ids;
mod message;
mod store;

pub use api::*;
pub use channel::*;
pub use conversation::*;
pub use device::*;
pub use event::*;
pub use ids::*;
pub use message::*;
pub use store::*;
