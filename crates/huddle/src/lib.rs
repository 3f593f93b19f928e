//! An out-of-the-box client for per-work-item team chat.
//!
//! The crate wires the messaging engine to its production transports
//! (the REST service, the blob storage endpoints, and the WebSocket
//! event channel) behind one builder. It also ships a small terminal
//! client for trying a deployment from the command line.

#![deny(missing_docs)]

mod workroom;

pub use workroom::{Workroom, WorkroomBuilder};

/// Re-exports of [`huddle_engine`] crate.
pub mod engine {
    pub use huddle_engine::*;
}

/// Re-exports of [`huddle_wire`] crate.
pub mod wire {
    pub use huddle_wire::*;
}
