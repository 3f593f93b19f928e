//! The real-time messaging engine.
//!
//! One [`ChatClient`] backs one chat view. It owns the per-conversation
//! message cache, the microphone capture lifecycle, the upload
//! pipeline, and the auto-follow decision, and it talks to the outside
//! world through the boundary traits of [`huddle_wire`]. All engine
//! state lives inside a single actor, so user commands, channel events,
//! and timer ticks are handled strictly one at a time.
//!
//! The durable write path is always the REST service; the event channel
//! carries the echoes that keep every open client current, plus
//! best-effort fan-out hints on the way out.

#![deny(missing_docs)]

#[macro_use]
extern crate tracing;

mod api;
mod client;
mod composer;
mod connection;
mod media;
mod notice;
mod recorder;
mod scroll;
mod session;
mod uploads;

pub use client::{ChatClient, ClientBuilder, RecorderUpdate};
pub use connection::{Channel, ChannelEvents, ChannelSignal};
pub use media::Mic;
pub use notice::Notice;
pub use scroll::{FollowTracker, NEAR_BOTTOM_PX, Viewport};
pub use session::{SessionSnapshot, SessionStore};
pub use uploads::{
    MAX_UPLOAD_BYTES, PolicyViolation, UploadPolicy, Uploader,
};
