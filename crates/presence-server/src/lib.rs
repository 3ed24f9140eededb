//! `presence-server` – the remote command surface.
//!
//! Accepts WebSocket connections from the operator UI, decodes
//! [`RemoteEvent`][presence_types::RemoteEvent] frames, and applies them to
//! the shared [`ControlSession`][presence_core::ControlSession]. Camera
//! pulls are answered from a rate-limited frame cache so an eager client
//! can never flood the robot link.

pub mod frame;
pub mod server;

pub use frame::FrameCache;
pub use server::{RemoteCommandServer, SessionSlot, DEFAULT_PORT};
