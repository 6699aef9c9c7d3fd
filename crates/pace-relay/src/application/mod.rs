//! Application layer for pace-relay.
//!
//! The application layer owns the one behavior in the relay with more than a
//! single branch of consequence: the device channel and its simulation
//! fallback.
//!
//! # Responsibilities
//!
//! - The [`channel::DeviceChannel`] write operation (real vs. simulated)
//! - The [`channel::DeviceError`] type for construction failures
//!
//! # What does NOT belong here?
//!
//! - Opening serial devices or sockets (that is infrastructure)
//! - Tokio task spawning (that happens in the infrastructure layer)
//! - WebSocket framing (handled by tokio-tungstenite)

pub mod channel;

// Re-export so callers can write `application::DeviceChannel` concisely.
pub use channel::{DeviceChannel, DeviceError};
