//! Domain layer for pace-relay.
//!
//! The domain layer contains pure business-logic types that have no
//! dependencies on I/O, networking, or external frameworks.  This makes them
//! easy to test in isolation.
//!
//! # What belongs in the domain layer?
//!
//! - The browser event types (the JSON "language" between page and relay)
//! - Configuration structures
//!
//! # What does NOT belong here?
//!
//! - Any `tokio`, `TcpStream`, or serial-port types
//! - File I/O or environment variable reading

pub mod config;
pub mod messages;

// Re-export the most commonly needed types at the domain module boundary
// so callers can write `domain::RelayConfig` instead of the longer path.
pub use config::{RelayConfig, BAUD_RATE};
pub use messages::ClientEvent;
