//! Infrastructure layer for pace-relay.
//!
//! The infrastructure layer handles all I/O: accepting browser connections,
//! serving the control page, running WebSocket sessions, and talking to the
//! serial device.
//!
//! # Responsibilities
//!
//! - Binding the combined HTTP/WebSocket listener
//! - Sniffing request heads and performing the WebSocket upgrade
//! - Opening the serial device and selecting the channel variant
//! - Pumping inbound device lines to the operator log
//! - Spawning per-connection Tokio tasks
//! - Handling the graceful shutdown signal
//!
//! # What does NOT belong here?
//!
//! - The write semantics of the device channel (application layer)
//! - Event type definitions (domain layer)
//! - Configuration parsing (done in `main.rs`)

pub mod serial;
pub mod ws_server;

// Re-export the primary entry points so `main.rs` can call them concisely.
pub use serial::{select_channel, spawn_device_reader};
pub use ws_server::run_server;
