//! pace-relay library crate.
//!
//! This crate provides the relay server that lets a web browser drive the
//! track LED hardware: commands arrive as JSON over WebSocket and leave as
//! newline-terminated lines on an Arduino's serial port.
//!
//! # Architecture
//!
//! ```text
//! Browser (JSON over WebSocket, port 3000)
//!         ↕
//! [pace-relay]
//!   ├── domain/           Pure types: ClientEvent, RelayConfig
//!   ├── application/      The DeviceChannel (real serial vs. simulated)
//!   └── infrastructure/
//!         ├── ws_server/  One listener serving the control page + WebSocket
//!         └── serial/     Channel selection and the inbound line pump
//!         ↓
//! Arduino (newline-terminated lines over serial, 9600 baud)
//! ```
//!
//! # Layer rules
//!
//! - `domain` has no external dependencies (no I/O, no async, no frameworks).
//! - `application` depends on `domain` and `pace-core`, plus tokio's I/O
//!   traits for the write path and the serial driver's error type for
//!   [`application::DeviceError`].
//! - `infrastructure` depends on all other layers plus `tokio`,
//!   `tungstenite`, and `tokio-serial`.
//!
//! Keeping the channel selection and JSON parsing out of the I/O code means
//! every decision in the relay can be unit-tested without a browser or a
//! physical device on the other end.

/// Domain layer: pure business-logic types (no I/O).
pub mod domain;

/// Application layer: the device channel abstraction.
pub mod application;

/// Infrastructure layer: the relay server and serial transport.
pub mod infrastructure;
