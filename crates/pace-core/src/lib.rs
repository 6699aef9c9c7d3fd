//! # pace-core
//!
//! Shared library for Track-Pace containing the command token and the serial
//! line-framing buffer.
//!
//! This crate is used by the relay server and its tests.  It has zero
//! dependencies on OS APIs, sockets, or serial drivers — everything here is
//! pure data manipulation, which makes it trivially unit-testable.
//!
//! # Architecture overview (for beginners)
//!
//! Track-Pace is a browser-to-Arduino bridge: a web page sends short text
//! commands (e.g., `FWD`, `STOP`) over a WebSocket, and the relay server
//! forwards each one to an Arduino over a serial port as a newline-terminated
//! line.  Lines the Arduino prints back are read and shown in the operator
//! log.
//!
//! This crate defines the two pieces both directions share:
//!
//! - **`command`** – The [`Command`] token and its one wire transformation:
//!   appending the trailing `\n` the Arduino sketch expects.
//!
//! - **`framing`** – The [`LineBuffer`] that turns the raw byte stream read
//!   from the serial device back into complete CRLF-delimited lines.

pub mod command;
pub mod framing;

// Re-export the two types at the crate root so callers can write
// `pace_core::Command` instead of `pace_core::command::Command`.
pub use command::Command;
pub use framing::LineBuffer;
