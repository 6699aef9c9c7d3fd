//! JSON event types for the browser-facing WebSocket protocol.
//!
//! The control page and the relay speak a tiny JSON protocol: every frame is
//! a JSON object with an `"event"` field naming the event, plus the event's
//! payload fields flattened into the same object.
//!
//! # Message flow
//!
//! ```text
//! Browser → Relay:  JSON text frame  →  ClientEvent
//! ```
//!
//! There are no relay→browser events: the page is a one-way remote control,
//! and the relay never reports anything back to it (failures are
//! operator-visible only, via the server log).
//!
//! # JSON discriminant
//!
//! ```json
//! {"event":"arduino","command":"FWD"}
//! ```
//!
//! Serde's `#[serde(tag = "event")]` attribute handles the discriminant
//! automatically; `rename_all = "lowercase"` maps the `Arduino` variant to
//! the `"arduino"` event name the page emits.

use pace_core::Command;
use serde::{Deserialize, Serialize};

/// All events a browser can send to the relay over WebSocket.
///
/// A frame that does not parse into one of these variants (malformed JSON,
/// unknown event name, missing field) is logged and skipped; it never closes
/// the session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum ClientEvent {
    /// A command for the track hardware.
    ///
    /// The payload is opaque to the relay: it is logged, newline-terminated,
    /// and handed to the device channel, nothing more.
    Arduino {
        /// The command token, forwarded verbatim.
        command: Command,
    },
}

// ── Tests ─────────────────────────────────────────────────────────────────────
