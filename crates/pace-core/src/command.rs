//! The [`Command`] token: an opaque text instruction for the track hardware.
//!
//! A command is whatever short string the control page emits — a direction,
//! a speed, a stop.  The relay never interprets it: no validation, no length
//! limit, no internal structure.  The only transformation the system ever
//! applies is [`Command::to_line`], which appends the single `\n` terminator
//! the Arduino sketch reads up to.

use serde::{Deserialize, Serialize};

/// An opaque command token destined for the track hardware.
///
/// Created the moment a connected browser emits it, written to the device
/// channel, and dropped.  Commands have no identity and no history; the relay
/// is stateless between them.
///
/// # Serde representation
///
/// `#[serde(transparent)]` means a `Command` serializes as a bare JSON
/// string, so it slots directly into the browser protocol:
///
/// ```json
/// {"event":"arduino","command":"FWD"}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Command(String);

impl Command {
    /// Wraps a raw token as a `Command`.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Borrows the raw token, exactly as the browser sent it.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The wire form: the token with a single `\n` appended.
    ///
    /// This is the payload handed to the device channel — for every command
    /// `C`, the transmitted bytes are exactly `C + "\n"`.
    pub fn to_line(&self) -> String {
        format!("{}\n", self.0)
    }

    /// Whitespace-trimmed view of the token.
    ///
    /// Used only for human-readable log lines; the wire form is never
    /// trimmed.
    pub fn trimmed(&self) -> &str {
        self.0.trim()
    }
}

impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Command {
    fn from(token: &str) -> Self {
        Self::new(token)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
