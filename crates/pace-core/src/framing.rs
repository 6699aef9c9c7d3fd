//! CRLF line framing for the inbound serial byte stream.
//!
//! A serial port, like TCP, is a *stream*: a single `read()` call may return
//! less than one complete line from the Arduino, or several lines at once.
//! [`LineBuffer`] accumulates the raw bytes and hands back complete lines one
//! at a time.
//!
//! The Arduino sketch terminates every line it prints with `\r\n` (the
//! Serial monitor convention), so the delimiter here is exactly CRLF.  A bare
//! `\n` is *not* a delimiter — it stays in the buffer as line content until
//! a CRLF arrives.

/// Accumulates serial bytes and extracts complete CRLF-delimited lines.
///
/// # Usage
///
/// ```rust
/// use pace_core::LineBuffer;
///
/// let mut buf = LineBuffer::new();
/// buf.extend(b"RE");           // partial read — no complete line yet
/// assert_eq!(buf.next_line(), None);
/// buf.extend(b"ADY\r\nOK\r\n"); // coalesced read — two lines complete
/// assert_eq!(buf.next_line().as_deref(), Some("READY"));
/// assert_eq!(buf.next_line().as_deref(), Some("OK"));
/// assert_eq!(buf.next_line(), None);
/// ```
#[derive(Debug, Default)]
pub struct LineBuffer {
    /// Bytes received so far that have not yet formed a complete line.
    buf: Vec<u8>,
}

/// The line delimiter the Arduino uses: CRLF.
const DELIMITER: &[u8] = b"\r\n";

impl LineBuffer {
    /// Creates an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends newly read bytes to the buffer.
    pub fn extend(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Pops the next complete line, with the CRLF delimiter stripped.
    ///
    /// Returns `None` when no complete line is buffered yet; the partial
    /// tail stays in the buffer until more bytes arrive.  Non-UTF-8 bytes
    /// are replaced rather than rejected (`from_utf8_lossy`) — a garbled
    /// line from a flaky serial link should still reach the operator log.
    pub fn next_line(&mut self) -> Option<String> {
        let pos = self
            .buf
            .windows(DELIMITER.len())
            .position(|w| w == DELIMITER)?;

        let line = String::from_utf8_lossy(&self.buf[..pos]).into_owned();
        // Remove the line and its delimiter from the front of the buffer.
        // `drain` shifts the remaining bytes forward, which is O(n) but fine
        // for the short lines an Arduino prints.
        self.buf.drain(..pos + DELIMITER.len());
        Some(line)
    }

    /// Number of bytes currently buffered (partial-line tail).
    pub fn pending(&self) -> usize {
        self.buf.len()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
