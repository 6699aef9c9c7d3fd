//! The device channel: one write operation, two variants.
//!
//! At startup the relay selects exactly one of two channel variants and
//! never transitions between them:
//!
//! - **Simulated** — no hardware attached.  "Transmitting" a command means
//!   printing the operator log line `→ Arduino would receive: <command>`.
//! - **Real** — the write half of an opened serial stream.  Transmitting
//!   hands the newline-terminated bytes to the serial driver.
//!
//! # Fire-and-forget
//!
//! [`DeviceChannel::write`] declares no result.  There is no acknowledgement,
//! retry, or delivery confirmation anywhere in the system; a failed real
//! write is logged for the operator and otherwise dropped.  The browser that
//! issued the command is never told either way.

use pace_core::Command;
use thiserror::Error;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Boxed writer so the Real variant works over any byte sink.
///
/// In production this is the write half of a `tokio_serial::SerialStream`;
/// tests substitute an in-memory `tokio::io::duplex` stream and assert the
/// exact bytes transmitted.
pub type DeviceWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// Errors raised while constructing the real device channel.
///
/// Construction failure is the one fatal error path in the relay: `main`
/// logs it and exits non-zero without starting the server.
#[derive(Debug, Error)]
pub enum DeviceError {
    /// The configured serial path could not be opened.
    #[error("could not open serial device '{path}': {source}")]
    Open {
        /// The device path as configured (`--device` / `ARDUINO_PORT`).
        path: String,
        /// The underlying driver error.
        source: tokio_serial::Error,
    },
}

/// The transmit side of the Arduino link, selected once at startup.
///
/// The channel is shared across every browser session via `Arc` and is
/// never mutated after construction; there is no close or reconfigure
/// operation, so channel lifetime equals process lifetime.
pub enum DeviceChannel {
    /// Simulation mode: writes become operator log lines.
    Simulated,
    /// A real serial device.
    ///
    /// The writer sits behind an async `Mutex` because concurrent browser
    /// sessions share the channel; holding the lock across one `write_all`
    /// keeps each transmitted line contiguous on the wire.
    Real {
        /// Write half of the opened serial stream.
        tx: Mutex<DeviceWriter>,
    },
}

impl DeviceChannel {
    /// Constructs the simulation-mode channel.
    ///
    /// Touches no serial API — selecting simulation must never attempt to
    /// open a device.
    pub fn simulated() -> Self {
        Self::Simulated
    }

    /// Constructs the real channel over an already-opened writer.
    ///
    /// Opening the serial device (and failing fatally when that is not
    /// possible) is the infrastructure layer's job; see
    /// `infrastructure::serial::select_channel`.
    pub fn real(writer: impl AsyncWrite + Send + Unpin + 'static) -> Self {
        Self::Real {
            tx: Mutex::new(Box::new(writer)),
        }
    }

    /// True when running without hardware.
    pub fn is_simulated(&self) -> bool {
        matches!(self, Self::Simulated)
    }

    /// Transmits one command, newline-terminated.
    ///
    /// For every command `C` the payload handed to the sink is exactly
    /// `C + "\n"` — see [`Command::to_line`].  Fire-and-forget: errors are
    /// logged, never returned, and nothing is reported back to the browser.
    pub async fn write(&self, command: &Command) {
        match self {
            Self::Simulated => {
                info!("{}", simulated_receipt(command));
            }
            Self::Real { tx } => {
                let line = command.to_line();
                let mut writer = tx.lock().await;
                let result = async {
                    writer.write_all(line.as_bytes()).await?;
                    writer.flush().await
                }
                .await;
                if let Err(e) = result {
                    warn!("✗ Serial write failed: {e}");
                }
            }
        }
    }
}

impl std::fmt::Debug for DeviceChannel {
    // Manual impl because the boxed writer is not Debug.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Simulated => f.write_str("DeviceChannel::Simulated"),
            Self::Real { .. } => f.write_str("DeviceChannel::Real"),
        }
    }
}

/// Renders the simulation-mode log line for a command.
///
/// The exact text is load-bearing: operators (and the test suite) grep for
/// `→ Arduino would receive:` to confirm the relay path end to end without
/// hardware.  The command is trimmed for display only; the wire form is not.
pub fn simulated_receipt(command: &Command) -> String {
    format!("→ Arduino would receive: {}", command.trimmed())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;

    #[test]
    fn test_simulated_receipt_exact_text() {
        let cmd = Command::new("FWD");
        assert_eq!(simulated_receipt(&cmd), "→ Arduino would receive: FWD");
    }

    #[test]
    fn test_simulated_receipt_trims_the_command() {
        // The log line shows the trimmed token; the wire form would not be
        // trimmed, but simulation never produces a wire form.
        let cmd = Command::new(" FWD \n");
        assert_eq!(simulated_receipt(&cmd), "→ Arduino would receive: FWD");
    }

    #[test]
    fn test_simulated_constructor_is_simulated() {
        assert!(DeviceChannel::simulated().is_simulated());
    }

    #[tokio::test]
    async fn test_simulated_write_completes_without_error() {
        // Simulation mode has no sink to fail; write must simply return.
        let channel = DeviceChannel::simulated();
        channel.write(&Command::new("FWD")).await;
    }

    #[tokio::test]
    async fn test_real_write_transmits_command_plus_newline() {
        // Arrange: a real channel over an in-memory stream standing in for
        // the serial driver.
        let (writer, mut observer) = tokio::io::duplex(64);
        let channel = DeviceChannel::real(writer);
        assert!(!channel.is_simulated());

        // Act
        channel.write(&Command::new("FWD")).await;

        // Assert: the transmitted payload is exactly C + "\n"
        let mut buf = [0u8; 4];
        observer.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"FWD\n");
    }

    #[tokio::test]
    async fn test_real_write_does_not_trim_the_wire_form() {
        let (writer, mut observer) = tokio::io::duplex(64);
        let channel = DeviceChannel::real(writer);

        channel.write(&Command::new(" S 3 ")).await;

        let mut buf = [0u8; 6];
        observer.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b" S 3 \n");
    }

    #[tokio::test]
    async fn test_sequential_writes_each_transmit_once() {
        let (writer, mut observer) = tokio::io::duplex(64);
        let channel = DeviceChannel::real(writer);

        channel.write(&Command::new("FWD")).await;
        channel.write(&Command::new("STOP")).await;

        let mut buf = [0u8; 9];
        observer.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"FWD\nSTOP\n");
    }

    #[tokio::test]
    async fn test_concurrent_writes_do_not_interleave_within_a_line() {
        use std::sync::Arc;

        // Two tasks hammer the shared channel; every transmitted line must
        // come out complete and distinct (order unspecified).
        let (writer, mut observer) = tokio::io::duplex(4096);
        let channel = Arc::new(DeviceChannel::real(writer));

        let a = {
            let ch = Arc::clone(&channel);
            tokio::spawn(async move {
                for _ in 0..20 {
                    ch.write(&Command::new("AAAA")).await;
                }
            })
        };
        let b = {
            let ch = Arc::clone(&channel);
            tokio::spawn(async move {
                for _ in 0..20 {
                    ch.write(&Command::new("BB")).await;
                }
            })
        };
        a.await.unwrap();
        b.await.unwrap();

        let mut out = vec![0u8; 40 * 3 + 40];
        // 20 * "AAAA\n" (5 bytes) + 20 * "BB\n" (3 bytes) = 160 bytes
        let mut total = Vec::new();
        while total.len() < 160 {
            let n = observer.read(&mut out).await.unwrap();
            total.extend_from_slice(&out[..n]);
        }
        let text = String::from_utf8(total).unwrap();
        for line in text.lines() {
            assert!(line == "AAAA" || line == "BB", "corrupt line: {line:?}");
        }
        assert_eq!(text.lines().count(), 40);
    }

    #[tokio::test]
    async fn test_write_failure_is_swallowed_not_propagated() {
        // Arrange: drop the read side so the duplex stream reports a broken
        // pipe on write.
        let (writer, observer) = tokio::io::duplex(64);
        drop(observer);
        let channel = DeviceChannel::real(writer);

        // Act / Assert: fire-and-forget — no panic, no error surfaced.
        channel.write(&Command::new("FWD")).await;
    }
}
