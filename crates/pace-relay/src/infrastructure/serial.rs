//! Serial transport: startup channel selection and the inbound line pump.
//!
//! # Selection policy
//!
//! Decided exactly once, at process startup, by [`select_channel`]:
//!
//! - No device configured (absent or empty `ARDUINO_PORT`) → the simulated
//!   channel.  No serial API is touched.
//! - Device configured → open it at the fixed 9600 baud.  An open failure is
//!   the one fatal error in the system: the caller (`main`) logs it and
//!   exits non-zero without starting the relay server.
//!
//! # Inbound lines
//!
//! The Arduino prints CRLF-terminated status lines back over the same link.
//! [`read_device_lines`] pumps them through a [`LineBuffer`] and hands each
//! complete line to a callback; production logs them as `Arduino: <line>`
//! and nothing more — inbound data is never processed or exposed to
//! browsers.  A read error after a successful open is logged and ends the
//! pump, but the relay keeps running (outbound writes may still succeed, and
//! restarting the process is the operator's call).

use pace_core::LineBuffer;
use tokio::io::{AsyncRead, AsyncReadExt, ReadHalf};
use tokio_serial::{SerialPortBuilderExt, SerialStream};
use tracing::{debug, error, info};

use crate::application::{DeviceChannel, DeviceError};
use crate::domain::{RelayConfig, BAUD_RATE};

/// Read half of the opened serial stream, handed to the reader task.
pub type DeviceReader = ReadHalf<SerialStream>;

/// Selects and constructs the device channel for this process.
///
/// Returns the channel plus, in real mode, the read half of the serial
/// stream for [`spawn_device_reader`].  The open happens synchronously, so
/// by the time this function returns `Ok` the device is ready: a write can
/// never race an in-progress open.
///
/// # Errors
///
/// [`DeviceError::Open`] when the configured path cannot be opened — wrong
/// path, device unplugged, or insufficient permissions.
pub fn select_channel(
    config: &RelayConfig,
) -> Result<(DeviceChannel, Option<DeviceReader>), DeviceError> {
    let Some(path) = config.device() else {
        info!("Running in SIMULATION mode (no ARDUINO_PORT set)");
        return Ok((DeviceChannel::simulated(), None));
    };

    let stream = tokio_serial::new(path, BAUD_RATE)
        .open_native_async()
        .map_err(|source| DeviceError::Open {
            path: path.to_string(),
            source,
        })?;

    info!("✓ Arduino connected on {path}");

    // Split so the write half can live in the channel while the read half
    // feeds the independent reader task.
    let (reader, writer) = tokio::io::split(stream);
    Ok((DeviceChannel::real(writer), Some(reader)))
}

/// Spawns the background task that logs inbound device lines.
///
/// Real mode only; simulation has nothing to read.
pub fn spawn_device_reader(reader: DeviceReader) {
    tokio::spawn(async move {
        read_device_lines(reader, |line| info!("Arduino: {line}")).await;
    });
}

/// Reads the device until EOF or error, invoking `on_line` for each complete
/// CRLF-delimited line.
///
/// The callback seam exists so tests can collect lines instead of logging
/// them; the framing itself lives in [`pace_core::LineBuffer`].
pub async fn read_device_lines<R, F>(mut reader: R, mut on_line: F)
where
    R: AsyncRead + Unpin,
    F: FnMut(&str),
{
    let mut frames = LineBuffer::new();
    // Temporary buffer for each individual read() call; a serial read
    // returns whatever bytes have arrived, not whole lines.
    let mut read_tmp = [0u8; 1024];

    loop {
        let n = match reader.read(&mut read_tmp).await {
            Ok(0) => {
                debug!("serial device closed (EOF)");
                break;
            }
            Ok(n) => n,
            Err(e) => {
                // Post-open device errors are logged only; the process and
                // the relay server keep running.
                error!("✗ Serial port error: {e}");
                break;
            }
        };

        frames.extend(&read_tmp[..n]);
        // One read may complete several lines at once.
        while let Some(line) = frames.next_line() {
            on_line(&line);
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
