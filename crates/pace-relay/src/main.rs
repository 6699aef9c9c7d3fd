//! Track-Pace relay — entry point.
//!
//! This binary serves the track LED control page to web browsers and relays
//! the commands they issue to an Arduino over a serial port.  When no device
//! is configured it runs in simulation mode: every command becomes an
//! operator log line instead of serial bytes, so the whole relay path can be
//! exercised without hardware on the desk.
//!
//! # Usage
//!
//! ```text
//! pace-relay [OPTIONS]
//!
//! Options:
//!   --port   <PORT>  Listener port for the page + WebSocket [default: 3000]
//!   --bind   <ADDR>  Bind address [default: 0.0.0.0]
//!   --device <PATH>  Serial device path; omit for simulation mode
//!   --page   <FILE>  Control page file [default: index.html]
//! ```
//!
//! # Environment variable overrides
//!
//! CLI args take precedence when both are present.
//!
//! | Variable       | Default      | Description                         |
//! |----------------|--------------|-------------------------------------|
//! | `ARDUINO_PORT` | *(unset)*    | Serial device path; unset or empty selects simulation mode |
//! | `PACE_PORT`    | `3000`       | Listener port                       |
//! | `PACE_BIND`    | `0.0.0.0`    | Bind address                        |
//! | `PACE_PAGE`    | `index.html` | Control page file                   |
//!
//! # Architecture overview
//!
//! ```text
//! Web Browser  (control page + JSON over WebSocket, one port)
//!       ↓
//! pace-relay  ← this process
//!   domain/          ClientEvent, RelayConfig
//!   application/     DeviceChannel (real serial vs. simulated)
//!   infrastructure/
//!     ws_server/     Accept loop, page serving, command sessions
//!     serial/        Channel selection, inbound line pump
//!       ↓
//! Arduino  (newline-terminated commands over serial, 9600 baud)
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use anyhow::Context;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use pace_relay::domain::RelayConfig;
use pace_relay::infrastructure::{run_server, select_channel, spawn_device_reader};

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Track-Pace browser-to-Arduino command relay.
///
/// Serves the control page and forwards browser-issued commands to the track
/// hardware (or to the log, in simulation mode).
#[derive(Debug, Parser)]
#[command(
    name = "pace-relay",
    about = "Browser-to-Arduino command relay for track LED pace control",
    version
)]
struct Cli {
    /// TCP port for the combined page/WebSocket listener.
    #[arg(long, default_value_t = 3000, env = "PACE_PORT")]
    port: u16,

    /// IP address to bind the listener to.
    ///
    /// Use `0.0.0.0` to accept connections from the LAN, or `127.0.0.1` to
    /// accept only local connections.
    #[arg(long, default_value = "0.0.0.0", env = "PACE_BIND")]
    bind: String,

    /// Serial device path of the Arduino (e.g., `/dev/ttyACM0`, `COM7`).
    ///
    /// Omit — or leave `ARDUINO_PORT` empty — to run in simulation mode.
    #[arg(long, env = "ARDUINO_PORT")]
    device: Option<String>,

    /// Path of the control page to serve.
    ///
    /// Read into memory once at startup; a missing file is a startup error.
    #[arg(long, default_value = "index.html", env = "PACE_PAGE")]
    page: PathBuf,
}

impl Cli {
    /// Converts the parsed CLI arguments into a [`RelayConfig`].
    ///
    /// # Errors
    ///
    /// Returns an error if `--bind` is not a valid IP address.
    fn into_relay_config(self) -> anyhow::Result<RelayConfig> {
        let bind_addr: SocketAddr = format!("{}:{}", self.bind, self.port)
            .parse()
            .with_context(|| format!("invalid bind address: '{}:{}'", self.bind, self.port))?;

        Ok(RelayConfig {
            bind_addr,
            device_path: self.device,
            page_path: self.page,
        })
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

/// Program entry point.
///
/// Startup order matters: the device channel is constructed *before* the
/// listener, so a serial open failure exits non-zero without ever accepting
/// a browser connection.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // `EnvFilter::try_from_default_env()` reads the `RUST_LOG` environment
    // variable; absent or invalid falls back to `info`.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = cli.into_relay_config()?;

    // The page is read exactly once; edits while running have no effect.
    let page = std::fs::read(&config.page_path)
        .with_context(|| format!("failed to read control page '{}'", config.page_path.display()))?;
    let page = Arc::new(page);

    // Channel selection — the one fatal error path.  A synchronous open
    // failure is logged and the process exits with a non-zero status; the
    // relay server is never started.
    let (channel, device_reader) = match select_channel(&config) {
        Ok(selected) => selected,
        Err(e) => {
            error!("✗ Error: {e}");
            return Err(e.into());
        }
    };
    let channel = Arc::new(channel);

    // Real mode: log the lines the Arduino prints back.
    if let Some(reader) = device_reader {
        spawn_device_reader(reader);
    }

    info!("================================");
    info!("  TRACK LED PACE CONTROL");
    info!("================================");
    info!("Server: http://localhost:{}", config.bind_addr.port());
    info!("================================");

    // Graceful shutdown flag: Ctrl+C clears it, and the accept loop checks
    // it every 200 ms.
    let running = Arc::new(AtomicBool::new(true));
    let running_clone = Arc::clone(&running);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("received Ctrl+C — initiating graceful shutdown");
                running_clone.store(false, Ordering::Relaxed);
            }
            Err(e) => {
                tracing::error!("failed to listen for Ctrl+C signal: {e}");
            }
        }
    });

    run_server(config, page, channel, running).await?;

    info!("track-pace relay stopped");
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
