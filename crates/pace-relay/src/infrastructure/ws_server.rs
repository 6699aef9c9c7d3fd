//! Relay server: one listener for the control page and the command channel.
//!
//! This module is responsible for:
//!
//! 1. Binding a TCP listener on the configured address (default port 3000).
//! 2. Accepting incoming connections from browsers.
//! 3. Sniffing each request head: a WebSocket upgrade becomes a command
//!    session; anything else receives the control page — the same fixed
//!    HTML document for ANY request, with no routing and no method or path
//!    inspection.
//! 4. For each session, parsing `arduino` command events and forwarding each
//!    one exactly once to the shared [`DeviceChannel`].
//! 5. Gracefully shutting down when the `running` flag is cleared.
//!
//! # One port, two protocols
//!
//! The browser loads `http://host:3000` and then opens `ws://host:3000` —
//! the original deployment exposes a single port, and keeping that shape
//! means no extra firewall holes.  tungstenite wants to read the upgrade
//! request itself, so the bytes consumed while sniffing are replayed through
//! the [`Rewind`] wrapper before the handshake runs.
//!
//! # Scalability
//!
//! Each browser session runs in its own Tokio task; the accept loop never
//! blocks on a session.  Sessions share one `Arc<DeviceChannel>` — the only
//! shared state in the process, and it is write-only and never mutated after
//! construction.  Write ordering across concurrent sessions is whatever
//! order their tasks run in; the channel only guarantees that each line
//! reaches the wire contiguous.

use std::pin::Pin;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::task::{Context, Poll};
use std::time::Duration;

use anyhow::{bail, Context as _};
use futures_util::StreamExt;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, ReadBuf};
use tokio::net::TcpListener;
use tokio::time::timeout;
use tokio_tungstenite::{
    accept_async,
    tungstenite::{Error as WsError, Message as WsMessage},
};
use tracing::{debug, error, info, warn};

use crate::application::DeviceChannel;
use crate::domain::{ClientEvent, RelayConfig};

/// Upper bound on a request head.  Real browser requests are well under
/// 8 KiB; anything larger is junk and the connection is dropped.
const MAX_HEAD_BYTES: usize = 8 * 1024;

// ── Public API ────────────────────────────────────────────────────────────────

/// Runs the main accept loop until `running` is set to `false`.
///
/// # Parameters
///
/// - `config`  – Relay configuration (bind address).
/// - `page`    – The control page bytes, read from disk once at startup.
/// - `channel` – The device channel shared by every session.
/// - `running` – Shared flag; the loop exits when this is set to `false`.
///
/// # Errors
///
/// Returns an error if the TCP listener cannot be bound (e.g., the port is
/// already in use or the process lacks permission to bind).
pub async fn run_server(
    config: RelayConfig,
    page: Arc<Vec<u8>>,
    channel: Arc<DeviceChannel>,
    running: Arc<AtomicBool>,
) -> anyhow::Result<()> {
    let listener = TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind listener on {}", config.bind_addr))?;

    info!("relay listening on {}", config.bind_addr);

    loop {
        // Check the shutdown flag before each accept attempt.
        if !running.load(Ordering::Relaxed) {
            info!("shutdown flag set; stopping accept loop");
            break;
        }

        // A short timeout on `accept()` lets the loop periodically check the
        // `running` flag even when no browsers are connecting.
        let accept_result = timeout(Duration::from_millis(200), listener.accept()).await;

        match accept_result {
            Ok(Ok((stream, peer_addr))) => {
                debug!("new connection from {peer_addr}");
                let page = Arc::clone(&page);
                let channel = Arc::clone(&channel);

                // One task per connection; a slow client never delays the
                // accept loop.
                tokio::spawn(async move {
                    handle_connection(stream, peer_addr.to_string(), page, channel).await;
                });
            }
            Ok(Err(e)) => {
                // Transient accept error (e.g., too many open file
                // descriptors).  Log and continue rather than crashing.
                error!("accept error: {e}");
            }
            Err(_) => {
                // Timeout — no new connection in the last 200 ms.  Loop back
                // to check the `running` flag.
            }
        }
    }

    Ok(())
}

// ── Per-connection handler ────────────────────────────────────────────────────

/// Top-level handler for a single accepted connection.
///
/// Wraps [`run_session`] and logs the outcome.  The outer/inner pair lets
/// `run_session` use `?` for clean error propagation while failures stay
/// operator-visible only — nothing is ever reported back to the browser.
async fn handle_connection<S>(
    stream: S,
    peer: String,
    page: Arc<Vec<u8>>,
    channel: Arc<DeviceChannel>,
) where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    if let Err(e) = run_session(stream, peer.clone(), page, channel).await {
        warn!("connection {peer} ended with error: {e:#}");
    }
}

/// Runs the complete lifecycle of one accepted connection.
///
/// Reads the request head, then branches:
///
/// - plain HTTP → serve the control page and close;
/// - WebSocket upgrade → complete the handshake (with the head bytes
///   replayed) and run the command session until the client goes away.
///
/// Generic over the stream so tests can drive a full session over an
/// in-memory `tokio::io::duplex` pipe instead of a real socket.
async fn run_session<S>(
    mut stream: S,
    peer: String,
    page: Arc<Vec<u8>>,
    channel: Arc<DeviceChannel>,
) -> anyhow::Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let head = read_request_head(&mut stream).await?;
    if head.is_empty() {
        // Connection closed before sending anything (port scan, health
        // probe).  Nothing to do.
        debug!("{peer}: connection closed before any request");
        return Ok(());
    }

    if !is_websocket_upgrade(&head) {
        // Any non-upgrade request gets the same fixed document with a
        // success status.  No routing, no method or path inspection.
        let response = render_page_response(&page);
        stream
            .write_all(&response)
            .await
            .with_context(|| format!("{peer}: failed to write page response"))?;
        stream.flush().await.ok();
        stream.shutdown().await.ok();
        debug!("{peer}: served control page ({} bytes)", page.len());
        return Ok(());
    }

    // tungstenite performs its own handshake parse, so hand it the sniffed
    // bytes back via the rewind wrapper.
    let ws_stream = accept_async(Rewind::new(head, stream))
        .await
        .with_context(|| format!("{peer}: WebSocket handshake failed"))?;

    run_command_session(ws_stream, &peer, &channel).await;
    Ok(())
}

/// The command-relay loop for one established WebSocket session.
///
/// Logs exactly one connect line on entry and exactly one disconnect line on
/// exit, whatever the cause of the exit.  Each `arduino` event is forwarded
/// to the device channel exactly once; bad frames are logged and skipped.
async fn run_command_session<S>(
    mut ws_stream: tokio_tungstenite::WebSocketStream<S>,
    peer: &str,
    channel: &DeviceChannel,
) where
    S: AsyncRead + AsyncWrite + Unpin,
{
    info!("✓ Web client connected ({peer})");

    loop {
        let ws_msg = match ws_stream.next().await {
            Some(Ok(msg)) => msg,
            Some(Err(WsError::ConnectionClosed | WsError::Protocol(_))) => {
                debug!("{peer}: WebSocket closed");
                break;
            }
            Some(Err(e)) => {
                warn!("{peer}: WebSocket error: {e}");
                break;
            }
            None => {
                debug!("{peer}: stream ended");
                break;
            }
        };

        match ws_msg {
            WsMessage::Text(json_str) => {
                let event: ClientEvent = match serde_json::from_str(&json_str) {
                    Ok(ev) => ev,
                    Err(e) => {
                        // One bad frame never closes the session; the page
                        // might recover on its next interaction.
                        warn!("{peer}: invalid event frame: {e}");
                        continue;
                    }
                };

                let ClientEvent::Arduino { command } = event;
                info!("→ Sending: {command}");
                channel.write(&command).await;
            }

            WsMessage::Binary(_) => {
                // The browser protocol is JSON text only.
                warn!("{peer}: unexpected binary WebSocket frame (ignored)");
            }

            WsMessage::Ping(data) => {
                // Protocol-level ping; tungstenite queues the Pong reply
                // automatically.
                debug!("{peer}: WebSocket ping ({} bytes)", data.len());
            }

            WsMessage::Pong(_) => {
                debug!("{peer}: WebSocket pong received");
            }

            WsMessage::Close(_) => {
                debug!("{peer}: WebSocket Close frame received");
                break;
            }

            WsMessage::Frame(_) => {
                debug!("{peer}: raw frame (ignored)");
            }
        }
    }

    info!("✗ Web client disconnected ({peer})");
}

// ── Request sniffing ──────────────────────────────────────────────────────────

/// Reads the request head — everything up to and including the blank line.
///
/// Returns an empty buffer when the peer closed without sending anything.
///
/// # Errors
///
/// Fails on a read error or when the head exceeds [`MAX_HEAD_BYTES`].
async fn read_request_head<S: AsyncRead + Unpin>(stream: &mut S) -> anyhow::Result<Vec<u8>> {
    let mut head = Vec::with_capacity(1024);
    let mut read_tmp = [0u8; 1024];

    loop {
        let n = stream
            .read(&mut read_tmp)
            .await
            .context("failed to read request head")?;
        if n == 0 {
            break;
        }
        head.extend_from_slice(&read_tmp[..n]);
        if head.windows(4).any(|w| w == b"\r\n\r\n") {
            break;
        }
        if head.len() > MAX_HEAD_BYTES {
            bail!("request head exceeds {MAX_HEAD_BYTES} bytes");
        }
    }

    Ok(head)
}

/// True when the request head asks for a WebSocket upgrade.
///
/// Case-insensitive scan of the header lines for `Upgrade: websocket`,
/// which is the only signal the relay routes on.
fn is_websocket_upgrade(head: &[u8]) -> bool {
    let text = String::from_utf8_lossy(head);
    for line in text.lines().skip(1) {
        if line.is_empty() {
            break; // end of headers
        }
        if let Some((name, value)) = line.split_once(':') {
            if name.trim().eq_ignore_ascii_case("upgrade")
                && value.trim().eq_ignore_ascii_case("websocket")
            {
                return true;
            }
        }
    }
    false
}

/// Builds the one HTTP response the relay ever sends: `200 OK` with the
/// control page.
fn render_page_response(page: &[u8]) -> Vec<u8> {
    let mut response = format!(
        "HTTP/1.1 200 OK\r\n\
         Content-Type: text/html\r\n\
         Content-Length: {}\r\n\
         Connection: close\r\n\
         \r\n",
        page.len()
    )
    .into_bytes();
    response.extend_from_slice(page);
    response
}

// ── Rewind stream ─────────────────────────────────────────────────────────────

/// A stream wrapper that replays already-consumed bytes before reading from
/// the inner stream.
///
/// The sniffer has to consume the request head to decide HTTP vs. WebSocket,
/// but tungstenite's `accept_async` needs to read that same head for its
/// handshake.  `Rewind` serves the buffered prefix first and then becomes a
/// transparent passthrough; writes always go straight to the inner stream.
struct Rewind<S> {
    prefix: Vec<u8>,
    offset: usize,
    inner: S,
}

impl<S> Rewind<S> {
    fn new(prefix: Vec<u8>, inner: S) -> Self {
        Self {
            prefix,
            offset: 0,
            inner,
        }
    }
}

impl<S: AsyncRead + Unpin> AsyncRead for Rewind<S> {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<std::io::Result<()>> {
        let this = self.get_mut();
        if this.offset < this.prefix.len() {
            let remaining = &this.prefix[this.offset..];
            let n = remaining.len().min(buf.remaining());
            buf.put_slice(&remaining[..n]);
            this.offset += n;
            return Poll::Ready(Ok(()));
        }
        Pin::new(&mut this.inner).poll_read(cx, buf)
    }
}

impl<S: AsyncWrite + Unpin> AsyncWrite for Rewind<S> {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<std::io::Result<usize>> {
        Pin::new(&mut self.get_mut().inner).poll_write(cx, buf)
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        Pin::new(&mut self.get_mut().inner).poll_flush(cx)
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        Pin::new(&mut self.get_mut().inner).poll_shutdown(cx)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
