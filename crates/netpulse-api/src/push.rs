//! Push channel with auto-reconnect.
//!
//! Keeps one WebSocket open to the monitoring server, decodes every text
//! frame into a [`ServerFrame`], and forwards it -- together with
//! connection lifecycle transitions -- through an ordered `mpsc` channel.
//! Outbound [`ClientSignal`]s are written on the live socket. When the
//! socket drops, the loop reconnects with exponential backoff + jitter.
//!
//! # Example
//!
//! ```rust,ignore
//! use netpulse_api::push::{PushChannel, ReconnectConfig, ChannelEvent};
//! use tokio_util::sync::CancellationToken;
//!
//! let cancel = CancellationToken::new();
//! let url = url::Url::parse("ws://127.0.0.1:5000/ws")?;
//! let (channel, mut events) = PushChannel::open(url, ReconnectConfig::default(), cancel.clone());
//!
//! while let Some(event) = events.recv().await {
//!     if let ChannelEvent::Connected = event {
//!         channel.send(ClientSignal::JoinMonitoring);
//!     }
//! }
//! ```

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::error::Error;
use crate::frames::{self, ClientSignal, ServerFrame};

// ── ChannelEvent ─────────────────────────────────────────────────────

/// Everything the push channel reports to its consumer, in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelEvent {
    /// A socket is open and ready for signals.
    Connected,
    /// A decoded server frame.
    Frame(ServerFrame),
    /// The socket closed or could not be opened.
    Disconnected { reason: String },
    /// Waiting before reconnect attempt `attempt`.
    Reconnecting { attempt: u32 },
}

// ── ReconnectConfig ──────────────────────────────────────────────────

/// Exponential backoff configuration for push-channel reconnection.
#[derive(Debug, Clone)]
pub struct ReconnectConfig {
    /// Delay before the first reconnection attempt. Default: 1s.
    pub initial_delay: Duration,

    /// Upper bound on backoff delay. Default: 30s.
    pub max_delay: Duration,

    /// Maximum reconnection attempts before giving up.
    /// `None` means retry forever.
    pub max_retries: Option<u32>,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            max_retries: None,
        }
    }
}

// ── PushChannel ──────────────────────────────────────────────────────

/// Handle to a running push channel.
///
/// Cheap to clone. Dropping every handle does not stop the background
/// task; call [`shutdown`](Self::shutdown) or cancel the token.
#[derive(Clone)]
pub struct PushChannel {
    signal_tx: mpsc::UnboundedSender<ClientSignal>,
    cancel: CancellationToken,
}

impl PushChannel {
    /// Spawn the connection loop and return the handle plus the event
    /// receiver. The first connection attempt happens asynchronously.
    pub fn open(
        url: Url,
        reconnect: ReconnectConfig,
        cancel: CancellationToken,
    ) -> (Self, mpsc::UnboundedReceiver<ChannelEvent>) {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (signal_tx, signal_rx) = mpsc::unbounded_channel();

        let task_cancel = cancel.clone();
        tokio::spawn(async move {
            push_loop(url, event_tx, signal_rx, reconnect, task_cancel).await;
        });

        (Self { signal_tx, cancel }, event_rx)
    }

    /// Queue a signal for the live socket.
    ///
    /// Signals queued while no socket is open are discarded when the next
    /// socket opens.
    pub fn send(&self, signal: ClientSignal) {
        if self.signal_tx.send(signal).is_err() {
            tracing::debug!(?signal, "push channel closed, signal dropped");
        }
    }

    /// Signal the background task to shut down gracefully.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}

// ── Background reconnection loop ─────────────────────────────────────

/// Main loop: connect → read/write → on drop, backoff → reconnect.
async fn push_loop(
    url: Url,
    event_tx: mpsc::UnboundedSender<ChannelEvent>,
    mut signal_rx: mpsc::UnboundedReceiver<ClientSignal>,
    reconnect: ReconnectConfig,
    cancel: CancellationToken,
) {
    let mut attempt: u32 = 0;

    loop {
        let result = tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            result = connect_and_run(&url, &event_tx, &mut signal_rx, &cancel) => result,
        };

        if cancel.is_cancelled() {
            break;
        }

        let reason = match result {
            // Clean close after a working session resets the backoff.
            Ok(()) => {
                tracing::info!("push channel closed cleanly, reconnecting");
                attempt = 0;
                "connection closed".to_owned()
            }
            Err(e) => {
                tracing::warn!(error = %e, attempt, "push channel error");
                e.to_string()
            }
        };

        if event_tx.send(ChannelEvent::Disconnected { reason }).is_err() {
            break;
        }

        if let Some(max) = reconnect.max_retries {
            if attempt >= max {
                tracing::error!(max_retries = max, "push reconnection limit reached, giving up");
                break;
            }
        }

        attempt += 1;
        let delay = calculate_backoff(attempt - 1, &reconnect);
        tracing::info!(
            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            attempt,
            "waiting before reconnect"
        );
        let _ = event_tx.send(ChannelEvent::Reconnecting { attempt });

        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            () = tokio::time::sleep(delay) => {}
        }
    }

    tracing::debug!("push loop exiting");
}

// ── Single connection lifecycle ──────────────────────────────────────

/// Open one socket and pump frames and signals until it drops.
async fn connect_and_run(
    url: &Url,
    event_tx: &mpsc::UnboundedSender<ChannelEvent>,
    signal_rx: &mut mpsc::UnboundedReceiver<ClientSignal>,
    cancel: &CancellationToken,
) -> Result<(), Error> {
    tracing::info!(url = %url, "connecting push channel");

    let (ws_stream, _response) = tokio_tungstenite::connect_async(url.as_str())
        .await
        .map_err(|e| Error::WebSocketConnect(e.to_string()))?;

    // Stale signals belong to a socket that no longer exists.
    while signal_rx.try_recv().is_ok() {}

    tracing::info!("push channel connected");
    let _ = event_tx.send(ChannelEvent::Connected);

    let (mut write, mut read) = ws_stream.split();

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                let _ = write.send(tungstenite::Message::Close(None)).await;
                return Ok(());
            }
            Some(signal) = signal_rx.recv() => {
                tracing::debug!(?signal, "sending signal");
                write
                    .send(tungstenite::Message::Text(signal.encode().into()))
                    .await
                    .map_err(|e| Error::WebSocketConnect(e.to_string()))?;
            }
            frame = read.next() => {
                match frame {
                    Some(Ok(tungstenite::Message::Text(text))) => {
                        forward_frame(&text, event_tx);
                    }
                    Some(Ok(tungstenite::Message::Ping(_))) => {
                        // tungstenite queues the pong; it goes out on the next write/flush
                        tracing::trace!("push channel ping");
                    }
                    Some(Ok(tungstenite::Message::Close(frame))) => {
                        return match frame {
                            Some(cf) => Err(Error::WebSocketClosed {
                                code: u16::from(cf.code),
                                reason: cf.reason.to_string(),
                            }),
                            None => Ok(()),
                        };
                    }
                    Some(Err(e)) => {
                        return Err(Error::WebSocketConnect(e.to_string()));
                    }
                    None => {
                        tracing::info!("push stream ended");
                        return Ok(());
                    }
                    _ => {
                        // Binary, Pong, Frame -- ignore
                    }
                }
            }
        }
    }
}

/// Decode a text frame and forward it. Undecodable frames are logged and
/// dropped; they never interrupt the stream.
fn forward_frame(text: &str, event_tx: &mpsc::UnboundedSender<ChannelEvent>) {
    match frames::decode(text) {
        Ok(frame) => {
            let _ = event_tx.send(ChannelEvent::Frame(frame));
        }
        Err(Error::UnknownEvent { name }) => {
            tracing::warn!(event = %name, "ignoring unrecognized push event");
        }
        Err(e) => {
            tracing::warn!(error = %e, "ignoring malformed push frame");
        }
    }
}

// ── Backoff calculation ──────────────────────────────────────────────

/// Exponential backoff with jitter.
///
/// `delay = min(initial * 2^attempt, max) + jitter`
///
/// Jitter is +-25% to spread out reconnection storms from many dashboards.
fn calculate_backoff(attempt: u32, config: &ReconnectConfig) -> Duration {
    let exponent = i32::try_from(attempt.min(30)).unwrap_or(30);
    let base = config.initial_delay.as_secs_f64() * 2.0_f64.powi(exponent);
    let capped = base.min(config.max_delay.as_secs_f64());

    // Deterministic "jitter" seeded from the attempt number.
    let jitter_factor = 1.0 + 0.25 * (f64::from(attempt) * 7.3).sin();
    let with_jitter = (capped * jitter_factor).max(0.0);

    Duration::from_secs_f64(with_jitter)
}

// ── Tests ────────────────────────────────────────────────────────────
