// ── Connection manager ──
//
// Owns the live-monitoring subscription on top of the push channel.
// Consumes `ChannelEvent`s strictly in order on a single task: lifecycle
// events drive the connection state, frames go to the dispatcher.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use arc_swap::ArcSwapOption;
use netpulse_api::{ChannelEvent, ClientSignal, PushChannel};
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::dispatch::{Dispatched, EventDispatcher};
use crate::model::AlertSpec;
use crate::store::AlertLedger;

/// Warning raised when a working push channel drops.
pub const MSG_CONNECTION_LOST: &str = "Real-time connection lost, reconnecting\u{2026}";

// ── ConnectionState ──────────────────────────────────────────────────

/// Push-channel state observable by consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Reconnecting { attempt: u32 },
}

// ── SignalSink ───────────────────────────────────────────────────────

/// Outbound half of the push channel.
pub trait SignalSink: Send + Sync {
    fn send_signal(&self, signal: ClientSignal);
}

impl SignalSink for PushChannel {
    fn send_signal(&self, signal: ClientSignal) {
        self.send(signal);
    }
}

impl SignalSink for mpsc::UnboundedSender<ClientSignal> {
    fn send_signal(&self, signal: ClientSignal) {
        let _ = self.send(signal);
    }
}

// ── ConnectionManager ────────────────────────────────────────────────

pub struct ConnectionManager {
    state: watch::Sender<ConnectionState>,
    auto_refresh: AtomicBool,
    sink: ArcSwapOption<Box<dyn SignalSink>>,
    dispatcher: EventDispatcher,
    ledger: AlertLedger,
}

impl ConnectionManager {
    pub(crate) fn new(dispatcher: EventDispatcher, ledger: AlertLedger, auto_refresh: bool) -> Self {
        let (state, _) = watch::channel(ConnectionState::Disconnected);
        Self {
            state,
            auto_refresh: AtomicBool::new(auto_refresh),
            sink: ArcSwapOption::empty(),
            dispatcher,
            ledger,
        }
    }

    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<ConnectionState> {
        self.state.subscribe()
    }

    pub fn dispatcher(&self) -> &EventDispatcher {
        &self.dispatcher
    }

    pub fn auto_refresh(&self) -> bool {
        self.auto_refresh.load(Ordering::Acquire)
    }

    /// Toggle live monitoring. While connected, turning it on sends
    /// `join_monitoring` and turning it off sends `leave_monitoring`.
    /// Setting the current value again still re-sends the signal.
    pub fn set_auto_refresh(&self, enabled: bool) {
        self.auto_refresh.store(enabled, Ordering::Release);
        if self.state() != ConnectionState::Connected {
            debug!(enabled, "auto-refresh changed while offline");
            return;
        }
        let signal = if enabled {
            ClientSignal::JoinMonitoring
        } else {
            ClientSignal::LeaveMonitoring
        };
        self.signal(signal);
    }

    /// Install the outbound half of a freshly opened channel.
    pub fn attach(&self, sink: impl SignalSink + 'static) {
        self.sink.store(Some(Arc::new(Box::new(sink))));
        self.state.send_replace(ConnectionState::Connecting);
    }

    /// Drop the outbound half and mark the channel as closed.
    pub fn detach(&self) {
        self.sink.store(None);
        self.state.send_replace(ConnectionState::Disconnected);
    }

    /// Apply one channel event. Synchronous: runs to completion before
    /// the next event is looked at.
    pub fn handle_event(&self, event: ChannelEvent) -> Option<Dispatched> {
        match event {
            ChannelEvent::Connected => {
                info!("push channel connected");
                self.state.send_replace(ConnectionState::Connected);
                if self.auto_refresh() {
                    self.signal(ClientSignal::JoinMonitoring);
                }
                None
            }
            ChannelEvent::Frame(frame) => Some(self.dispatcher.dispatch(frame)),
            ChannelEvent::Disconnected { reason } => {
                let previous = self.state.send_replace(ConnectionState::Disconnected);
                if previous == ConnectionState::Connected {
                    warn!(%reason, "push channel lost");
                    self.ledger
                        .create(AlertSpec::warning(MSG_CONNECTION_LOST).persistent());
                } else {
                    debug!(%reason, "push channel still down");
                }
                None
            }
            ChannelEvent::Reconnecting { attempt } => {
                debug!(attempt, "push channel reconnecting");
                self.state
                    .send_replace(ConnectionState::Reconnecting { attempt });
                None
            }
        }
    }

    /// Consume channel events until the receiver closes or `cancel` fires.
    pub async fn run(
        self: Arc<Self>,
        mut events: mpsc::UnboundedReceiver<ChannelEvent>,
        cancel: CancellationToken,
    ) {
        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                event = events.recv() => {
                    let Some(event) = event else { break };
                    self.handle_event(event);
                }
            }
        }
        self.detach();
        debug!("connection manager stopped");
    }

    fn signal(&self, signal: ClientSignal) {
        match self.sink.load_full() {
            Some(sink) => {
                debug!(?signal, "sending signal");
                sink.send_signal(signal);
            }
            None => debug!(?signal, "no push channel, signal dropped"),
        }
    }
}
