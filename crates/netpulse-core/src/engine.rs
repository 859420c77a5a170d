// ── Monitor engine ──
//
// The single engine object. Owns the registry, ledger, and stats board,
// wires the push channel into the connection manager, and routes
// operator commands through one processor task.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use netpulse_api::transport::{TlsMode, TransportConfig};
use netpulse_api::{DashboardClient, PushChannel, ReconnectConfig, ServerFrame};
use tokio::sync::{Mutex, broadcast, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::command::{Command, CommandEnvelope, CommandResult};
use crate::config::{MonitorConfig, TlsVerification};
use crate::connection::{ConnectionManager, ConnectionState};
use crate::dispatch::{Dispatched, EventDispatcher};
use crate::error::CoreError;
use crate::model::{Alert, Device, StatsSnapshot};
use crate::refresh::RefreshController;
use crate::store::{AlertLedger, DeviceRegistry, StatsBoard};
use crate::stream::EntityStream;
use crate::update::{self, Update};

const COMMAND_CHANNEL_SIZE: usize = 64;

// ── Monitor ──────────────────────────────────────────────────────────

/// The main entry point for consumers.
///
/// Cheaply cloneable; clones share one engine. Construct once and pass it
/// to every caller. Reads go straight to snapshots, mutations go through
/// [`execute`](Self::execute) or the push channel.
#[derive(Clone)]
pub struct Monitor {
    inner: Arc<MonitorInner>,
}

struct MonitorInner {
    config: MonitorConfig,
    registry: Arc<DeviceRegistry>,
    ledger: AlertLedger,
    stats: Arc<StatsBoard>,
    updates: broadcast::Sender<Update>,
    refresh: RefreshController,
    connection: Arc<ConnectionManager>,
    running: AtomicBool,
    command_tx: Mutex<mpsc::Sender<CommandEnvelope>>,
    command_rx: Mutex<Option<mpsc::Receiver<CommandEnvelope>>>,
    cancel: CancellationToken,
    /// Child token for the current run; replaced on restart.
    cancel_child: Mutex<CancellationToken>,
    push: Mutex<Option<PushChannel>>,
    task_handles: Mutex<Vec<JoinHandle<()>>>,
}

impl Drop for MonitorInner {
    fn drop(&mut self) {
        self.cancel.cancel();
        self.ledger.shutdown();
    }
}

impl Monitor {
    /// Build the engine and its HTTP client. Does not touch the network;
    /// call [`start`](Self::start) to open the push channel and spawn
    /// background tasks.
    pub fn new(config: MonitorConfig) -> Result<Self, CoreError> {
        let client = DashboardClient::new(config.api_url.clone(), &build_transport(&config))?;
        Ok(Self::with_client(config, client))
    }

    /// Build the engine around an existing client.
    pub fn with_client(config: MonitorConfig, client: DashboardClient) -> Self {
        let updates = update::channel();
        let registry = Arc::new(DeviceRegistry::new(updates.clone()));
        let ledger = AlertLedger::new(updates.clone());
        let stats = Arc::new(StatsBoard::new(updates.clone()));

        let refresh = RefreshController::new(
            client,
            Arc::clone(&registry),
            ledger.clone(),
            Arc::clone(&stats),
        );
        let dispatcher =
            EventDispatcher::new(Arc::clone(&registry), ledger.clone(), Arc::clone(&stats));
        let connection = Arc::new(ConnectionManager::new(
            dispatcher,
            ledger.clone(),
            config.auto_refresh,
        ));

        let (command_tx, command_rx) = mpsc::channel(COMMAND_CHANNEL_SIZE);
        let cancel = CancellationToken::new();
        let cancel_child = cancel.child_token();

        Self {
            inner: Arc::new(MonitorInner {
                config,
                registry,
                ledger,
                stats,
                updates,
                refresh,
                connection,
                running: AtomicBool::new(false),
                command_tx: Mutex::new(command_tx),
                command_rx: Mutex::new(Some(command_rx)),
                cancel,
                cancel_child: Mutex::new(cancel_child),
                push: Mutex::new(None),
                task_handles: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.inner.config
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Spawn the command processor, open the push channel (if enabled),
    /// and start periodic refresh (if configured).
    ///
    /// Does not pull the device list; send [`Command::RefreshDevices`]
    /// for the initial load. Calling `start` twice is a no-op.
    pub async fn start(&self) -> Result<(), CoreError> {
        if self.inner.running.swap(true, Ordering::AcqRel) {
            debug!("monitor already running");
            return Ok(());
        }

        let cancel = self.inner.cancel_child.lock().await.clone();
        let mut handles = self.inner.task_handles.lock().await;

        let Some(rx) = self.inner.command_rx.lock().await.take() else {
            self.inner.running.store(false, Ordering::Release);
            return Err(CoreError::Internal("command receiver missing".into()));
        };
        handles.push(tokio::spawn(command_processor_task(
            self.clone(),
            rx,
            cancel.clone(),
        )));

        if self.inner.config.push_enabled {
            let reconnect = ReconnectConfig {
                initial_delay: self.inner.config.reconnect.initial_delay,
                max_delay: self.inner.config.reconnect.max_delay,
                max_retries: None,
            };
            let (channel, events) = PushChannel::open(
                self.inner.config.push_url.clone(),
                reconnect,
                cancel.child_token(),
            );
            self.inner.connection.attach(channel.clone());
            *self.inner.push.lock().await = Some(channel);

            let connection = Arc::clone(&self.inner.connection);
            handles.push(tokio::spawn(connection.run(events, cancel.clone())));
            info!(url = %self.inner.config.push_url, "push channel opening");
        }

        let interval_secs = self.inner.config.refresh_interval_secs;
        if interval_secs > 0 {
            handles.push(tokio::spawn(refresh_task(
                self.clone(),
                interval_secs,
                cancel.clone(),
            )));
        }

        info!(api = %self.inner.config.api_url, "monitor started");
        Ok(())
    }

    /// Stop background tasks and close the push channel. The engine can
    /// be started again; state is kept.
    pub async fn shutdown(&self) {
        if !self.inner.running.load(Ordering::Acquire) {
            return;
        }

        // Child token only; the parent stays usable for a restart.
        {
            let mut child = self.inner.cancel_child.lock().await;
            child.cancel();
            *child = self.inner.cancel.child_token();
        }

        if let Some(push) = self.inner.push.lock().await.take() {
            push.shutdown();
        }

        let mut handles = self.inner.task_handles.lock().await;
        for handle in handles.drain(..) {
            let _ = handle.await;
        }

        // The old receiver was consumed by the processor task.
        {
            let (tx, rx) = mpsc::channel(COMMAND_CHANNEL_SIZE);
            *self.inner.command_tx.lock().await = tx;
            *self.inner.command_rx.lock().await = Some(rx);
        }

        self.inner.connection.detach();
        self.inner.running.store(false, Ordering::Release);
        debug!("monitor stopped");
    }

    pub fn is_running(&self) -> bool {
        self.inner.running.load(Ordering::Acquire)
    }

    // ── Command execution ────────────────────────────────────────────

    /// Execute a command through the processor task and await its result.
    pub async fn execute(&self, cmd: Command) -> Result<CommandResult, CoreError> {
        if !self.is_running() {
            return Err(CoreError::NotRunning);
        }

        let (tx, rx) = oneshot::channel();
        let command_tx = self.inner.command_tx.lock().await.clone();

        command_tx
            .send(CommandEnvelope {
                command: cmd,
                response_tx: tx,
            })
            .await
            .map_err(|_| CoreError::NotRunning)?;

        rx.await.map_err(|_| CoreError::NotRunning)?
    }

    /// Start without the push channel or periodic refresh, run `f`, stop.
    pub async fn oneshot<F, Fut, T>(config: MonitorConfig, f: F) -> Result<T, CoreError>
    where
        F: FnOnce(Monitor) -> Fut,
        Fut: std::future::Future<Output = Result<T, CoreError>>,
    {
        let mut cfg = config;
        cfg.push_enabled = false;
        cfg.refresh_interval_secs = 0;

        let monitor = Monitor::new(cfg)?;
        monitor.start().await?;
        let result = f(monitor.clone()).await;
        monitor.shutdown().await;
        result
    }

    // ── Direct access ────────────────────────────────────────────────

    /// Refresh controller for callers that need an interactive
    /// confirmation or want to bypass the command queue.
    pub fn refresh(&self) -> &RefreshController {
        &self.inner.refresh
    }

    /// Read access to the registry. Mutation stays inside the engine.
    pub fn registry(&self) -> &Arc<DeviceRegistry> {
        &self.inner.registry
    }

    pub fn ledger(&self) -> &AlertLedger {
        &self.inner.ledger
    }

    /// Read access to the displayed counts.
    pub fn stats(&self) -> &Arc<StatsBoard> {
        &self.inner.stats
    }

    /// Apply a push frame as if it had arrived on the channel.
    pub fn dispatch_frame(&self, frame: ServerFrame) -> Dispatched {
        self.inner.connection.dispatcher().dispatch(frame)
    }

    pub fn auto_refresh(&self) -> bool {
        self.inner.connection.auto_refresh()
    }

    // ── Observation ──────────────────────────────────────────────────

    pub fn connection_state(&self) -> watch::Receiver<ConnectionState> {
        self.inner.connection.subscribe()
    }

    /// Per-mutation deltas.
    pub fn updates(&self) -> broadcast::Receiver<Update> {
        self.inner.updates.subscribe()
    }

    pub fn devices(&self) -> EntityStream<Device> {
        self.inner.registry.subscribe()
    }

    pub fn alerts(&self) -> EntityStream<Alert> {
        self.inner.ledger.subscribe()
    }

    pub fn stats_watch(&self) -> watch::Receiver<StatsSnapshot> {
        self.inner.stats.subscribe()
    }

    pub fn devices_snapshot(&self) -> Arc<Vec<Arc<Device>>> {
        self.inner.registry.snapshot()
    }

    pub fn alerts_snapshot(&self) -> Arc<Vec<Arc<Alert>>> {
        self.inner.ledger.snapshot()
    }

    pub fn stats_snapshot(&self) -> StatsSnapshot {
        self.inner.stats.current()
    }
}

// ── Background tasks ─────────────────────────────────────────────────

/// Periodically pull and replace the device list.
async fn refresh_task(monitor: Monitor, interval_secs: u64, cancel: CancellationToken) {
    let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));
    interval.tick().await; // consume the immediate first tick

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => {
                if let Err(e) = monitor.inner.refresh.pull_and_replace().await {
                    warn!(error = %e, "periodic refresh failed");
                }
            }
        }
    }
}

/// Process commands one at a time, in submission order.
async fn command_processor_task(
    monitor: Monitor,
    mut rx: mpsc::Receiver<CommandEnvelope>,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            envelope = rx.recv() => {
                let Some(envelope) = envelope else { break };
                let kind = envelope.command.kind();
                debug!(command = %kind, "executing command");
                let result = route_command(&monitor, envelope.command).await;
                let _ = envelope.response_tx.send(result);
            }
        }
    }
}

// ── Command routing ──────────────────────────────────────────────────

async fn route_command(monitor: &Monitor, cmd: Command) -> Result<CommandResult, CoreError> {
    let refresh = &monitor.inner.refresh;

    match cmd {
        Command::RefreshDevices => refresh.pull_and_replace().await.map(CommandResult::Refreshed),
        Command::AddDevice(fields) => refresh
            .create_device(fields)
            .await
            .map(|d| d.map_or(CommandResult::Ok, CommandResult::Device)),
        Command::ViewDevice { id } => refresh
            .fetch_device_detail(&id)
            .await
            .map(CommandResult::Device),
        Command::EditDevice { id, patch } => refresh
            .update_device(&id, patch)
            .await
            .map(|d| d.map_or(CommandResult::Ok, CommandResult::Device)),
        Command::TestDevice { id } => refresh.test_device(&id).await.map(CommandResult::Message),
        Command::DeleteDevice { id, confirmed } => {
            let answer = move |_: &str| confirmed;
            refresh.delete_device(&id, &answer).await?;
            Ok(CommandResult::Ok)
        }
        Command::DeviceMetrics { id, query } => refresh
            .device_metrics(&id, &query)
            .await
            .map(CommandResult::Metrics),
        Command::SetAutoRefresh { enabled } => {
            monitor.inner.connection.set_auto_refresh(enabled);
            Ok(CommandResult::Ok)
        }
    }
}

// ── Helpers ──────────────────────────────────────────────────────────

/// Build a [`TransportConfig`] from the monitor configuration.
fn build_transport(config: &MonitorConfig) -> TransportConfig {
    TransportConfig {
        tls: tls_to_transport(&config.tls),
        timeout: config.timeout,
    }
}

fn tls_to_transport(tls: &TlsVerification) -> TlsMode {
    match tls {
        TlsVerification::SystemDefaults => TlsMode::System,
        TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
        TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
    }
}
