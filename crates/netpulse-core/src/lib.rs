//! Reconciliation engine between `netpulse-api` and dashboard consumers.
//!
//! This crate owns the client-side state of the netpulse monitoring
//! dashboard and the rules for merging server pushes with client pulls:
//!
//! - **[`Monitor`]**: the engine object. Construct once and pass it by
//!   reference. [`start()`](Monitor::start) opens the push channel and
//!   spawns the command processor; [`Monitor::oneshot()`] runs a single
//!   request cycle for CLI use.
//!
//! - **Stores** ([`DeviceRegistry`], [`AlertLedger`], [`StatsBoard`]):
//!   copy-on-write state published as immutable snapshots through `watch`
//!   channels, plus per-mutation [`Update`] deltas on a broadcast bus.
//!
//! - **[`EventDispatcher`]**: routes each decoded push frame to exactly one
//!   handler, in arrival order.
//!
//! - **[`RefreshController`]**: full pull-and-replace and the device CRUD
//!   gateway. Every failure becomes an [`Alert`] before it is returned.
//!
//! - **[`ConnectionManager`]**: join/leave subscription management and the
//!   connection-lost warning.
//!
//! - **[`Command`]**: the operator action table, routed through an `mpsc`
//!   channel to the monitor's command processor.

pub mod command;
pub mod config;
pub mod connection;
pub mod convert;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod model;
pub mod refresh;
pub mod store;
pub mod stream;
pub mod update;

// ── Primary re-exports ──────────────────────────────────────────────
pub use command::requests::*;
pub use command::{Command, CommandKind, CommandResult};
pub use config::{DEFAULT_HOST, MonitorConfig, ReconnectPolicy, TlsVerification};
pub use connection::{ConnectionManager, ConnectionState, SignalSink};
pub use dispatch::{Dispatched, EventDispatcher};
pub use engine::Monitor;
pub use error::CoreError;
pub use refresh::{AssumeYes, Confirmation, DELETE_PROMPT, RefreshController};
pub use store::{ALERT_TTL, AlertLedger, DeviceRegistry, StatsBoard};
pub use stream::{EntityStream, SnapshotStream};
pub use update::{RemovalCause, Update};

// Re-export model types at the crate root for ergonomics.
pub use model::{
    Alert, AlertId, AlertSeverity, AlertSpec, Device, DeviceId, DeviceRef, DeviceStatus,
    FleetStats, MetricPoint, MetricsQuery, StatsSnapshot, StatsSource, compute_stats,
};
