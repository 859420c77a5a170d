// ── Change notifications ──
//
// Every engine mutation emits one `Update` on a broadcast channel after
// the new snapshot is visible. Observers use them to re-render only what
// changed; they can always fall back to the snapshot watches.

use tokio::sync::broadcast;

use crate::model::{AlertId, DeviceId, StatsSource};

const UPDATE_CHANNEL_SIZE: usize = 256;

/// Why an alert left the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum RemovalCause {
    /// Removed by the operator.
    Dismissed,
    /// TTL elapsed.
    Expired,
    /// Ledger cleared in bulk.
    Cleared,
}

/// A single observable mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Update {
    /// Registry contents replaced wholesale.
    DevicesReplaced { count: usize },
    /// An existing device changed in place. `highlight` asks the view to
    /// flash the row.
    DeviceUpdated { id: DeviceId, highlight: bool },
    /// A previously unseen device was appended.
    DeviceInserted { id: DeviceId },
    /// Displayed fleet counts changed.
    StatsChanged { source: StatsSource },
    AlertRaised { id: AlertId },
    AlertRemoved { id: AlertId, cause: RemovalCause },
}

/// Broadcast sender shared by the registry, ledger, and stats board.
pub(crate) fn channel() -> broadcast::Sender<Update> {
    broadcast::channel(UPDATE_CHANNEL_SIZE).0
}

/// Send, ignoring the no-receivers case.
pub(crate) fn emit(tx: &broadcast::Sender<Update>, update: Update) {
    let _ = tx.send(update);
}
