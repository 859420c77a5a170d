// ── Engine-owned state ──
//
// Registry, ledger, and stats board. Each publishes immutable snapshots
// through `watch` channels and deltas through the shared update bus.

mod ledger;
mod registry;
mod stats_board;

pub use ledger::{ALERT_TTL, AlertLedger};
pub use registry::DeviceRegistry;
pub use stats_board::StatsBoard;
