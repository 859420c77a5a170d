// ── Displayed fleet counts ──

use chrono::Utc;
use tokio::sync::{broadcast, watch};

use crate::model::{FleetStats, StatsSnapshot, StatsSource};
use crate::update::{self, Update};

/// Holds the counts currently shown to the operator.
///
/// Two writers: pushed `stats_update` frames (verbatim) and the refresh
/// controller (derived from the registry). No consistency with the
/// registry is enforced between the two. Neither is reachable from
/// outside the engine:
///
/// ```compile_fail
/// fn overwrite(monitor: &netpulse_core::Monitor) {
///     monitor.stats().publish_derived(netpulse_core::FleetStats::default());
/// }
/// ```
pub struct StatsBoard {
    current: watch::Sender<StatsSnapshot>,
    updates: broadcast::Sender<Update>,
}

impl StatsBoard {
    pub(crate) fn new(updates: broadcast::Sender<Update>) -> Self {
        let (current, _) = watch::channel(StatsSnapshot::initial());
        Self { current, updates }
    }

    /// Overwrite with server-provided counts.
    pub(crate) fn publish_pushed(&self, stats: FleetStats) {
        self.publish(stats, StatsSource::Pushed);
    }

    /// Overwrite with counts recomputed from the registry.
    pub(crate) fn publish_derived(&self, stats: FleetStats) {
        self.publish(stats, StatsSource::Derived);
    }

    pub fn current(&self) -> StatsSnapshot {
        *self.current.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<StatsSnapshot> {
        self.current.subscribe()
    }

    fn publish(&self, stats: FleetStats, source: StatsSource) {
        self.current.send_replace(StatsSnapshot {
            stats,
            source,
            updated_at: Utc::now(),
        });
        tracing::debug!(
            total = stats.total,
            online = stats.online,
            offline = stats.offline,
            warning = stats.warning,
            %source,
            "stats published"
        );
        update::emit(&self.updates, Update::StatsChanged { source });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_empty_and_records_source() {
        let board = StatsBoard::new(update::channel());
        assert_eq!(board.current().source, StatsSource::Initial);

        let pushed = FleetStats {
            total: 10,
            online: 7,
            offline: 2,
            warning: 1,
        };
        board.publish_pushed(pushed);
        assert_eq!(board.current().stats, pushed);
        assert_eq!(board.current().source, StatsSource::Pushed);

        board.publish_derived(FleetStats::default());
        assert_eq!(board.current().source, StatsSource::Derived);
        assert_eq!(board.current().stats.total, 0);
    }
}
