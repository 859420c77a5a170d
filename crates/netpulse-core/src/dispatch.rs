// ── Event dispatcher ──
//
// Routes decoded push frames to the registry, ledger, and stats board.
// Each frame is applied synchronously and completely before the next.

use std::sync::Arc;

use netpulse_api::ServerFrame;
use tracing::{debug, info};

use crate::model::{AlertId, AlertSpec, Device, FleetStats};
use crate::store::{AlertLedger, DeviceRegistry, StatsBoard};

/// What a frame did to engine state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatched {
    DevicesReplaced { count: usize },
    DeviceUpserted { inserted: bool },
    StatsReplaced,
    AlertCreated(AlertId),
    /// Accepted without any state change.
    Ignored,
}

pub struct EventDispatcher {
    registry: Arc<DeviceRegistry>,
    ledger: AlertLedger,
    stats: Arc<StatsBoard>,
}

impl EventDispatcher {
    pub(crate) fn new(registry: Arc<DeviceRegistry>, ledger: AlertLedger, stats: Arc<StatsBoard>) -> Self {
        Self {
            registry,
            ledger,
            stats,
        }
    }

    /// Apply one frame. Never fails: every variant has a handler.
    pub fn dispatch(&self, frame: ServerFrame) -> Dispatched {
        debug!(event = frame.event_name(), "dispatching frame");

        match frame {
            ServerFrame::DevicesUpdate(records) => {
                let count = records.len();
                self.registry
                    .replace_all(records.into_iter().map(Device::from));
                Dispatched::DevicesReplaced { count }
            }
            ServerFrame::DeviceUpdate(record) => {
                let inserted = self.registry.upsert(Device::from(record));
                Dispatched::DeviceUpserted { inserted }
            }
            ServerFrame::StatsUpdate(record) => {
                self.stats.publish_pushed(FleetStats::from(record));
                Dispatched::StatsReplaced
            }
            ServerFrame::Alert(record) => {
                Dispatched::AlertCreated(self.ledger.create(AlertSpec::from(record)))
            }
            ServerFrame::MetricsUpdate(metrics) => {
                // Reserved for live per-device charts.
                debug!(device_id = ?metrics.device_id, "metrics update received");
                Dispatched::Ignored
            }
            ServerFrame::Status(body) => {
                info!(message = %body.message, "server status");
                Dispatched::Ignored
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::model::{AlertSeverity, DeviceId, DeviceStatus, StatsSource};
    use crate::update;

    fn dispatcher() -> (EventDispatcher, Arc<DeviceRegistry>, AlertLedger, Arc<StatsBoard>) {
        let tx = update::channel();
        let registry = Arc::new(DeviceRegistry::new(tx.clone()));
        let ledger = AlertLedger::new(tx.clone());
        let stats = Arc::new(StatsBoard::new(tx));
        (
            EventDispatcher::new(Arc::clone(&registry), ledger.clone(), Arc::clone(&stats)),
            registry,
            ledger,
            stats,
        )
    }

    fn frame(text: &str) -> ServerFrame {
        netpulse_api::frames::decode(text).unwrap()
    }

    #[test]
    fn devices_update_replaces_registry_but_not_stats() {
        let (dispatcher, registry, _ledger, stats) = dispatcher();

        let outcome = dispatcher.dispatch(frame(
            r#"{"event":"devices_update","data":[{"id":1,"status":"online"},{"id":2,"status":"offline"}]}"#,
        ));

        assert_eq!(outcome, Dispatched::DevicesReplaced { count: 2 });
        let snap = registry.snapshot();
        assert_eq!(snap.len(), 2);
        assert_eq!(snap[0].id, DeviceId::Number(1));
        assert_eq!(snap[0].status, DeviceStatus::Online);
        assert_eq!(snap[1].status, DeviceStatus::Offline);
        assert_eq!(stats.current().source, StatsSource::Initial);
        assert_eq!(stats.current().stats, FleetStats::default());
    }

    #[test]
    fn device_update_touches_one_record() {
        let (dispatcher, registry, _ledger, _stats) = dispatcher();
        dispatcher.dispatch(frame(
            r#"{"event":"devices_update","data":[{"id":1,"status":"online"},{"id":2,"status":"online"}]}"#,
        ));
        let before = registry.snapshot();

        let outcome = dispatcher.dispatch(frame(
            r#"{"event":"device_update","data":{"id":2,"status":"warning","cpu_usage":97.0}}"#,
        ));

        assert_eq!(outcome, Dispatched::DeviceUpserted { inserted: false });
        let after = registry.snapshot();
        assert!(Arc::ptr_eq(&before[0], &after[0]));
        assert_eq!(after[1].status, DeviceStatus::Warning);
    }

    #[test]
    fn stats_update_is_taken_verbatim() {
        let (dispatcher, registry, _ledger, stats) = dispatcher();

        dispatcher.dispatch(frame(
            r#"{"event":"stats_update","data":{"total":40,"online":30,"offline":5,"warning":5}}"#,
        ));

        // Registry is empty; pushed counts are not checked against it.
        assert!(registry.is_empty());
        assert_eq!(stats.current().stats.total, 40);
        assert_eq!(stats.current().source, StatsSource::Pushed);
    }

    #[tokio::test]
    async fn alert_frame_creates_alert() {
        let (dispatcher, _registry, ledger, _stats) = dispatcher();

        let outcome = dispatcher.dispatch(frame(
            r#"{"event":"alert","data":{"type":"error","message":"Device core is offline","device":{"id":1,"name":"core","ip_address":"10.0.0.1"}}}"#,
        ));

        let Dispatched::AlertCreated(id) = outcome else {
            panic!("expected alert, got {outcome:?}");
        };
        let alert = ledger.get(id).unwrap();
        assert_eq!(alert.severity, AlertSeverity::Error);
        assert_eq!(alert.message, "Device core is offline");
        assert!(alert.dismissible);
    }

    #[test]
    fn metrics_and_status_are_accepted_without_effect() {
        let (dispatcher, registry, ledger, stats) = dispatcher();

        assert_eq!(
            dispatcher.dispatch(frame(
                r#"{"event":"metrics_update","data":{"device_id":1,"metrics":{"cpu":3},"junk":[1]}}"#
            )),
            Dispatched::Ignored
        );
        assert_eq!(
            dispatcher.dispatch(frame(r#"{"event":"status","data":{"message":"joined"}}"#)),
            Dispatched::Ignored
        );
        assert!(registry.is_empty());
        assert!(ledger.is_empty());
        assert_eq!(stats.current().source, StatsSource::Initial);
    }
}
