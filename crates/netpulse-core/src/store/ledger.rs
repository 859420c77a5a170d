// ── Alert ledger ──
//
// Most-recent-first list of alerts. Dismissible alerts carry an expiry
// timer; removing an alert by any path cancels its timer so it can never
// fire twice.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use arc_swap::ArcSwap;
use chrono::Utc;
use dashmap::DashMap;
use tokio::sync::{broadcast, watch};
use tokio_util::sync::CancellationToken;

use crate::model::{Alert, AlertId, AlertSpec};
use crate::stream::EntityStream;
use crate::update::{self, RemovalCause, Update};

/// Lifetime of a dismissible alert, measured from creation.
pub const ALERT_TTL: Duration = Duration::from_millis(5000);

/// Ephemeral notification list with independent per-alert lifecycles.
///
/// Cheap to clone; clones share state.
#[derive(Clone)]
pub struct AlertLedger {
    inner: Arc<LedgerInner>,
}

struct LedgerInner {
    alerts: ArcSwap<Vec<Arc<Alert>>>,
    timers: DashMap<AlertId, CancellationToken>,
    seq: AtomicU64,
    snapshot: watch::Sender<Arc<Vec<Arc<Alert>>>>,
    updates: broadcast::Sender<Update>,
    /// Parent of every expiry timer.
    cancel: CancellationToken,
}

impl AlertLedger {
    pub(crate) fn new(updates: broadcast::Sender<Update>) -> Self {
        let (snapshot, _) = watch::channel(Arc::new(Vec::new()));
        Self {
            inner: Arc::new(LedgerInner {
                alerts: ArcSwap::from_pointee(Vec::new()),
                timers: DashMap::new(),
                seq: AtomicU64::new(0),
                snapshot,
                updates,
                cancel: CancellationToken::new(),
            }),
        }
    }

    /// Insert a new alert at the front. Never merges with existing ones.
    ///
    /// Dismissible alerts are removed after [`ALERT_TTL`] unless dismissed
    /// first. Must be called from within a Tokio runtime for the timer.
    pub fn create(&self, spec: AlertSpec) -> AlertId {
        let created_at = Utc::now();
        let id = AlertId::new(
            created_at.timestamp_millis(),
            self.inner.seq.fetch_add(1, Ordering::Relaxed),
        );
        let alert = Arc::new(Alert {
            id,
            severity: spec.severity,
            message: spec.message,
            dismissible: spec.dismissible,
            device: spec.device,
            created_at,
        });

        // Timer first: a racing dismiss must find the token to cancel.
        if alert.dismissible {
            self.schedule_expiry(id);
        }

        self.inner.alerts.rcu(|current| {
            let mut next = Vec::with_capacity(current.len() + 1);
            next.push(Arc::clone(&alert));
            next.extend(current.iter().cloned());
            next
        });
        self.publish();

        tracing::debug!(
            alert_id = %id,
            severity = %alert.severity,
            dismissible = alert.dismissible,
            message = %alert.message,
            "alert raised"
        );
        update::emit(&self.inner.updates, Update::AlertRaised { id });
        id
    }

    /// Remove an alert. Unknown or already-removed ids are a no-op.
    ///
    /// Returns `true` if something was removed.
    pub fn dismiss(&self, id: AlertId) -> bool {
        self.remove(id, RemovalCause::Dismissed)
    }

    /// Remove every alert and cancel every pending timer.
    pub fn clear(&self) {
        let previous = self.inner.alerts.swap(Arc::new(Vec::new()));
        for entry in self.inner.timers.iter() {
            entry.value().cancel();
        }
        self.inner.timers.clear();
        self.publish();

        for alert in previous.iter() {
            update::emit(
                &self.inner.updates,
                Update::AlertRemoved {
                    id: alert.id,
                    cause: RemovalCause::Cleared,
                },
            );
        }
    }

    pub fn get(&self, id: AlertId) -> Option<Arc<Alert>> {
        self.inner
            .alerts
            .load()
            .iter()
            .find(|a| a.id == id)
            .cloned()
    }

    /// Read-only snapshot, most recent first.
    pub fn snapshot(&self) -> Arc<Vec<Arc<Alert>>> {
        self.inner.snapshot.borrow().clone()
    }

    pub fn subscribe(&self) -> EntityStream<Alert> {
        EntityStream::new(self.inner.snapshot.subscribe())
    }

    pub fn len(&self) -> usize {
        self.inner.alerts.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.alerts.load().is_empty()
    }

    /// Stop all pending expiry timers without removing anything.
    pub(crate) fn shutdown(&self) {
        self.inner.cancel.cancel();
    }

    // ── Private helpers ──────────────────────────────────────────────

    fn remove(&self, id: AlertId, cause: RemovalCause) -> bool {
        let previous = self.inner.alerts.rcu(|current| {
            current
                .iter()
                .filter(|a| a.id != id)
                .cloned()
                .collect::<Vec<_>>()
        });
        let removed = previous.iter().any(|a| a.id == id);

        if let Some((_, token)) = self.inner.timers.remove(&id) {
            token.cancel();
        }
        if !removed {
            return false;
        }

        self.publish();
        tracing::debug!(alert_id = %id, %cause, "alert removed");
        update::emit(&self.inner.updates, Update::AlertRemoved { id, cause });
        true
    }

    fn schedule_expiry(&self, id: AlertId) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::warn!(alert_id = %id, "no runtime, alert will not expire");
            return;
        };

        let token = self.inner.cancel.child_token();
        self.inner.timers.insert(id, token.clone());

        let deadline = tokio::time::Instant::now() + ALERT_TTL;
        let ledger: Weak<LedgerInner> = Arc::downgrade(&self.inner);

        runtime.spawn(async move {
            tokio::select! {
                biased;
                () = token.cancelled() => {}
                () = tokio::time::sleep_until(deadline) => {
                    if let Some(inner) = ledger.upgrade() {
                        AlertLedger { inner }.remove(id, RemovalCause::Expired);
                    }
                }
            }
        });
    }

    fn publish(&self) {
        self.inner.snapshot.send_modify(|snap| {
            *snap = self.inner.alerts.load_full();
        });
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::{AlertSeverity, DeviceId, DeviceRef};

    fn ledger() -> (AlertLedger, broadcast::Receiver<Update>) {
        let tx = update::channel();
        let rx = tx.subscribe();
        (AlertLedger::new(tx), rx)
    }

    #[tokio::test(start_paused = true)]
    async fn dismissible_alert_expires_after_ttl() {
        let (ledger, _rx) = ledger();
        let id = ledger.create(AlertSpec::info("saved"));

        tokio::time::sleep(Duration::from_millis(4999)).await;
        assert!(ledger.get(id).is_some(), "must survive until the TTL");

        tokio::time::sleep(Duration::from_millis(2)).await;
        assert!(ledger.get(id).is_none(), "must be gone at T+5001ms");
    }

    #[tokio::test(start_paused = true)]
    async fn persistent_alert_never_expires() {
        let (ledger, _rx) = ledger();
        let id = ledger.create(AlertSpec::warning("connection lost").persistent());

        tokio::time::sleep(Duration::from_secs(3600)).await;
        assert!(ledger.get(id).is_some());

        assert!(ledger.dismiss(id));
        assert!(ledger.get(id).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn dismiss_cancels_expiry_and_is_idempotent() {
        let (ledger, mut rx) = ledger();
        let id = ledger.create(AlertSpec::error("boom"));
        assert_eq!(rx.try_recv().unwrap(), Update::AlertRaised { id });

        assert!(ledger.dismiss(id));
        assert!(ledger.get(id).is_none());
        assert!(!ledger.dismiss(id));

        tokio::time::sleep(ALERT_TTL * 2).await;
        assert_eq!(
            rx.try_recv().unwrap(),
            Update::AlertRemoved {
                id,
                cause: RemovalCause::Dismissed
            }
        );
        // The cancelled timer did not fire a second removal.
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn expiry_reports_expired_cause() {
        let (ledger, mut rx) = ledger();
        let id = ledger.create(AlertSpec::success("ok"));
        let _ = rx.try_recv();

        tokio::time::sleep(ALERT_TTL + Duration::from_millis(1)).await;
        assert_eq!(
            rx.try_recv().unwrap(),
            Update::AlertRemoved {
                id,
                cause: RemovalCause::Expired
            }
        );
    }

    #[tokio::test]
    async fn newest_alert_comes_first_and_nothing_merges() {
        let (ledger, _rx) = ledger();
        let first = ledger.create(AlertSpec::info("same"));
        let second = ledger.create(AlertSpec::info("same"));

        assert_ne!(first, second);
        let snap = ledger.snapshot();
        assert_eq!(snap.len(), 2);
        assert_eq!(snap[0].id, second);
        assert_eq!(snap[1].id, first);
    }

    #[tokio::test]
    async fn device_snapshot_travels_with_alert() {
        let (ledger, _rx) = ledger();
        let id = ledger.create(
            AlertSpec::new(AlertSeverity::Error, "Device down").with_device(DeviceRef {
                id: Some(DeviceId::Number(5)),
                name: "sw-5".into(),
                ip_address: "10.0.0.5".into(),
            }),
        );
        let alert = ledger.get(id).unwrap();
        assert_eq!(alert.device.as_ref().unwrap().name, "sw-5");
        assert_eq!(alert.severity, AlertSeverity::Error);
    }

    #[tokio::test(start_paused = true)]
    async fn clear_removes_everything_and_stops_timers() {
        let (ledger, _rx) = ledger();
        ledger.create(AlertSpec::info("a"));
        ledger.create(AlertSpec::warning("b").persistent());
        ledger.clear();

        assert!(ledger.is_empty());
        assert!(ledger.inner.timers.is_empty());
        tokio::time::sleep(ALERT_TTL * 2).await;
        assert!(ledger.is_empty());
    }
}
