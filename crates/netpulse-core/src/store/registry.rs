// ── Device registry ──
//
// Ordered, copy-on-write device storage. Readers load the current map
// without blocking; writers swap in a new one and publish a snapshot.

use std::sync::Arc;

use arc_swap::ArcSwap;
use indexmap::IndexMap;
use tokio::sync::{broadcast, watch};

use crate::model::{Device, DeviceId};
use crate::stream::EntityStream;
use crate::update::{self, Update};

type DeviceMap = IndexMap<DeviceId, Arc<Device>>;

/// Ordered key-value store of devices, keyed by id.
///
/// Order is the server's order from the last full replacement, with
/// previously unseen ids from `upsert` appended at the end.
///
/// Only the engine writes. Consumers get reads and subscriptions:
///
/// ```compile_fail
/// fn overwrite(monitor: &netpulse_core::Monitor) {
///     monitor.registry().replace_all(Vec::new());
/// }
/// ```
pub struct DeviceRegistry {
    devices: ArcSwap<DeviceMap>,
    snapshot: watch::Sender<Arc<Vec<Arc<Device>>>>,
    updates: broadcast::Sender<Update>,
}

impl DeviceRegistry {
    pub(crate) fn new(updates: broadcast::Sender<Update>) -> Self {
        let (snapshot, _) = watch::channel(Arc::new(Vec::new()));
        Self {
            devices: ArcSwap::from_pointee(IndexMap::new()),
            snapshot,
            updates,
        }
    }

    /// Discard everything and install `devices` in the given order.
    ///
    /// A repeated id keeps its first position and its last record.
    pub(crate) fn replace_all(&self, devices: impl IntoIterator<Item = Device>) {
        let next: DeviceMap = devices
            .into_iter()
            .map(|d| (d.id.clone(), Arc::new(d)))
            .collect();
        let count = next.len();

        self.devices.store(Arc::new(next));
        self.publish();
        tracing::debug!(count, "registry replaced");
        update::emit(&self.updates, Update::DevicesReplaced { count });
    }

    /// Replace the record with the same id in place, or append it.
    ///
    /// Returns `true` if the id was new.
    pub(crate) fn upsert(&self, device: Device) -> bool {
        let id = device.id.clone();
        let device = Arc::new(device);

        let previous = self.devices.rcu(|current| {
            let mut next = DeviceMap::clone(current);
            next.insert(id.clone(), Arc::clone(&device));
            next
        });
        let inserted = !previous.contains_key(&id);
        self.publish();

        if inserted {
            tracing::debug!(device_id = %id, "registry append");
            update::emit(&self.updates, Update::DeviceInserted { id });
        } else {
            tracing::debug!(device_id = %id, "registry update");
            update::emit(
                &self.updates,
                Update::DeviceUpdated {
                    id,
                    highlight: true,
                },
            );
        }
        inserted
    }

    pub fn get(&self, id: &DeviceId) -> Option<Arc<Device>> {
        self.devices.load().get(id).cloned()
    }

    /// First device with the given IP address.
    pub fn find_by_ip(&self, ip: &str) -> Option<Arc<Device>> {
        self.devices
            .load()
            .values()
            .find(|d| d.ip_address == ip)
            .cloned()
    }

    /// Read-only ordered snapshot (cheap `Arc` clone).
    pub fn snapshot(&self) -> Arc<Vec<Arc<Device>>> {
        self.snapshot.borrow().clone()
    }

    pub fn subscribe(&self) -> EntityStream<Device> {
        EntityStream::new(self.snapshot.subscribe())
    }

    pub fn len(&self) -> usize {
        self.devices.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.load().is_empty()
    }

    /// Rebuild the published snapshot from the current map. The load
    /// happens under the watch lock so concurrent writers publish in
    /// store order.
    fn publish(&self) {
        self.snapshot.send_modify(|snap| {
            *snap = Arc::new(self.devices.load().values().cloned().collect());
        });
    }
}
