// ── Refresh controller ──
//
// Pull-based full replacement plus the device CRUD gateway. Every failure
// is recorded as an Alert before the error is returned, so callers never
// raise alerts themselves.

use std::sync::Arc;

use netpulse_api::DashboardClient;
use netpulse_api::models::{CreateDeviceRequest, UpdateDeviceRequest, WireId};
use tracing::{debug, info, warn};

use crate::command::{DevicePatch, NewDevice};
use crate::error::CoreError;
use crate::model::{
    AlertSpec, DEFAULT_SNMP_COMMUNITY, Device, DeviceId, FleetStats, MetricPoint, MetricsQuery,
    compute_stats,
};
use crate::store::{AlertLedger, DeviceRegistry, StatsBoard};

// ── Alert texts ──────────────────────────────────────────────────────

pub const MSG_CONNECTION_ERROR: &str = "Connection error: server unreachable";
pub const MSG_REFRESH_FAILED: &str = "Failed to refresh devices";
pub const MSG_ADD_FAILED: &str = "Failed to add device";
pub const MSG_UPDATE_FAILED: &str = "Failed to update device";
pub const MSG_DELETE_FAILED: &str = "Failed to delete device";
pub const MSG_TEST_FAILED: &str = "Device test failed";
pub const MSG_DETAIL_FAILED: &str = "Failed to load device details";
pub const MSG_METRICS_FAILED: &str = "Failed to load device metrics";
pub const MSG_DELETED: &str = "Device deleted successfully";

/// Prompt shown before a delete.
pub const DELETE_PROMPT: &str = "Are you sure you want to delete this device?";

// ── Confirmation ─────────────────────────────────────────────────────

/// Interactive yes/no gate for destructive operations.
pub trait Confirmation: Send + Sync {
    fn confirm(&self, prompt: &str) -> bool;
}

impl<F> Confirmation for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn confirm(&self, prompt: &str) -> bool {
        self(prompt)
    }
}

/// Confirms everything (for `--yes` and scripted use).
#[derive(Debug, Clone, Copy, Default)]
pub struct AssumeYes;

impl Confirmation for AssumeYes {
    fn confirm(&self, _prompt: &str) -> bool {
        true
    }
}

// ── RefreshController ────────────────────────────────────────────────

/// Failure handling for one operation.
#[derive(Clone, Copy)]
enum FailureText {
    /// Always show the generic text.
    Generic(&'static str),
    /// Prefer the server's error message, else the fallback.
    ServerOr(&'static str),
}

#[derive(Clone)]
pub struct RefreshController {
    client: DashboardClient,
    registry: Arc<DeviceRegistry>,
    ledger: AlertLedger,
    stats: Arc<StatsBoard>,
}

impl RefreshController {
    pub(crate) fn new(
        client: DashboardClient,
        registry: Arc<DeviceRegistry>,
        ledger: AlertLedger,
        stats: Arc<StatsBoard>,
    ) -> Self {
        Self {
            client,
            registry,
            ledger,
            stats,
        }
    }

    /// Fetch the full device list, replace the registry with it, and
    /// publish counts recomputed from the new contents.
    ///
    /// On failure nothing is mutated and an error alert is raised.
    pub async fn pull_and_replace(&self) -> Result<FleetStats, CoreError> {
        let records = self
            .client
            .list_devices()
            .await
            .map_err(|e| self.fail(e, FailureText::Generic(MSG_REFRESH_FAILED)))?;

        self.registry
            .replace_all(records.into_iter().map(Device::from));
        let stats = compute_stats(&self.registry.snapshot());
        self.stats.publish_derived(stats);

        info!(total = stats.total, "devices refreshed");
        Ok(stats)
    }

    /// Register a device, then refresh.
    ///
    /// Any 2xx reply is success. Returns the new device when the server
    /// echoed it or the refreshed registry holds its IP address.
    pub async fn create_device(&self, fields: NewDevice) -> Result<Option<Device>, CoreError> {
        let body = CreateDeviceRequest {
            name: fields.name,
            ip_address: fields.ip_address,
            device_type: fields.device_type,
            snmp_community: fields
                .snmp_community
                .unwrap_or_else(|| DEFAULT_SNMP_COMMUNITY.to_owned()),
            snmp_version: fields.snmp_version,
        };

        let ack = self
            .client
            .create_device(&body)
            .await
            .map_err(|e| self.fail(e, FailureText::ServerOr(MSG_ADD_FAILED)))?;
        debug!(reply = ?ack.message, "device created");

        self.ledger.create(AlertSpec::success(format!(
            "Device {} added successfully",
            body.name
        )));
        self.refresh_after_write().await;

        Ok(ack.device.map(Device::from).or_else(|| {
            self.registry
                .find_by_ip(&body.ip_address)
                .map(|d| Device::clone(&d))
        }))
    }

    /// Change an existing device, then refresh.
    ///
    /// Any 2xx reply is success. Returns the device as echoed by the
    /// server, else as found in the refreshed registry.
    pub async fn update_device(
        &self,
        id: &DeviceId,
        patch: DevicePatch,
    ) -> Result<Option<Device>, CoreError> {
        if patch.is_empty() {
            return Err(CoreError::ValidationFailed {
                message: "no fields to update".into(),
            });
        }

        let previous = self.registry.get(id);
        let body = UpdateDeviceRequest {
            name: patch.name,
            ip_address: patch.ip_address,
            device_type: patch.device_type,
            snmp_community: patch.snmp_community,
            snmp_version: patch.snmp_version,
        };

        let ack = self
            .client
            .update_device(&WireId::from(id), &body)
            .await
            .map_err(|e| {
                self.fail(e, FailureText::ServerOr(MSG_UPDATE_FAILED))
                    .for_device(id)
            })?;

        let echoed = ack.device.map(Device::from);
        let name = [
            echoed.as_ref().map(|d| d.label().to_owned()),
            body.name.clone(),
            previous.map(|d| d.label().to_owned()),
        ]
        .into_iter()
        .flatten()
        .find(|n| !n.is_empty())
        .unwrap_or_else(|| id.to_string());
        self.ledger
            .create(AlertSpec::success(format!("Device {name} updated")));
        self.refresh_after_write().await;

        Ok(echoed.or_else(|| self.registry.get(id).map(|d| Device::clone(&d))))
    }

    /// Delete a device after confirmation, then refresh.
    ///
    /// A declined prompt returns [`CoreError::Cancelled`] without any
    /// request or alert.
    pub async fn delete_device(
        &self,
        id: &DeviceId,
        confirmation: &dyn Confirmation,
    ) -> Result<(), CoreError> {
        if !confirmation.confirm(DELETE_PROMPT) {
            debug!(device_id = %id, "delete declined");
            return Err(CoreError::Cancelled);
        }

        self.client
            .delete_device(&WireId::from(id))
            .await
            .map_err(|e| {
                self.fail(e, FailureText::ServerOr(MSG_DELETE_FAILED))
                    .for_device(id)
            })?;

        self.ledger.create(AlertSpec::success(MSG_DELETED));
        self.refresh_after_write().await;
        Ok(())
    }

    /// Ask the server to probe a device. Returns the server's message,
    /// which is also raised verbatim as a success alert. Registry is
    /// not touched.
    pub async fn test_device(&self, id: &DeviceId) -> Result<String, CoreError> {
        let result = self
            .client
            .test_device(&WireId::from(id))
            .await
            .map_err(|e| {
                self.fail(e, FailureText::ServerOr(MSG_TEST_FAILED))
                    .for_device(id)
            })?;

        self.ledger.create(AlertSpec::success(result.message.clone()));
        Ok(result.message)
    }

    /// Read-only detail query. Does not touch the registry.
    pub async fn fetch_device_detail(&self, id: &DeviceId) -> Result<Device, CoreError> {
        let record = self
            .client
            .get_device(&WireId::from(id))
            .await
            .map_err(|e| {
                self.fail(e, FailureText::ServerOr(MSG_DETAIL_FAILED))
                    .for_device(id)
            })?;
        Ok(Device::from(record))
    }

    /// Historical samples for one device. Read-only.
    pub async fn device_metrics(
        &self,
        id: &DeviceId,
        query: &MetricsQuery,
    ) -> Result<Vec<MetricPoint>, CoreError> {
        let samples = self
            .client
            .device_metrics(&WireId::from(id), query.hours, query.metric_type.as_deref())
            .await
            .map_err(|e| {
                self.fail(e, FailureText::ServerOr(MSG_METRICS_FAILED))
                    .for_device(id)
            })?;
        Ok(samples.into_iter().map(MetricPoint::from).collect())
    }

    // ── Private helpers ──────────────────────────────────────────────

    /// A follow-up refresh reports its own failure; the write succeeded.
    async fn refresh_after_write(&self) {
        if let Err(e) = self.pull_and_replace().await {
            debug!(error = %e, "refresh after write failed");
        }
    }

    /// Raise the alert for a failed request and convert the error.
    fn fail(&self, err: netpulse_api::Error, text: FailureText) -> CoreError {
        let message = if err.is_transport() {
            MSG_CONNECTION_ERROR
        } else {
            match text {
                FailureText::Generic(generic) => generic,
                FailureText::ServerOr(fallback) => err.server_message().unwrap_or(fallback),
            }
        };
        warn!(error = %err, alert = message, "request failed");
        self.ledger.create(AlertSpec::error(message));
        CoreError::from(err)
    }
}
