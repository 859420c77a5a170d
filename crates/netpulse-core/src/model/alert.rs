// ── Alert domain types ──

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use super::device::{Device, DeviceId};

/// Locally generated alert identifier.
///
/// Creation time in epoch milliseconds plus a per-ledger sequence number,
/// so two alerts raised in the same millisecond still differ.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AlertId {
    pub millis: i64,
    pub seq: u64,
}

impl AlertId {
    pub fn new(millis: i64, seq: u64) -> Self {
        Self { millis, seq }
    }
}

impl fmt::Display for AlertId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.millis, self.seq)
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum AlertSeverity {
    #[default]
    Info,
    Warning,
    Success,
    Error,
}

/// Snapshot of a device's identifying fields, taken when an alert is
/// raised. Not a live link: the device may change or vanish afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceRef {
    pub id: Option<DeviceId>,
    pub name: String,
    pub ip_address: String,
}

impl From<&Device> for DeviceRef {
    fn from(device: &Device) -> Self {
        Self {
            id: Some(device.id.clone()),
            name: device.name.clone(),
            ip_address: device.ip_address.clone(),
        }
    }
}

/// An operator-facing notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alert {
    pub id: AlertId,
    pub severity: AlertSeverity,
    pub message: String,
    /// Dismissible alerts expire on their own after the ledger TTL.
    pub dismissible: bool,
    pub device: Option<DeviceRef>,
    pub created_at: DateTime<Utc>,
}

/// Everything needed to raise an alert; the ledger fills in id and time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertSpec {
    pub severity: AlertSeverity,
    pub message: String,
    pub dismissible: bool,
    pub device: Option<DeviceRef>,
}

impl AlertSpec {
    pub fn new(severity: AlertSeverity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
            dismissible: true,
            device: None,
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(AlertSeverity::Info, message)
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(AlertSeverity::Success, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(AlertSeverity::Warning, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(AlertSeverity::Error, message)
    }

    /// Never expires; stays until dismissed.
    pub fn persistent(mut self) -> Self {
        self.dismissible = false;
        self
    }

    pub fn with_device(mut self, device: DeviceRef) -> Self {
        self.device = Some(device);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DeviceStatus;

    #[test]
    fn alert_ids_order_by_time_then_sequence() {
        let a = AlertId::new(1_000, 0);
        let b = AlertId::new(1_000, 1);
        let c = AlertId::new(1_001, 0);
        assert!(a < b && b < c);
        assert_eq!(b.to_string(), "1000-1");
    }

    #[test]
    fn spec_builders() {
        let spec = AlertSpec::warning("link lost").persistent();
        assert_eq!(spec.severity, AlertSeverity::Warning);
        assert!(!spec.dismissible);
        assert!(AlertSpec::info("hello").dismissible);
    }

    #[test]
    fn device_ref_snapshots_identity() {
        let mut device = Device::new(9_i64, DeviceStatus::Online);
        device.name = "edge".into();
        device.ip_address = "10.0.0.9".into();

        let snapshot = DeviceRef::from(&device);
        device.name = "renamed".into();

        assert_eq!(snapshot.name, "edge");
        assert_eq!(snapshot.id, Some(DeviceId::Number(9)));
    }
}
