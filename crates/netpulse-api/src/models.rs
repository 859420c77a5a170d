// Wire types for the monitoring server
//
// These mirror the JSON the server sends and accepts, field for field.
// Every optional field is `#[serde(default)]` so partially populated
// records (push frames often are) still deserialize.

use std::fmt;

use serde::{Deserialize, Serialize};

// ── Identifiers ──────────────────────────────────────────────────────

/// Device identifier as it appears on the wire: integer or string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WireId {
    Number(i64),
    Text(String),
}

impl fmt::Display for WireId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => write!(f, "{s}"),
        }
    }
}

// ── Devices ──────────────────────────────────────────────────────────

/// Device record, as returned by `GET /devices` and pushed in
/// `devices_update` / `device_update` frames.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceRecord {
    pub id: WireId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub ip_address: String,
    #[serde(default)]
    pub device_type: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub cpu_usage: Option<f64>,
    #[serde(default)]
    pub memory_usage: Option<f64>,
    /// Centiseconds since last boot (SNMP `sysUpTime`).
    #[serde(default)]
    pub uptime: Option<u64>,
    #[serde(default)]
    pub last_seen: Option<String>,
    #[serde(default)]
    pub snmp_community: Option<String>,
    #[serde(default)]
    pub snmp_version: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// Body of `POST /devices`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateDeviceRequest {
    pub name: String,
    pub ip_address: String,
    pub device_type: String,
    pub snmp_community: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snmp_version: Option<String>,
}

/// Body of `PUT /devices/{id}`. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateDeviceRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snmp_community: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snmp_version: Option<String>,
}

impl UpdateDeviceRequest {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.ip_address.is_none()
            && self.device_type.is_none()
            && self.snmp_community.is_none()
            && self.snmp_version.is_none()
    }
}

/// One historical sample from `GET /devices/{id}/metrics`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSample {
    pub id: i64,
    pub device_id: WireId,
    pub metric_type: String,
    pub value: f64,
    #[serde(default)]
    pub unit: Option<String>,
    pub timestamp: String,
}

// ── Aggregates ───────────────────────────────────────────────────────

/// Fleet-wide counts pushed in `stats_update` frames.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsRecord {
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub online: u64,
    #[serde(default)]
    pub offline: u64,
    #[serde(default)]
    pub warning: u64,
}

// ── Alerts ───────────────────────────────────────────────────────────

/// Device snapshot embedded in an `alert` frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertDeviceRecord {
    #[serde(default)]
    pub id: Option<WireId>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub ip_address: String,
}

/// Payload of an `alert` frame.
///
/// Older servers name the severity `type`; both spellings are accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertRecord {
    #[serde(alias = "type")]
    pub severity: String,
    pub message: String,
    #[serde(default)]
    pub dismissible: Option<bool>,
    #[serde(default)]
    pub device: Option<AlertDeviceRecord>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

// ── Misc payloads ────────────────────────────────────────────────────

/// Payload of a `metrics_update` frame. The metrics shape is not
/// fixed, so it is kept as raw JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsRecord {
    #[serde(default)]
    pub device_id: Option<WireId>,
    #[serde(default)]
    pub metrics: serde_json::Value,
}

/// `{ "message": ... }` success body, also used for `status` frames.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageBody {
    #[serde(default)]
    pub message: String,
}

/// Acknowledgement of a `POST`/`PUT` on `/devices`.
///
/// Servers answer a write with `{message}`, the stored record, or nothing
/// at all. Any 2xx body is accepted; whatever parses is kept.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteAck {
    pub message: Option<String>,
    pub device: Option<DeviceRecord>,
}

impl WriteAck {
    pub fn from_body(body: &str) -> Self {
        let Ok(value) = serde_json::from_str::<serde_json::Value>(body) else {
            return Self::default();
        };
        let message = value
            .get("message")
            .and_then(serde_json::Value::as_str)
            .map(str::to_owned);
        let device = serde_json::from_value::<DeviceRecord>(value).ok();
        Self { message, device }
    }
}

/// Result of `POST /devices/{id}/test`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceTestResult {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub message: String,
    /// `sysName` reported over SNMP, when the probe got that far.
    #[serde(default)]
    pub system_name: Option<String>,
}

/// `{ "error": ... }` failure body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub error: Option<String>,
}
