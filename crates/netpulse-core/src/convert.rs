// ── Wire-to-domain conversions ──
//
// Bridges raw `netpulse_api` records into `netpulse_core::model` types.
// Each `From` impl parses strings into strong types and fills defaults
// for missing optional data.

use chrono::{DateTime, NaiveDateTime, Utc};

use netpulse_api::models::{
    AlertDeviceRecord, AlertRecord, DeviceRecord, MetricSample, StatsRecord, WireId,
};

use crate::model::{
    AlertSeverity, AlertSpec, DEFAULT_SNMP_COMMUNITY, DEFAULT_SNMP_VERSION, Device, DeviceId,
    DeviceRef, DeviceStatus, FleetStats, MetricPoint,
};

// ── Helpers ────────────────────────────────────────────────────────

/// Parse an RFC 3339 timestamp, or a naive ISO-8601 one taken as UTC
/// (the server's `datetime.isoformat()` output carries no offset).
pub(crate) fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

fn parse_opt_timestamp(raw: Option<&String>) -> Option<DateTime<Utc>> {
    raw.and_then(|s| parse_timestamp(s))
}

fn non_empty_or(raw: Option<String>, default: &str) -> String {
    raw.filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| default.to_owned())
}

// ── Identifiers ────────────────────────────────────────────────────

impl From<WireId> for DeviceId {
    fn from(id: WireId) -> Self {
        match id {
            WireId::Number(n) => Self::Number(n),
            WireId::Text(s) => Self::Text(s),
        }
    }
}

impl From<&DeviceId> for WireId {
    fn from(id: &DeviceId) -> Self {
        match id {
            DeviceId::Number(n) => Self::Number(*n),
            DeviceId::Text(s) => Self::Text(s.clone()),
        }
    }
}

// ── Devices ────────────────────────────────────────────────────────

impl From<DeviceRecord> for Device {
    fn from(r: DeviceRecord) -> Self {
        Self {
            id: r.id.into(),
            status: DeviceStatus::from_wire(r.status.as_deref()),
            last_seen: parse_opt_timestamp(r.last_seen.as_ref()),
            created_at: parse_opt_timestamp(r.created_at.as_ref()),
            updated_at: parse_opt_timestamp(r.updated_at.as_ref()),
            name: r.name,
            ip_address: r.ip_address,
            device_type: r.device_type,
            cpu_usage: r.cpu_usage,
            memory_usage: r.memory_usage,
            uptime_centis: r.uptime,
            snmp_community: non_empty_or(r.snmp_community, DEFAULT_SNMP_COMMUNITY),
            snmp_version: non_empty_or(r.snmp_version, DEFAULT_SNMP_VERSION),
        }
    }
}

// ── Stats ──────────────────────────────────────────────────────────

impl From<StatsRecord> for FleetStats {
    fn from(r: StatsRecord) -> Self {
        Self {
            total: r.total,
            online: r.online,
            offline: r.offline,
            warning: r.warning,
        }
    }
}

// ── Alerts ─────────────────────────────────────────────────────────

impl From<AlertDeviceRecord> for DeviceRef {
    fn from(r: AlertDeviceRecord) -> Self {
        Self {
            id: r.id.map(DeviceId::from),
            name: r.name,
            ip_address: r.ip_address,
        }
    }
}

impl From<AlertRecord> for AlertSpec {
    fn from(r: AlertRecord) -> Self {
        let severity = r.severity.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(severity = %r.severity, "unknown alert severity, using info");
            AlertSeverity::Info
        });
        Self {
            severity,
            message: r.message,
            dismissible: r.dismissible.unwrap_or(true),
            device: r.device.map(DeviceRef::from),
        }
    }
}

// ── Metrics ────────────────────────────────────────────────────────

impl From<MetricSample> for MetricPoint {
    fn from(s: MetricSample) -> Self {
        Self {
            timestamp: parse_timestamp(&s.timestamp),
            metric_type: s.metric_type,
            value: s.value,
            unit: s.unit,
        }
    }
}
