// ── Device domain types ──

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

// ── DeviceId ────────────────────────────────────────────────────────

/// Device identifier: the server hands out integers, but any string is
/// accepted so foreign ids round-trip untouched.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DeviceId {
    Number(i64),
    Text(String),
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => write!(f, "{s}"),
        }
    }
}

impl FromStr for DeviceId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s))
    }
}

impl From<&str> for DeviceId {
    fn from(s: &str) -> Self {
        s.parse::<i64>()
            .map_or_else(|_| Self::Text(s.to_owned()), Self::Number)
    }
}

impl From<i64> for DeviceId {
    fn from(n: i64) -> Self {
        Self::Number(n)
    }
}

// ── DeviceStatus ────────────────────────────────────────────────────

/// Reachability as last observed by the server.
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
pub enum DeviceStatus {
    Online,
    Offline,
    Warning,
    #[default]
    Unknown,
}

impl DeviceStatus {
    /// Map a wire value. Missing or unrecognized values are `Unknown`.
    pub fn from_wire(raw: Option<&str>) -> Self {
        raw.and_then(|s| s.trim().parse().ok()).unwrap_or_default()
    }
}

// ── Device ──────────────────────────────────────────────────────────

pub const DEFAULT_SNMP_COMMUNITY: &str = "public";
pub const DEFAULT_SNMP_VERSION: &str = "2c";

/// A monitored network device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    pub id: DeviceId,
    pub name: String,
    pub ip_address: String,
    pub device_type: String,
    pub status: DeviceStatus,
    /// Percent, 0-100.
    pub cpu_usage: Option<f64>,
    /// Percent, 0-100.
    pub memory_usage: Option<f64>,
    /// Centiseconds since last boot.
    pub uptime_centis: Option<u64>,
    pub last_seen: Option<DateTime<Utc>>,
    pub snmp_community: String,
    pub snmp_version: String,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Device {
    /// Minimal record with defaults for everything but id and status.
    pub fn new(id: impl Into<DeviceId>, status: DeviceStatus) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            ip_address: String::new(),
            device_type: String::new(),
            status,
            cpu_usage: None,
            memory_usage: None,
            uptime_centis: None,
            last_seen: None,
            snmp_community: DEFAULT_SNMP_COMMUNITY.to_owned(),
            snmp_version: DEFAULT_SNMP_VERSION.to_owned(),
            created_at: None,
            updated_at: None,
        }
    }

    /// Time since last boot.
    pub fn uptime(&self) -> Option<Duration> {
        self.uptime_centis
            .map(|cs| Duration::from_millis(cs.saturating_mul(10)))
    }

    /// Name if set, otherwise the IP address.
    pub fn label(&self) -> &str {
        if self.name.is_empty() {
            &self.ip_address
        } else {
            &self.name
        }
    }
}
