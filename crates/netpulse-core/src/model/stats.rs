// ── Fleet statistics ──
//
// `compute_stats` is the only place counts are derived from devices.
// Pushed `stats_update` frames bypass it and are taken verbatim.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::device::{Device, DeviceStatus};

/// Fleet-wide device counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FleetStats {
    pub total: u64,
    pub online: u64,
    pub offline: u64,
    pub warning: u64,
}

/// Count devices per status. `Unknown` devices count toward `total` only.
pub fn compute_stats(devices: &[Arc<Device>]) -> FleetStats {
    devices
        .iter()
        .fold(FleetStats::default(), |mut stats, device| {
            stats.total += 1;
            match device.status {
                DeviceStatus::Online => stats.online += 1,
                DeviceStatus::Offline => stats.offline += 1,
                DeviceStatus::Warning => stats.warning += 1,
                DeviceStatus::Unknown => {}
            }
            stats
        })
}

/// Where the currently displayed counts came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum StatsSource {
    /// Nothing published yet.
    Initial,
    /// Accepted verbatim from a `stats_update` frame.
    Pushed,
    /// Recomputed from the registry after a pull.
    Derived,
}

/// Counts as published to observers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub stats: FleetStats,
    pub source: StatsSource,
    pub updated_at: DateTime<Utc>,
}

impl StatsSnapshot {
    pub fn initial() -> Self {
        Self {
            stats: FleetStats::default(),
            source: StatsSource::Initial,
            updated_at: Utc::now(),
        }
    }
}
