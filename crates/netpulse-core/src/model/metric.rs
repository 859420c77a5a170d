// ── Historical metrics ──

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One stored sample from the metrics history endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricPoint {
    /// e.g. `cpu_usage`, `memory_usage`, `uptime`.
    pub metric_type: String,
    pub value: f64,
    pub unit: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
}

/// Filter for a metrics history query. Empty means the server default
/// (last 24 hours, every metric type).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsQuery {
    pub hours: Option<u32>,
    pub metric_type: Option<String>,
}
