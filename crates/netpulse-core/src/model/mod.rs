// ── Domain model ──
//
// Canonical types the engine stores and publishes. Wire records from
// `netpulse-api` are converted into these in `crate::convert`.

pub mod alert;
pub mod device;
pub mod metric;
pub mod stats;

pub use alert::{Alert, AlertId, AlertSeverity, AlertSpec, DeviceRef};
pub use device::{DEFAULT_SNMP_COMMUNITY, DEFAULT_SNMP_VERSION, Device, DeviceId, DeviceStatus};
pub use metric::{MetricPoint, MetricsQuery};
pub use stats::{FleetStats, StatsSnapshot, StatsSource, compute_stats};
