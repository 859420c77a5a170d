// ── Typed request structs for Command payloads ──

use serde::{Deserialize, Serialize};

// ── Device ─────────────────────────────────────────────────────────

/// Fields for registering a device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewDevice {
    pub name: String,
    pub ip_address: String,
    pub device_type: String,
    /// Defaults to `public`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snmp_community: Option<String>,
    /// Defaults to `2c` server-side.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snmp_version: Option<String>,
}

/// Fields to change on an existing device. `None` leaves a field as is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DevicePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snmp_community: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snmp_version: Option<String>,
}

impl DevicePatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.ip_address.is_none()
            && self.device_type.is_none()
            && self.snmp_community.is_none()
            && self.snmp_version.is_none()
    }
}
