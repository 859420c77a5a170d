//! Push-channel frame codec.
//!
//! Every text frame on the push channel is a JSON object of the shape
//! `{ "event": "<name>", "data": <payload> }`. Server frames decode into
//! the closed [`ServerFrame`] enum; names outside that set are rejected
//! with [`Error::UnknownEvent`] so callers can log them instead of
//! guessing at their shape.

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::models::{AlertRecord, DeviceRecord, MessageBody, MetricsRecord, StatsRecord};

/// Frames the server pushes to the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerFrame {
    /// Complete, ordered device list.
    DevicesUpdate(Vec<DeviceRecord>),
    /// A single device changed.
    DeviceUpdate(DeviceRecord),
    /// Authoritative fleet counts.
    StatsUpdate(StatsRecord),
    /// A notification to show the operator.
    Alert(AlertRecord),
    /// Live per-device metrics.
    MetricsUpdate(MetricsRecord),
    /// Acknowledgement of a join/leave signal.
    Status(MessageBody),
}

impl ServerFrame {
    /// Every event name the codec accepts.
    pub const EVENT_NAMES: [&'static str; 6] = [
        "devices_update",
        "device_update",
        "stats_update",
        "alert",
        "metrics_update",
        "status",
    ];

    /// The wire name of this frame's event.
    pub fn event_name(&self) -> &'static str {
        match self {
            Self::DevicesUpdate(_) => "devices_update",
            Self::DeviceUpdate(_) => "device_update",
            Self::StatsUpdate(_) => "stats_update",
            Self::Alert(_) => "alert",
            Self::MetricsUpdate(_) => "metrics_update",
            Self::Status(_) => "status",
        }
    }
}

/// Signals the client sends to the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ClientSignal {
    /// Subscribe to live monitoring updates.
    JoinMonitoring,
    /// Unsubscribe from live monitoring updates.
    LeaveMonitoring,
}

impl ClientSignal {
    pub fn encode(self) -> String {
        match self {
            Self::JoinMonitoring => r#"{"event":"join_monitoring"}"#.to_owned(),
            Self::LeaveMonitoring => r#"{"event":"leave_monitoring"}"#.to_owned(),
        }
    }
}

/// Untyped envelope, decoded first so unknown names can be told apart
/// from malformed payloads.
#[derive(Debug, Deserialize)]
struct RawFrame {
    event: String,
    #[serde(default)]
    data: serde_json::Value,
}

/// Decode one text frame.
pub fn decode(text: &str) -> Result<ServerFrame, Error> {
    let raw: RawFrame = serde_json::from_str(text).map_err(|e| Error::Deserialization {
        message: e.to_string(),
        body: text.to_owned(),
    })?;

    if !ServerFrame::EVENT_NAMES.contains(&raw.event.as_str()) {
        return Err(Error::UnknownEvent { name: raw.event });
    }

    let tagged = serde_json::json!({ "event": raw.event, "data": raw.data });
    serde_json::from_value(tagged).map_err(|e| Error::Deserialization {
        message: format!("invalid `{}` payload: {e}", raw.event),
        body: text.to_owned(),
    })
}
