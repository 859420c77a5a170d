// ── Command table ──
//
// Every operator action is a `Command` variant. `CommandKind` is the
// action-name table: each name maps to exactly one variant, looked up
// explicitly with `CommandKind::from_str`.

pub mod requests;

use tokio::sync::oneshot;

use crate::error::CoreError;
use crate::model::{Device, DeviceId, FleetStats, MetricPoint, MetricsQuery};

pub use requests::{DevicePatch, NewDevice};

/// An operator action routed through the engine's command processor.
#[derive(Debug, Clone, PartialEq, strum::EnumDiscriminants)]
#[strum_discriminants(name(CommandKind))]
#[strum_discriminants(derive(
    Hash,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
    strum::EnumIter,
    strum::IntoStaticStr
))]
#[strum_discriminants(strum(serialize_all = "snake_case"))]
pub enum Command {
    /// Pull the full device list and replace the registry.
    RefreshDevices,
    AddDevice(NewDevice),
    ViewDevice { id: DeviceId },
    EditDevice { id: DeviceId, patch: DevicePatch },
    TestDevice { id: DeviceId },
    /// `confirmed` is the operator's answer to the delete prompt.
    DeleteDevice { id: DeviceId, confirmed: bool },
    DeviceMetrics { id: DeviceId, query: MetricsQuery },
    SetAutoRefresh { enabled: bool },
}

impl Command {
    pub fn kind(&self) -> CommandKind {
        CommandKind::from(self)
    }
}

/// Result of a successfully executed command.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandResult {
    Ok,
    Refreshed(FleetStats),
    Device(Device),
    /// Server message from a connectivity test.
    Message(String),
    Metrics(Vec<MetricPoint>),
}

/// Command plus its reply slot, sent to the processor task.
pub(crate) struct CommandEnvelope {
    pub command: Command,
    pub response_tx: oneshot::Sender<Result<CommandResult, CoreError>>,
}
