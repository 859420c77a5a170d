//! Command handlers, one module per top-level subcommand.

pub mod config_cmd;
pub mod devices;
pub mod stats;
pub mod util;
pub mod watch;

use netpulse_core::Monitor;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Route a server-bound command to its handler.
pub async fn dispatch(cmd: Command, monitor: &Monitor, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Devices(args) => devices::handle(monitor, args, global).await,
        Command::Stats => stats::handle(monitor, global).await,
        Command::Watch(args) => watch::handle(monitor, &args, global).await,
        Command::Config(_) | Command::Completions(_) => Err(CliError::Internal(
            "command does not need a server connection".into(),
        )),
    }
}
