//! Shared helpers for command handlers.

use std::io::{self, IsTerminal, Write};
use std::net::IpAddr;

use dialoguer::Confirm;
use netpulse_core::{AlertSeverity, Command, Confirmation, DeviceId, Monitor};

use crate::error::CliError;
use crate::output;

/// Resolve a device argument to an id. IP addresses are looked up in a
/// fresh device list; anything else is taken as the id itself.
pub async fn resolve_device_id(monitor: &Monitor, identifier: &str) -> Result<DeviceId, CliError> {
    if identifier.parse::<IpAddr>().is_err() {
        return Ok(DeviceId::from(identifier));
    }
    if monitor.registry().is_empty() {
        monitor.execute(Command::RefreshDevices).await?;
    }
    monitor
        .registry()
        .find_by_ip(identifier)
        .map(|device| device.id.clone())
        .ok_or_else(|| CliError::device_not_found(identifier))
}

/// Prompt for confirmation, auto-approving if `--yes` was passed.
pub fn confirm(message: &str, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    if !io::stdin().is_terminal() {
        return Err(CliError::NonInteractiveRequiresYes {
            action: message.into(),
        });
    }
    Ok(Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()?)
}

/// Terminal prompt handed to the engine for destructive operations.
/// A failed prompt counts as "no".
pub struct PromptConfirmation;

impl Confirmation for PromptConfirmation {
    fn confirm(&self, message: &str) -> bool {
        Confirm::new()
            .with_prompt(message)
            .default(false)
            .interact()
            .unwrap_or(false)
    }
}

/// Print the ledger's non-error alerts to stderr. Error alerts surface
/// through the returned `CliError` instead.
pub fn print_notices(monitor: &Monitor, quiet: bool, color: bool) {
    if quiet {
        return;
    }
    let mut stderr = io::stderr().lock();
    for alert in monitor.alerts_snapshot().iter() {
        if alert.severity == AlertSeverity::Error {
            continue;
        }
        let _ = writeln!(
            stderr,
            "{} {}",
            output::paint_severity(alert.severity, color),
            alert.message
        );
    }
}
