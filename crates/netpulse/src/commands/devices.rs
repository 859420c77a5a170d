//! Device command handlers.

use std::io::{self, IsTerminal};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tabled::Tabled;

use netpulse_core::{
    AssumeYes, Command as CoreCommand, CommandResult, Confirmation, CoreError, Device,
    DevicePatch, MetricPoint, MetricsQuery, Monitor, NewDevice,
};

use crate::cli::{DevicesArgs, DevicesCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table rows ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct DeviceRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "IP")]
    ip: String,
    #[tabled(rename = "Type")]
    device_type: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "CPU")]
    cpu: String,
    #[tabled(rename = "Memory")]
    memory: String,
    #[tabled(rename = "Uptime")]
    uptime: String,
}

impl From<&Arc<Device>> for DeviceRow {
    fn from(d: &Arc<Device>) -> Self {
        Self {
            id: d.id.to_string(),
            name: d.name.clone(),
            ip: d.ip_address.clone(),
            device_type: d.device_type.clone(),
            status: d.status.to_string(),
            cpu: percent(d.cpu_usage),
            memory: percent(d.memory_usage),
            uptime: uptime(d),
        }
    }
}

#[derive(Tabled)]
struct MetricRow {
    #[tabled(rename = "Metric")]
    metric: String,
    #[tabled(rename = "Value")]
    value: String,
    #[tabled(rename = "Unit")]
    unit: String,
    #[tabled(rename = "Time")]
    timestamp: String,
}

impl From<&MetricPoint> for MetricRow {
    fn from(p: &MetricPoint) -> Self {
        Self {
            metric: p.metric_type.clone(),
            value: format!("{:.2}", p.value),
            unit: p.unit.clone().unwrap_or_default(),
            timestamp: p
                .timestamp
                .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_default(),
        }
    }
}

#[derive(Serialize)]
struct TestReport<'a> {
    device: String,
    message: &'a str,
}

// ── Formatting helpers ───────────────────────────────────────────────

pub(crate) fn percent(value: Option<f64>) -> String {
    value.map_or_else(|| "-".into(), |v| format!("{v:.1}%"))
}

pub(crate) fn uptime(device: &Device) -> String {
    device.uptime().map_or_else(
        || "-".into(),
        |d| humantime::format_duration(Duration::from_secs(d.as_secs())).to_string(),
    )
}

fn detail(d: &Device) -> String {
    let stamp = |t: Option<chrono::DateTime<chrono::Utc>>| {
        t.map_or_else(|| "-".into(), |t| t.to_rfc3339())
    };
    [
        format!("ID:             {}", d.id),
        format!("Name:           {}", d.name),
        format!("IP:             {}", d.ip_address),
        format!("Type:           {}", d.device_type),
        format!("Status:         {}", d.status),
        format!("CPU:            {}", percent(d.cpu_usage)),
        format!("Memory:         {}", percent(d.memory_usage)),
        format!("Uptime:         {}", uptime(d)),
        format!("Last seen:      {}", stamp(d.last_seen)),
        format!("SNMP community: {}", d.snmp_community),
        format!("SNMP version:   {}", d.snmp_version),
        format!("Created:        {}", stamp(d.created_at)),
        format!("Updated:        {}", stamp(d.updated_at)),
    ]
    .join("\n")
}

pub(crate) fn device_rows(devices: &[Arc<Device>]) -> String {
    let rows: Vec<DeviceRow> = devices.iter().map(DeviceRow::from).collect();
    output::render_table(&rows)
}

fn unexpected(result: &CommandResult) -> CliError {
    CliError::Internal(format!("unexpected command result: {result:?}"))
}

// ── Handler ──────────────────────────────────────────────────────────

#[allow(clippy::too_many_lines)]
pub async fn handle(
    monitor: &Monitor,
    args: DevicesArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let color = output::should_color(&global.color);

    match args.command {
        DevicesCommand::List => {
            monitor.execute(CoreCommand::RefreshDevices).await?;
            let snap = monitor.devices_snapshot();
            let out = output::render_list(
                &global.output,
                snap.as_slice(),
                |d| DeviceRow::from(d),
                |d| d.id.to_string(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        DevicesCommand::Get { device } => {
            let id = util::resolve_device_id(monitor, &device).await?;
            match monitor.execute(CoreCommand::ViewDevice { id }).await? {
                CommandResult::Device(d) => {
                    let out = output::render_single(&global.output, &d, detail, |d| {
                        d.id.to_string()
                    })?;
                    output::print_output(&out, global.quiet);
                    Ok(())
                }
                other => Err(unexpected(&other)),
            }
        }

        DevicesCommand::Add {
            name,
            ip,
            device_type,
            community,
            snmp_version,
        } => {
            let fields = NewDevice {
                name,
                ip_address: ip,
                device_type,
                snmp_community: community,
                snmp_version,
            };
            match monitor.execute(CoreCommand::AddDevice(fields)).await? {
                CommandResult::Device(d) => {
                    util::print_notices(monitor, global.quiet, color);
                    let out = output::render_single(&global.output, &d, detail, |d| {
                        d.id.to_string()
                    })?;
                    output::print_output(&out, global.quiet);
                    Ok(())
                }
                // Accepted, but the server sent no record and the refresh
                // could not place it.
                CommandResult::Ok => {
                    util::print_notices(monitor, global.quiet, color);
                    Ok(())
                }
                other => Err(unexpected(&other)),
            }
        }

        DevicesCommand::Update {
            device,
            name,
            ip,
            device_type,
            community,
            snmp_version,
        } => {
            let patch = DevicePatch {
                name,
                ip_address: ip,
                device_type,
                snmp_community: community,
                snmp_version,
            };
            if patch.is_empty() {
                return Err(CliError::Validation {
                    field: "update".into(),
                    reason: "pass at least one of --name, --ip, --type, --community, \
                             --snmp-version"
                        .into(),
                });
            }
            let id = util::resolve_device_id(monitor, &device).await?;
            match monitor.execute(CoreCommand::EditDevice { id, patch }).await? {
                CommandResult::Device(d) => {
                    util::print_notices(monitor, global.quiet, color);
                    let out = output::render_single(&global.output, &d, detail, |d| {
                        d.id.to_string()
                    })?;
                    output::print_output(&out, global.quiet);
                    Ok(())
                }
                // Accepted, but the server sent no record and the refresh
                // could not place it.
                CommandResult::Ok => {
                    util::print_notices(monitor, global.quiet, color);
                    Ok(())
                }
                other => Err(unexpected(&other)),
            }
        }

        DevicesCommand::Delete { device } => {
            let id = util::resolve_device_id(monitor, &device).await?;
            if !global.yes && !io::stdin().is_terminal() {
                return Err(CliError::NonInteractiveRequiresYes {
                    action: format!("delete device {id}"),
                });
            }
            let confirmation: &dyn Confirmation = if global.yes {
                &AssumeYes
            } else {
                &util::PromptConfirmation
            };
            match monitor.refresh().delete_device(&id, confirmation).await {
                Ok(()) => {
                    util::print_notices(monitor, global.quiet, color);
                    Ok(())
                }
                Err(CoreError::Cancelled) => {
                    if !global.quiet {
                        eprintln!("Cancelled.");
                    }
                    Ok(())
                }
                Err(e) => Err(e.into()),
            }
        }

        DevicesCommand::Test { device } => {
            let id = util::resolve_device_id(monitor, &device).await?;
            let label = id.to_string();
            match monitor.execute(CoreCommand::TestDevice { id }).await? {
                CommandResult::Message(message) => {
                    let report = TestReport {
                        device: label,
                        message: &message,
                    };
                    let out = output::render_single(
                        &global.output,
                        &report,
                        |r| r.message.to_owned(),
                        |r| r.message.to_owned(),
                    )?;
                    output::print_output(&out, global.quiet);
                    Ok(())
                }
                other => Err(unexpected(&other)),
            }
        }

        DevicesCommand::Metrics {
            device,
            hours,
            metric_type,
        } => {
            let id = util::resolve_device_id(monitor, &device).await?;
            let query = MetricsQuery { hours, metric_type };
            match monitor
                .execute(CoreCommand::DeviceMetrics { id, query })
                .await?
            {
                CommandResult::Metrics(points) => {
                    let out = output::render_list(
                        &global.output,
                        &points,
                        |p| MetricRow::from(p),
                        |p| format!("{}\t{}", p.metric_type, p.value),
                    )?;
                    output::print_output(&out, global.quiet);
                    Ok(())
                }
                other => Err(unexpected(&other)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use netpulse_core::DeviceStatus;

    use super::*;

    #[test]
    fn row_formats_missing_metrics_as_dashes() {
        let device = Arc::new(Device::new(3_i64, DeviceStatus::Offline));
        let row = DeviceRow::from(&device);
        assert_eq!(row.id, "3");
        assert_eq!(row.status, "offline");
        assert_eq!(row.cpu, "-");
        assert_eq!(row.uptime, "-");
    }

    #[test]
    fn uptime_is_rounded_to_seconds() {
        let mut device = Device::new(1_i64, DeviceStatus::Online);
        device.uptime_centis = Some(366_150);
        assert_eq!(uptime(&device), "1h 1m 1s");
    }
}
