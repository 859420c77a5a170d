//! Live view: prints device, stats, and alert changes as the engine
//! publishes them until Ctrl-C (or `--for` elapses).

use std::io::{self, Write};
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use tokio::sync::broadcast::error::RecvError;
use tokio::time::Instant;
use tracing::{debug, warn};

use netpulse_core::{
    Command as CoreCommand, ConnectionState, Device, Monitor, MonitorConfig, StatsSnapshot, Update,
};

use crate::cli::{GlobalOpts, WatchArgs};
use crate::error::CliError;
use crate::output;

use super::{devices, stats};

/// Watch keeps the push channel open; flags tune subscription and
/// periodic pulls.
pub fn configure(args: &WatchArgs, config: &mut MonitorConfig) {
    config.push_enabled = true;
    if args.no_auto_refresh {
        config.auto_refresh = false;
    }
    if let Some(secs) = args.interval {
        config.refresh_interval_secs = secs;
    }
}

// ── Line renderers ───────────────────────────────────────────────────

fn state_line(state: ConnectionState, color: bool) -> String {
    let (glyph, text) = match state {
        ConnectionState::Connected => ("●", "live".to_owned()),
        ConnectionState::Connecting => ("○", "connecting".to_owned()),
        ConnectionState::Reconnecting { attempt } => ("○", format!("reconnecting (attempt {attempt})")),
        ConnectionState::Disconnected => ("○", "disconnected".to_owned()),
    };
    let line = format!("{glyph} {text}");
    if !color {
        return line;
    }
    match state {
        ConnectionState::Connected => line.green().to_string(),
        ConnectionState::Disconnected => line.red().to_string(),
        _ => line.yellow().to_string(),
    }
}

fn stats_line(snapshot: &StatsSnapshot, color: bool) -> String {
    let line = format!("{} ({})", stats::summary(&snapshot.stats), snapshot.source);
    if color { line.bold().to_string() } else { line }
}

/// One device row. Single-row pushes get a marker so they stand out.
fn device_line(device: &Device, marker: &str, color: bool) -> String {
    let marker = if color && !marker.trim().is_empty() {
        marker.magenta().bold().to_string()
    } else {
        marker.to_owned()
    };
    format!(
        "{marker} {:<6} {:<20} {:<16} {:<8} cpu {:>6}  mem {:>6}  up {}",
        device.id.to_string(),
        device.label(),
        device.ip_address,
        output::paint_status(device.status, color),
        devices::percent(device.cpu_usage),
        devices::percent(device.memory_usage),
        devices::uptime(device),
    )
}

fn render_update(monitor: &Monitor, update: &Update, color: bool) -> Option<String> {
    match update {
        Update::DevicesReplaced { count } => Some(format!(
            "{count} devices\n{}",
            devices::device_rows(&monitor.devices_snapshot())
        )),
        Update::DeviceUpdated { id, highlight } => {
            let marker = if *highlight { "»" } else { " " };
            monitor
                .registry()
                .get(id)
                .map(|d| device_line(&d, marker, color))
        }
        Update::DeviceInserted { id } => monitor
            .registry()
            .get(id)
            .map(|d| device_line(&d, "+", color)),
        Update::StatsChanged { .. } => Some(stats_line(&monitor.stats_snapshot(), color)),
        Update::AlertRaised { id } => monitor.ledger().get(*id).map(|alert| {
            let device = alert
                .device
                .as_ref()
                .map(|d| format!(" ({} {})", d.name, d.ip_address))
                .unwrap_or_default();
            format!(
                "{} {}{device}",
                output::paint_severity(alert.severity, color),
                alert.message
            )
        }),
        Update::AlertRemoved { id, cause } => {
            debug!(alert = ?id, ?cause, "alert removed");
            None
        }
    }
}

fn redraw(monitor: &Monitor, color: bool) -> String {
    let mut out = vec![
        devices::device_rows(&monitor.devices_snapshot()),
        stats_line(&monitor.stats_snapshot(), color),
    ];
    for alert in monitor.alerts_snapshot().iter() {
        out.push(format!(
            "{} {}",
            output::paint_severity(alert.severity, color),
            alert.message
        ));
    }
    out.join("\n")
}

// ── Handler ──────────────────────────────────────────────────────────

pub async fn handle(
    monitor: &Monitor,
    args: &WatchArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let color = output::should_color(&global.color);
    let started = Instant::now();

    let spinner = if global.quiet {
        ProgressBar::hidden()
    } else {
        ProgressBar::new_spinner()
    };
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message(format!("Loading devices from {}", monitor.config().api_url));
    spinner.enable_steady_tick(Duration::from_millis(100));
    let initial = monitor.execute(CoreCommand::RefreshDevices).await;
    spinner.finish_and_clear();
    if let Err(e) = initial {
        // Already recorded as an alert; keep watching for pushes.
        warn!(error = %e, "initial device load failed");
    }

    let mut updates = monitor.updates();
    let mut state = monitor.connection_state();
    let mut stdout = io::stdout();
    let _ = writeln!(stdout, "{}", redraw(monitor, color));
    let _ = writeln!(stdout, "{}", state_line(*state.borrow_and_update(), color));

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let deadline = async {
        match args.duration {
            Some(d) => tokio::time::sleep(d).await,
            None => std::future::pending::<()>().await,
        }
    };
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            _ = &mut ctrl_c => break,
            () = &mut deadline => break,
            changed = state.changed() => {
                if changed.is_err() {
                    break;
                }
                let current = *state.borrow_and_update();
                let _ = writeln!(stdout, "{}", state_line(current, color));
            }
            update = updates.recv() => match update {
                Ok(update) => {
                    if let Some(line) = render_update(monitor, &update, color) {
                        let _ = writeln!(stdout, "{line}");
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "watch fell behind, redrawing");
                    let _ = writeln!(stdout, "{}", redraw(monitor, color));
                }
                Err(RecvError::Closed) => break,
            },
        }
    }

    if !global.quiet {
        let elapsed = Duration::from_secs(started.elapsed().as_secs());
        eprintln!("Watched for {}", humantime::format_duration(elapsed));
    }
    Ok(())
}
