//! Fleet stats handler.

use serde::Serialize;

use netpulse_core::{Command as CoreCommand, CommandResult, FleetStats, Monitor, StatsSource};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

#[derive(Serialize)]
struct StatsReport {
    #[serde(flatten)]
    stats: FleetStats,
    source: StatsSource,
}

/// One-line summary shared with the watch view.
pub(crate) fn summary(stats: &FleetStats) -> String {
    format!(
        "Total {}  Online {}  Offline {}  Warning {}",
        stats.total, stats.online, stats.offline, stats.warning
    )
}

pub async fn handle(monitor: &Monitor, global: &GlobalOpts) -> Result<(), CliError> {
    match monitor.execute(CoreCommand::RefreshDevices).await? {
        CommandResult::Refreshed(stats) => {
            let report = StatsReport {
                stats,
                source: monitor.stats_snapshot().source,
            };
            let out = output::render_single(
                &global.output,
                &report,
                |r| summary(&r.stats),
                |r| {
                    format!(
                        "{}\t{}\t{}\t{}",
                        r.stats.total, r.stats.online, r.stats.offline, r.stats.warning
                    )
                },
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }
        other => Err(CliError::Internal(format!(
            "unexpected command result: {other:?}"
        ))),
    }
}
