//! Resolve the active server profile plus CLI overrides into a
//! `MonitorConfig`.

use netpulse_config::{Config, ServerProfile};
use netpulse_core::MonitorConfig;

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// Load the config file and apply `--server`, `--url`, `--insecure` and
/// `--timeout`.
pub fn resolve(global: &GlobalOpts) -> Result<MonitorConfig, CliError> {
    let cfg = netpulse_config::load_config()?;
    resolve_with(&cfg, global)
}

fn resolve_with(cfg: &Config, global: &GlobalOpts) -> Result<MonitorConfig, CliError> {
    let name = cfg.active_server_name(global.server.as_deref());

    // A bare --url works without any profile on disk.
    let mut profile = match (cfg.server(&name), global.url.as_deref()) {
        (Ok(profile), _) => profile,
        (Err(_), Some(url)) => ServerProfile::new(url),
        (Err(e), None) => return Err(e.into()),
    };

    if let Some(url) = &global.url {
        profile.url.clone_from(url);
    }
    if global.insecure {
        profile.insecure = Some(true);
    }
    if let Some(timeout) = global.timeout {
        profile.timeout = Some(timeout);
    }

    tracing::debug!(server = %name, url = %profile.url, "resolved server profile");
    Ok(netpulse_config::profile_to_monitor_config(
        &profile,
        &cfg.defaults,
    )?)
}
