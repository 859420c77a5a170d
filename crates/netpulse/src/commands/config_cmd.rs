//! Config subcommand handlers.

use dialoguer::{Confirm, Input};

use netpulse_config::{self as config, Config, LOCAL_SERVER, ServerProfile};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Helpers ─────────────────────────────────────────────────────────

fn invalid(key: &str, reason: impl Into<String>) -> CliError {
    CliError::Validation {
        field: key.into(),
        reason: reason.into(),
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, CliError> {
    value
        .parse()
        .map_err(|_| invalid(key, format!("expected true or false, got '{value}'")))
}

fn parse_u64(key: &str, value: &str) -> Result<u64, CliError> {
    value
        .parse()
        .map_err(|_| invalid(key, format!("expected a whole number, got '{value}'")))
}

/// Apply one `key = value` assignment to a server profile.
fn set_profile_key(profile: &mut ServerProfile, key: &str, value: &str) -> Result<(), CliError> {
    match key {
        "url" => value.clone_into(&mut profile.url),
        "api_path" => value.clone_into(&mut profile.api_path),
        "push_path" => value.clone_into(&mut profile.push_path),
        "ca_cert" => profile.ca_cert = Some(value.into()),
        "insecure" => profile.insecure = Some(parse_bool(key, value)?),
        "timeout" => profile.timeout = Some(parse_u64(key, value)?),
        "auto_refresh" => profile.auto_refresh = Some(parse_bool(key, value)?),
        "refresh_interval" => profile.refresh_interval = Some(parse_u64(key, value)?),
        other => {
            return Err(invalid(
                other,
                "unknown key (expected url, api_path, push_path, ca_cert, insecure, \
                 timeout, auto_refresh, refresh_interval)",
            ));
        }
    }
    Ok(())
}

/// Server names for display, marking the default and the built-in
/// local server when it has no explicit profile.
fn server_listing(cfg: &Config) -> Vec<String> {
    let default = cfg.active_server_name(None);
    let mut names = cfg.server_names();
    if !names.iter().any(|n| n == LOCAL_SERVER) {
        names.insert(0, LOCAL_SERVER.into());
    }
    names
        .into_iter()
        .map(|name| {
            let marker = if name == default { "*" } else { " " };
            let builtin = if cfg.servers.contains_key(&name) {
                ""
            } else {
                " (built-in)"
            };
            format!("{marker} {name}{builtin}")
        })
        .collect()
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        // ── Init: interactive wizard ────────────────────────────────
        ConfigCommand::Init => {
            let config_path = config::config_path();
            eprintln!("netpulse configuration wizard");
            eprintln!("   Config path: {}\n", config_path.display());

            let mut cfg = config::load_config_or_default();

            let name: String = Input::new()
                .with_prompt("Server name")
                .default(LOCAL_SERVER.into())
                .interact_text()?;

            if cfg.servers.contains_key(&name)
                && !util::confirm(&format!("Server '{name}' exists. Overwrite?"), global.yes)?
            {
                eprintln!("Cancelled.");
                return Ok(());
            }

            let url: String = Input::new()
                .with_prompt("Server URL")
                .default(format!("http://{}", netpulse_core::DEFAULT_HOST))
                .interact_text()?;

            let auto_refresh = Confirm::new()
                .with_prompt("Join live monitoring on connect?")
                .default(true)
                .interact()?;

            let mut profile = ServerProfile::new(url);
            profile.auto_refresh = Some(auto_refresh);

            // Validate before writing anything.
            config::profile_to_monitor_config(&profile, &cfg.defaults)?;

            cfg.servers.insert(name.clone(), profile);
            if cfg.servers.len() == 1 || cfg.default_server.is_none() {
                cfg.default_server = Some(name.clone());
            }
            config::save_config(&cfg)?;
            eprintln!("   Saved server '{name}' to {}", config_path.display());
            Ok(())
        }

        // ── Show ────────────────────────────────────────────────────
        ConfigCommand::Show => {
            let cfg = config::load_config()?;
            let out = output::render_single(
                &global.output,
                &cfg,
                |c| toml::to_string_pretty(c).unwrap_or_else(|e| format!("# {e}")),
                |c| c.active_server_name(None),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        // ── Set ─────────────────────────────────────────────────────
        ConfigCommand::Set { key, value } => {
            let mut cfg = config::load_config_or_default();
            let name = cfg.active_server_name(global.server.as_deref());
            let mut profile = cfg.server(&name)?;
            set_profile_key(&mut profile, &key, &value)?;
            config::profile_to_monitor_config(&profile, &cfg.defaults)?;

            cfg.servers.insert(name.clone(), profile);
            config::save_config(&cfg)?;
            if !global.quiet {
                eprintln!("Set {key} = {value} on server '{name}'");
            }
            Ok(())
        }

        // ── Servers ─────────────────────────────────────────────────
        ConfigCommand::Servers => {
            let cfg = config::load_config()?;
            output::print_output(&server_listing(&cfg).join("\n"), global.quiet);
            Ok(())
        }

        // ── Use ─────────────────────────────────────────────────────
        ConfigCommand::Use { name } => {
            let mut cfg = config::load_config_or_default();
            cfg.server(&name)?;
            cfg.default_server = Some(name.clone());
            config::save_config(&cfg)?;
            if !global.quiet {
                eprintln!("Default server is now '{name}'");
            }
            Ok(())
        }
    }
}
