//! Shared configuration for the netpulse CLI.
//!
//! TOML server profiles, environment overrides, and translation to
//! `netpulse_core::MonitorConfig`. Core never sees these types; it
//! receives a pre-built `MonitorConfig`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use netpulse_core::{MonitorConfig, TlsVerification};

/// Name of the built-in profile pointing at a local development server.
pub const LOCAL_SERVER: &str = "local";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("server '{name}' not found in configuration")]
    UnknownServer { name: String, available: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    /// Server used when `--server` is not given.
    pub default_server: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named monitoring servers.
    #[serde(default)]
    pub servers: BTreeMap<String, ServerProfile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_server: Some(LOCAL_SERVER.into()),
            defaults: Defaults::default(),
            servers: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Active server name: explicit choice, then `default_server`, then
    /// the built-in local profile.
    pub fn active_server_name(&self, explicit: Option<&str>) -> String {
        explicit
            .map(str::to_owned)
            .or_else(|| self.default_server.clone())
            .unwrap_or_else(|| LOCAL_SERVER.into())
    }

    /// Look up a server profile. `local` always resolves, falling back to
    /// the built-in development server when not configured.
    pub fn server(&self, name: &str) -> Result<ServerProfile, ConfigError> {
        if let Some(profile) = self.servers.get(name) {
            return Ok(profile.clone());
        }
        if name == LOCAL_SERVER {
            return Ok(ServerProfile::local());
        }
        Err(ConfigError::UnknownServer {
            name: name.into(),
            available: self.server_names().join(", "),
        })
    }

    /// Configured server names, sorted.
    pub fn server_names(&self) -> Vec<String> {
        self.servers.keys().cloned().collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    #[serde(default)]
    pub insecure: bool,

    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Join live monitoring on connect.
    #[serde(default = "default_true")]
    pub auto_refresh: bool,

    /// Seconds between background pulls in `watch`. 0 = push only.
    #[serde(default)]
    pub refresh_interval: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            insecure: false,
            timeout: default_timeout(),
            auto_refresh: true,
            refresh_interval: 0,
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_timeout() -> u64 {
    30
}
fn default_true() -> bool {
    true
}

/// A named monitoring server.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ServerProfile {
    /// Server base URL (e.g., "http://10.0.0.5:5000").
    pub url: String,

    /// Path of the REST root, relative to `url`.
    #[serde(default = "default_api_path")]
    pub api_path: String,

    /// Path of the WebSocket push endpoint, relative to `url`.
    #[serde(default = "default_push_path")]
    pub push_path: String,

    /// Path to custom CA certificate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ca_cert: Option<PathBuf>,

    /// Override insecure TLS setting.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insecure: Option<bool>,

    /// Override timeout.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,

    /// Override auto-refresh.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_refresh: Option<bool>,

    /// Override the background pull interval.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_interval: Option<u64>,
}

fn default_api_path() -> String {
    "/api".into()
}
fn default_push_path() -> String {
    "/ws".into()
}

impl ServerProfile {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            api_path: default_api_path(),
            push_path: default_push_path(),
            ca_cert: None,
            insecure: None,
            timeout: None,
            auto_refresh: None,
            refresh_interval: None,
        }
    }

    /// The development server on this machine.
    pub fn local() -> Self {
        Self::new(format!("http://{}", netpulse_core::DEFAULT_HOST))
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("dev", "netpulse", "netpulse").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("netpulse");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from a specific file + environment. A missing file yields the
/// defaults.
///
/// Environment keys use `__` for nesting: `NETPULSE_DEFAULT_SERVER`,
/// `NETPULSE_DEFAULTS__TIMEOUT`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("NETPULSE_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if loading fails.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(&config_path(), cfg)
}

pub fn save_config_to(path: &Path, cfg: &Config) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Translation to core ─────────────────────────────────────────────

/// Build a `MonitorConfig` from a profile and the global defaults.
///
/// Profile overrides win over `[defaults]`. The push URL mirrors the
/// base URL's security: `http` becomes `ws`, `https` becomes `wss`.
pub fn profile_to_monitor_config(
    profile: &ServerProfile,
    defaults: &Defaults,
) -> Result<MonitorConfig, ConfigError> {
    let base: Url = profile.url.parse().map_err(|_| ConfigError::Validation {
        field: "url".into(),
        reason: format!("invalid URL: {}", profile.url),
    })?;

    let push_scheme = match base.scheme() {
        "http" => "ws",
        "https" => "wss",
        other => {
            return Err(ConfigError::Validation {
                field: "url".into(),
                reason: format!("expected http or https, got '{other}'"),
            });
        }
    };

    let api_url = endpoint(&base, &profile.api_path);
    let mut push_url = endpoint(&base, &profile.push_path);
    push_url
        .set_scheme(push_scheme)
        .map_err(|()| ConfigError::Validation {
            field: "url".into(),
            reason: format!("cannot derive push URL from {base}"),
        })?;

    let tls = if profile.insecure.unwrap_or(defaults.insecure) {
        TlsVerification::DangerAcceptInvalid
    } else if let Some(ref ca_path) = profile.ca_cert {
        TlsVerification::CustomCa(ca_path.clone())
    } else {
        TlsVerification::SystemDefaults
    };

    let mut config = MonitorConfig::new(api_url, push_url);
    config.tls = tls;
    config.timeout = Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout));
    config.auto_refresh = profile.auto_refresh.unwrap_or(defaults.auto_refresh);
    config.refresh_interval_secs = profile.refresh_interval.unwrap_or(defaults.refresh_interval);
    Ok(config)
}

/// `base` with `path` appended to its own path.
fn endpoint(base: &Url, path: &str) -> Url {
    let mut url = base.clone();
    let joined = format!(
        "{}/{}",
        base.path().trim_end_matches('/'),
        path.trim_start_matches('/')
    );
    url.set_path(&joined);
    url.set_query(None);
    url
}
