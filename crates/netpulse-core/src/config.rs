// ── Runtime monitor configuration ──
//
// Describes *where* the monitoring server lives and how to talk to it.
// Never touches disk: the CLI resolves a profile and hands one in.

use std::time::Duration;

use url::Url;

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(std::path::PathBuf),
    /// Skip verification (self-signed certs).
    DangerAcceptInvalid,
}

/// Bounds for push-channel reconnect backoff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub initial_delay: Duration,
    pub max_delay: Duration,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
        }
    }
}

/// Host and port the development server listens on.
pub const DEFAULT_HOST: &str = "127.0.0.1:5000";

/// Configuration for one monitoring server.
///
/// Built by the CLI and passed to [`Monitor`](crate::Monitor).
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Root of the REST endpoints (e.g. `http://127.0.0.1:5000/api`).
    pub api_url: Url,
    /// WebSocket push endpoint (e.g. `ws://127.0.0.1:5000/ws`).
    pub push_url: Url,
    /// Open the push channel on start.
    pub push_enabled: bool,
    /// Initial value of the auto-refresh flag (join live monitoring).
    pub auto_refresh: bool,
    /// HTTP request timeout.
    pub timeout: Duration,
    /// TLS verification strategy.
    pub tls: TlsVerification,
    /// Push-channel reconnect backoff.
    pub reconnect: ReconnectPolicy,
    /// Periodic pull-and-replace interval in seconds. 0 = never.
    pub refresh_interval_secs: u64,
}

impl MonitorConfig {
    /// Config with defaults for everything but the two endpoints.
    pub fn new(api_url: Url, push_url: Url) -> Self {
        Self {
            api_url,
            push_url,
            push_enabled: true,
            auto_refresh: true,
            timeout: Duration::from_secs(30),
            tls: TlsVerification::default(),
            reconnect: ReconnectPolicy::default(),
            refresh_interval_secs: 0,
        }
    }

    /// Point at a local server: `http://{host}/api` and `ws://{host}/ws`.
    pub fn local(host: &str) -> Result<Self, url::ParseError> {
        Ok(Self::new(
            Url::parse(&format!("http://{host}/api"))?,
            Url::parse(&format!("ws://{host}/ws"))?,
        ))
    }
}
