//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text and stable exit codes.

use miette::Diagnostic;
use thiserror::Error;

use netpulse_config::ConfigError;
use netpulse_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not reach the monitoring server at {url}")]
    #[diagnostic(
        code(netpulse::connection_failed),
        help(
            "Check that the server is running and accessible.\n\
             Reason: {reason}\n\
             Try: netpulse --url http://HOST:5000 devices list"
        )
    )]
    ConnectionFailed { url: String, reason: String },

    // ── Resources ────────────────────────────────────────────────────
    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(netpulse::not_found),
        help("Run: netpulse {list_command} to see available {resource_type}s")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    // ── API ──────────────────────────────────────────────────────────
    #[error("Server error ({status}): {message}")]
    #[diagnostic(code(netpulse::api_error))]
    ApiError { status: String, message: String },

    #[error("Operation cancelled")]
    #[diagnostic(code(netpulse::cancelled))]
    Cancelled,

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(netpulse::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Server profile '{name}' not found in configuration")]
    #[diagnostic(
        code(netpulse::server_not_found),
        help(
            "Available servers: {available}\n\
             Create one with: netpulse config init"
        )
    )]
    ServerNotFound { name: String, available: String },

    #[error(transparent)]
    #[diagnostic(code(netpulse::config))]
    Config(Box<ConfigError>),

    // ── Interactive ──────────────────────────────────────────────────
    #[error("Destructive operation '{action}' requires confirmation")]
    #[diagnostic(
        code(netpulse::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    #[error("Prompt failed: {0}")]
    #[diagnostic(code(netpulse::prompt))]
    Prompt(#[from] dialoguer::Error),

    // ── Internal ─────────────────────────────────────────────────────
    #[error("{0}")]
    #[diagnostic(code(netpulse::internal))]
    Internal(String),

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("JSON output failed: {0}")]
    #[diagnostic(code(netpulse::json))]
    Json(#[from] serde_json::Error),

    #[error("YAML output failed: {0}")]
    #[diagnostic(code(netpulse::yaml))]
    Yaml(#[from] serde_yaml::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Validation { .. } | Self::NonInteractiveRequiresYes { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }

    /// Name the server URL on connection failures.
    #[must_use]
    pub fn at_url(self, server: &url::Url) -> Self {
        match self {
            Self::ConnectionFailed { reason, .. } => Self::ConnectionFailed {
                url: server.to_string(),
                reason,
            },
            other => other,
        }
    }

    pub(crate) fn device_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            resource_type: "device".into(),
            identifier: identifier.into(),
            list_command: "devices list".into(),
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { reason } => CliError::ConnectionFailed {
                url: "(configured server)".into(),
                reason,
            },

            CoreError::NotRunning => CliError::Internal("monitor is not running".into()),

            CoreError::DeviceNotFound { identifier } => CliError::device_not_found(identifier),

            CoreError::Api {
                message, status, ..
            } => CliError::ApiError {
                status: status.map_or_else(|| "unknown".into(), |s| s.to_string()),
                message,
            },

            CoreError::Cancelled => CliError::Cancelled,

            CoreError::ValidationFailed { message } => CliError::Validation {
                field: "request".into(),
                reason: message,
            },

            CoreError::Config { message } => CliError::Validation {
                field: "config".into(),
                reason: message,
            },

            CoreError::Internal(msg) => CliError::Internal(msg),
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::UnknownServer { name, available } => {
                CliError::ServerNotFound { name, available }
            }
            other => CliError::Config(Box::new(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_failures_exit_with_connection_code() {
        let err = CliError::from(CoreError::ConnectionFailed {
            reason: "refused".into(),
        });
        assert_eq!(err.exit_code(), exit_code::CONNECTION);
    }

    #[test]
    fn missing_device_exits_with_not_found_code() {
        let err = CliError::from(CoreError::DeviceNotFound {
            identifier: "7".into(),
        });
        assert_eq!(err.exit_code(), exit_code::NOT_FOUND);
        assert_eq!(err.to_string(), "device '7' not found");
    }

    #[test]
    fn server_rejection_keeps_its_message() {
        let err = CliError::from(CoreError::Api {
            message: "duplicate IP".into(),
            from_server: true,
            status: Some(400),
        });
        assert_eq!(err.to_string(), "Server error (400): duplicate IP");
        assert_eq!(err.exit_code(), exit_code::GENERAL);
    }
}
