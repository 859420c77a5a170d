// ── Core error types ──
//
// User-facing errors from netpulse-core. Consumers never match on HTTP
// details directly; the `From<netpulse_api::Error>` impl folds wire
// failures into the two categories the engine cares about: the server
// could not be reached, or it answered and said no.

use thiserror::Error;

use crate::model::DeviceId;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot reach monitoring server: {reason}")]
    ConnectionFailed { reason: String },

    #[error("Monitor is not running")]
    NotRunning,

    // ── Data errors ──────────────────────────────────────────────────
    #[error("Device not found: {identifier}")]
    DeviceNotFound { identifier: String },

    // ── Operation errors ─────────────────────────────────────────────
    /// The server answered with a failure status.
    #[error("Server rejected request: {message}")]
    Api {
        message: String,
        /// Whether `message` came from the server's `error` field.
        from_server: bool,
        status: Option<u16>,
    },

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// `true` for failures where the server was never reached.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::ConnectionFailed { .. })
    }

    /// Read a bodyless 404 on a per-device route as "no such device".
    /// A 404 that carries an `error` message keeps the server's wording.
    pub(crate) fn for_device(self, id: &DeviceId) -> Self {
        match self {
            Self::Api {
                status: Some(404),
                from_server: false,
                ..
            } => Self::DeviceNotFound {
                identifier: id.to_string(),
            },
            other => other,
        }
    }

    /// The message the server put in its error body, if any.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::Api {
                message,
                from_server: true,
                ..
            } => Some(message),
            _ => None,
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<netpulse_api::Error> for CoreError {
    fn from(err: netpulse_api::Error) -> Self {
        match err {
            netpulse_api::Error::Transport(ref e) => {
                if let Some(status) = e.status() {
                    CoreError::Api {
                        message: e.to_string(),
                        from_server: false,
                        status: Some(status.as_u16()),
                    }
                } else {
                    CoreError::ConnectionFailed {
                        reason: e.to_string(),
                    }
                }
            }
            netpulse_api::Error::Tls(msg) => CoreError::ConnectionFailed {
                reason: format!("TLS error: {msg}"),
            },
            netpulse_api::Error::WebSocketConnect(reason) => CoreError::ConnectionFailed {
                reason: format!("push channel: {reason}"),
            },
            netpulse_api::Error::WebSocketClosed { code, reason } => CoreError::ConnectionFailed {
                reason: format!("push channel closed (code {code}): {reason}"),
            },
            netpulse_api::Error::InvalidId { id } => CoreError::ValidationFailed {
                message: format!("device id {id:?} cannot be addressed"),
            },
            netpulse_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            netpulse_api::Error::Api { status, message } => match message {
                Some(message) => CoreError::Api {
                    message,
                    from_server: true,
                    status: Some(status),
                },
                None => CoreError::Api {
                    message: format!("HTTP {status}"),
                    from_server: false,
                    status: Some(status),
                },
            },
            netpulse_api::Error::UnknownEvent { name } => {
                CoreError::Internal(format!("unknown push event `{name}`"))
            }
            netpulse_api::Error::Deserialization { message, body: _ } => CoreError::Api {
                message: format!("unexpected response: {message}"),
                from_server: false,
                status: None,
            },
        }
    }
}
