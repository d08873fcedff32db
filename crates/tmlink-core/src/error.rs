// ── Core error types ──
//
// `CoreError` is what the controller client seam returns: transport details
// from `tmlink-api` translated into domain terms. `SessionError` is the
// session-level taxonomy that decides which status the host sees.

use std::fmt;

use thiserror::Error;

use crate::surface::SessionStatus;

/// Unified error type for controller operations.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot connect to controller at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Controller connection timed out")]
    Timeout,

    // ── Data errors ──────────────────────────────────────────────────
    #[error("Entity not found: {entity_type} {identifier}")]
    NotFound {
        entity_type: String,
        identifier: String,
    },

    // ── Operation errors ─────────────────────────────────────────────
    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },

    #[error("API error: {message}")]
    Api {
        message: String,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<tmlink_api::Error> for CoreError {
    fn from(err: tmlink_api::Error) -> Self {
        match err {
            tmlink_api::Error::Authentication { message } => {
                CoreError::AuthenticationFailed { message }
            }
            tmlink_api::Error::CredentialsExpired { expired_at } => {
                CoreError::AuthenticationFailed {
                    message: format!("client credentials expired at {expired_at}"),
                }
            }
            tmlink_api::Error::InvalidHeader { header } => CoreError::Config {
                message: format!("value for {header} is not a valid header"),
            },
            tmlink_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout
                } else if e.is_connect() {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map(ToString::to_string)
                            .unwrap_or_else(|| "<unknown>".into()),
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Api {
                        message: e.to_string(),
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            tmlink_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            tmlink_api::Error::ClientBuild(msg) => CoreError::Internal(msg),
            tmlink_api::Error::Api { status, message } => match status {
                401 | 403 => CoreError::AuthenticationFailed { message },
                404 => CoreError::NotFound {
                    entity_type: "resource".into(),
                    identifier: message,
                },
                _ => CoreError::Api {
                    message,
                    status: Some(status),
                },
            },
            tmlink_api::Error::WebSocketConnect(reason) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("WebSocket connection failed: {reason}"),
            },
            tmlink_api::Error::Deserialization { message, body: _ } => {
                CoreError::Internal(format!("Deserialization error: {message}"))
            }
        }
    }
}

// ── Session errors ───────────────────────────────────────────────────

/// The step of session establishment (or a later request) that failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionStep {
    Authenticate,
    ListFieldSets,
    FetchFields { field_set: String },
    Subscribe { field_set: String },
    Command { field_set: String },
}

impl fmt::Display for SessionStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Authenticate => f.write_str("Connection to controller"),
            Self::ListFieldSets => f.write_str("Getting field sets"),
            Self::FetchFields { field_set } => write!(f, "Finding fields for {field_set}"),
            Self::Subscribe { field_set } => write!(f, "Connecting to field set {field_set}"),
            Self::Command { field_set } => write!(f, "Sending command to {field_set}"),
        }
    }
}

/// Errors surfaced by the session manager.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Required configuration is missing or malformed. Never retried.
    #[error("{message}")]
    BadConfig { message: String },

    /// The configured field set does not exist on the controller.
    #[error("Finding field set {name} failed: not found")]
    ResourceNotFound { name: String },

    #[error("{step} failed: {source}")]
    Transport {
        step: SessionStep,
        #[source]
        source: CoreError,
    },

    #[error("not connected to a field set")]
    NotConnected,

    #[error("no active field to target")]
    NoActiveField,

    /// The session task is no longer running.
    #[error("session has stopped")]
    Closed,
}

impl SessionError {
    pub(crate) fn bad_config(message: impl Into<String>) -> Self {
        Self::BadConfig {
            message: message.into(),
        }
    }

    /// The host status a failed session attempt settles in.
    pub fn status(&self) -> SessionStatus {
        match self {
            Self::BadConfig { .. } => SessionStatus::BadConfig,
            _ => SessionStatus::ConnectionFailure,
        }
    }
}
