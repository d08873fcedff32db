//! CLI error types with miette diagnostics.
//!
//! Maps session and config errors into user-facing errors with actionable
//! help text and a process exit code.

use miette::Diagnostic;
use thiserror::Error;

use tmlink_config::ConfigError;
use tmlink_core::{CoreError, SessionError, SessionStep};

pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("{step} failed: {reason}")]
    #[diagnostic(
        code(tmlink::connection_failed),
        help("Check that the controller is running and reachable at the configured address.")
    )]
    ConnectionFailed { step: String, reason: String },

    #[error("Not connected to a field set")]
    #[diagnostic(code(tmlink::not_connected))]
    NotConnected,

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(tmlink::auth_failed),
        help(
            "Verify the API key, client id, client secret and expiration.\n\
             Store secrets with: tmlink config set-secret api-key"
        )
    )]
    AuthFailed { message: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("{message}")]
    #[diagnostic(
        code(tmlink::bad_config),
        help(
            "Fill in the profile in {path}\n\
             or pass --address, --api-key, --client-id, --client-secret and --client-expiration."
        )
    )]
    BadConfig { message: String, path: String },

    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(tmlink::profile_not_found),
        help("Available profiles: {available}")
    )]
    ProfileNotFound { name: String, available: String },

    #[error(transparent)]
    #[diagnostic(code(tmlink::config))]
    Config(ConfigError),

    // ── Resources ────────────────────────────────────────────────────
    #[error("Field set '{name}' not found")]
    #[diagnostic(
        code(tmlink::not_found),
        help("Run: tmlink fieldsets to see available field sets")
    )]
    FieldSetNotFound { name: String },

    #[error("{entity_type} '{identifier}' not found")]
    #[diagnostic(code(tmlink::not_found))]
    NotFound {
        entity_type: String,
        identifier: String,
    },

    #[error("No active field to target")]
    #[diagnostic(
        code(tmlink::no_active_field),
        help("Pass --field <ID>. Run: tmlink fields to list field ids")
    )]
    NoActiveField,

    // ── API ──────────────────────────────────────────────────────────
    #[error("Controller rejected the request: {message}")]
    #[diagnostic(code(tmlink::api_error))]
    ApiError { message: String },

    #[error("Session stopped unexpectedly")]
    #[diagnostic(code(tmlink::session_closed))]
    SessionClosed,

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(tmlink::validation))]
    Validation { field: String, reason: String },

    // ── Timeout ──────────────────────────────────────────────────────
    #[error("Timed out after {seconds}s waiting for {what}")]
    #[diagnostic(
        code(tmlink::timeout),
        help("Increase the timeout with --timeout or check controller responsiveness.")
    )]
    Timeout { what: String, seconds: u64 },

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Failed to render JSON: {0}")]
    #[diagnostic(code(tmlink::json))]
    Json(#[from] serde_json::Error),

    #[error("Failed to render TOML: {0}")]
    #[diagnostic(code(tmlink::toml))]
    Toml(#[from] toml::ser::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } | Self::NotConnected => exit_code::CONNECTION,
            Self::AuthFailed { .. } => exit_code::AUTH,
            Self::FieldSetNotFound { .. } | Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::BadConfig { .. } | Self::Validation { .. } | Self::NoActiveField => {
                exit_code::USAGE
            }
            _ => exit_code::GENERAL,
        }
    }

    fn from_core(step: &SessionStep, err: CoreError) -> Self {
        match err {
            CoreError::AuthenticationFailed { message } => CliError::AuthFailed { message },
            CoreError::NotFound {
                entity_type,
                identifier,
            } => CliError::NotFound {
                entity_type,
                identifier,
            },
            CoreError::ValidationFailed { message } => CliError::Validation {
                field: "command".into(),
                reason: message,
            },
            CoreError::Api { message, .. } if matches!(step, SessionStep::Command { .. }) => {
                CliError::ApiError { message }
            }
            other => CliError::ConnectionFailed {
                step: step.to_string(),
                reason: other.to_string(),
            },
        }
    }
}

// ── SessionError → CliError mapping ──────────────────────────────────

impl From<SessionError> for CliError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::BadConfig { message } => CliError::BadConfig {
                message,
                path: tmlink_config::config_path().display().to_string(),
            },
            SessionError::ResourceNotFound { name } => CliError::FieldSetNotFound { name },
            SessionError::Transport { step, source } => CliError::from_core(&step, source),
            SessionError::NotConnected => CliError::NotConnected,
            SessionError::NoActiveField => CliError::NoActiveField,
            SessionError::Closed => CliError::SessionClosed,
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::UnknownProfile { profile } => CliError::ProfileNotFound {
                name: profile,
                available: String::new(),
            },
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            other => CliError::Config(other),
        }
    }
}
