//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` variants into user-facing errors with actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use holectl_config::ConfigError;
use holectl_core::{CoreError, ErrorKind};

/// Process exit codes.
pub mod exit_code {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Pi-hole failures ─────────────────────────────────────────────
    #[error("{message}")]
    #[diagnostic(
        code(holectl::connection_failed),
        help("Check that the Pi-hole is running and reachable over HTTP from this machine.")
    )]
    ConnectionFailed { message: String },

    #[error("{message}")]
    #[diagnostic(
        code(holectl::timeout),
        help("Increase the timeout with --timeout or check the Pi-hole's responsiveness.")
    )]
    Timeout { message: String },

    #[error("{message}")]
    #[diagnostic(
        code(holectl::auth_failed),
        help(
            "Pi-hole v6 expects an App Password (Settings > Web interface / API).\n\
             Pi-hole v5 expects the API token (Settings > API).\n\
             Store it with: holectl config set-password"
        )
    )]
    AuthFailed { message: String },

    #[error("{message}")]
    #[diagnostic(code(holectl::api_error))]
    ApiError { message: String },

    // ── Setup ────────────────────────────────────────────────────────
    #[error("No Pi-hole host configured")]
    #[diagnostic(
        code(holectl::no_host),
        help(
            "Pass --host, set HOLECTL_HOST, or add a profile:\n\
             holectl config set host 10.0.0.5\n\
             Config file: {path}"
        )
    )]
    NoHost { path: String },

    #[error("No App Password/API Key configured for profile '{profile}'")]
    #[diagnostic(
        code(holectl::no_credentials),
        help(
            "Pass --password, set HOLECTL_PASSWORD, or run:\n\
             holectl config set-password --profile {profile}"
        )
    )]
    NoCredentials { profile: String },

    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(holectl::profile_not_found),
        help("Available profiles: {available}")
    )]
    ProfileNotFound { name: String, available: String },

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(holectl::validation))]
    Validation { field: String, reason: String },

    #[error(transparent)]
    #[diagnostic(code(holectl::config))]
    Config(ConfigError),

    // ── IO ───────────────────────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::NoHost { .. } | Self::Validation { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::NoCredentials { profile } => CliError::NoCredentials { profile },
            ConfigError::ProfileNotFound { name } => CliError::ProfileNotFound {
                name,
                available: "(none)".into(),
            },
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            other => CliError::Config(other),
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        let message = err.to_string();
        if err.is_input() {
            let field = if matches!(err, CoreError::InvalidHost) {
                "host"
            } else {
                "password"
            };
            return CliError::Validation {
                field: field.into(),
                reason: message,
            };
        }
        if err.is_auth() {
            return CliError::AuthFailed { message };
        }
        match err.kind() {
            Some(ErrorKind::NetworkUnreachable) => CliError::ConnectionFailed { message },
            Some(ErrorKind::Timeout) => CliError::Timeout { message },
            _ => CliError::ApiError { message },
        }
    }
}
