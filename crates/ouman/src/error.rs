//! CLI error types with miette diagnostics.
//!
//! Maps `ouman_api::Error` and `ConfigError` into user-facing errors with
//! actionable help text and distinct exit codes.

use miette::Diagnostic;
use thiserror::Error;

use ouman_api::{CommunicationError, Error as ApiError};
use ouman_config::ConfigError;

/// Process exit codes.
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

    #[error("Could not communicate with the device: {reason}")]
    #[diagnostic(
        code(ouman::connection_failed),
        help(
            "Check that the controller is powered and reachable.\n\
             Try: ouman --address <host> -v values"
        )
    )]
    ConnectionFailed { reason: String },

    #[error("Request timed out after {seconds}s")]
    #[diagnostic(
        code(ouman::timeout),
        help("Increase timeout with --timeout or check the device's network link.")
    )]
    Timeout { seconds: u64 },

    // ── Authentication ───────────────────────────────────────────────

    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(ouman::auth_failed),
        help("Check the username and the OUMAN_PASSWORD / password_env setting.")
    )]
    AuthFailed { message: String },

    #[error("No credentials configured for profile '{profile}'")]
    #[diagnostic(
        code(ouman::no_credentials),
        help(
            "Set a username and password_env in the profile, or export\n\
             OUMAN_USERNAME and OUMAN_PASSWORD."
        )
    )]
    NoCredentials { profile: String },

    // ── Configuration ────────────────────────────────────────────────

    #[error("No device configured")]
    #[diagnostic(
        code(ouman::no_config),
        help("Pass --address, or add a profile to {path}")
    )]
    NoConfig { path: String },

    #[error("Profile '{name}' not found")]
    #[diagnostic(code(ouman::profile_not_found), help("Available profiles: {available}"))]
    ProfileNotFound { name: String, available: String },

    #[error("Configuration error: {0}")]
    #[diagnostic(code(ouman::config))]
    Config(#[from] ConfigError),

    // ── Input ────────────────────────────────────────────────────────

    #[error("Invalid {field}: {reason}")]
    #[diagnostic(code(ouman::validation))]
    Validation { field: String, reason: String },

    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(ouman::not_found),
        help("List available entries with: ouman {list_command}")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    // ── Device ───────────────────────────────────────────────────────

    #[error("Unexpected response from device: {message}")]
    #[diagnostic(code(ouman::protocol))]
    Protocol { message: String },

    #[error("{message}")]
    #[diagnostic(code(ouman::internal))]
    Internal { message: String },
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::Validation { .. } => exit_code::USAGE,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::NoConfig { .. }
            | Self::ProfileNotFound { .. }
            | Self::Config(_)
            | Self::Protocol { .. }
            | Self::Internal { .. } => exit_code::GENERAL,
        }
    }

    /// Convert a config error, lifting the variants the CLI reports specially.
    pub fn from_config(err: ConfigError, available: impl FnOnce() -> String) -> Self {
        match err {
            ConfigError::NoCredentials { profile } => Self::NoCredentials { profile },
            ConfigError::UnknownProfile { profile } => Self::ProfileNotFound {
                name: profile,
                available: available(),
            },
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            other => Self::Config(other),
        }
    }
}

// ── ouman_api::Error → CliError mapping ──────────────────────────────

impl From<ApiError> for CliError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Authentication { message } => Self::AuthFailed { message },

            ApiError::Communication(CommunicationError::Timeout { timeout_secs }) => {
                Self::Timeout {
                    seconds: timeout_secs,
                }
            }

            ApiError::Communication(other) => Self::ConnectionFailed {
                reason: other.to_string(),
            },

            ApiError::InvalidUrl(e) => Self::Validation {
                field: "address".into(),
                reason: e.to_string(),
            },

            ApiError::Protocol { message } => Self::Protocol { message },

            ApiError::Validation(e) => Self::Validation {
                field: "value".into(),
                reason: e.to_string(),
            },

            ApiError::ClientBuild { message } | ApiError::Configuration { message } => {
                Self::Internal { message }
            }
        }
    }
}
