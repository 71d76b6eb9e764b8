//! CLI error types with miette diagnostics.
//!
//! Maps API and config errors into user-facing errors with actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use aircontrol_api::ErrorKind;
use aircontrol_config::ConfigError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────

    #[error("Cannot connect to AirControlBase at {url}")]
    #[diagnostic(
        code(aircontrol::cannot_connect),
        help(
            "Check your network connection and that the service is reachable.\n\
             URL: {url}\n\
             Run with -vv for request details."
        )
    )]
    ConnectionFailed {
        url: String,
        #[source]
        source: aircontrol_api::Error,
    },

    #[error("Request timed out after {seconds}s")]
    #[diagnostic(
        code(aircontrol::timeout),
        help("Increase the timeout with --timeout or try again later.")
    )]
    Timeout { seconds: u64 },

    // ── Authentication ───────────────────────────────────────────────

    #[error("Invalid credentials: {message}")]
    #[diagnostic(
        code(aircontrol::invalid_auth),
        help(
            "Verify the email and password for profile '{profile}'.\n\
             Run: aircontrol config set-password --profile {profile}"
        )
    )]
    AuthFailed { profile: String, message: String },

    #[error("No credentials configured for profile '{profile}'")]
    #[diagnostic(
        code(aircontrol::no_credentials),
        help(
            "Configure credentials with: aircontrol config init\n\
             Or set AIRCONTROL_EMAIL and AIRCONTROL_PASSWORD."
        )
    )]
    NoCredentials { profile: String },

    // ── API ──────────────────────────────────────────────────────────

    #[error("API error ({code}): {message}")]
    #[diagnostic(code(aircontrol::api_error))]
    ApiError { code: String, message: String },

    // ── Validation ───────────────────────────────────────────────────

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(aircontrol::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────

    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(aircontrol::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: aircontrol config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("Configuration file not found")]
    #[diagnostic(
        code(aircontrol::no_config),
        help(
            "Create one with: aircontrol config init\n\
             Or pass --email with AIRCONTROL_PASSWORD set.\n\
             Expected at: {path}"
        )
    )]
    NoConfig { path: String },

    #[error(transparent)]
    #[diagnostic(code(aircontrol::config))]
    Config(Box<ConfigError>),

    // ── IO / Serialization ────────────────────────────────────────────

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON payload: {0}")]
    #[diagnostic(code(aircontrol::json), help("Check the JSON text or file contents and try again."))]
    Json(#[from] serde_json::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::Validation { .. } | Self::Json(_) => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }

    /// Classify an API error: credentials, connectivity, or anything else.
    pub fn from_api(err: aircontrol_api::Error, profile: &str, url: &str) -> Self {
        if let aircontrol_api::Error::Timeout { timeout_secs } = err {
            return Self::Timeout {
                seconds: timeout_secs,
            };
        }

        match err.kind() {
            ErrorKind::Auth => Self::AuthFailed {
                profile: profile.into(),
                message: match err {
                    aircontrol_api::Error::Authentication { message } => message,
                    other => other.to_string(),
                },
            },
            ErrorKind::Connection => Self::ConnectionFailed {
                url: url.into(),
                source: err,
            },
            ErrorKind::Api => Self::ApiError {
                code: err.api_error_code().unwrap_or("unknown").to_owned(),
                message: match err {
                    aircontrol_api::Error::Api { message, .. } => message,
                    other => other.to_string(),
                },
            },
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::NoCredentials { profile } => Self::NoCredentials { profile },
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            other => Self::Config(Box::new(other)),
        }
    }
}
