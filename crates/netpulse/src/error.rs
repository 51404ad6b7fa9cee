//! CLI error types with miette diagnostics.
//!
//! Maps library errors into user-facing errors with actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use netpulse_config::ConfigError;
use netpulse_core::CoreError;

pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const CONNECTION: i32 = 7;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Configuration ────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(
        code(netpulse::validation),
        help("Fix the value in your config file or the matching NETPULSE_ variable.")
    )]
    Validation { field: String, reason: String },

    #[error("No credentials configured for {service}")]
    #[diagnostic(
        code(netpulse::no_credentials),
        help("Add the token to the [influx] section or export it in the environment.")
    )]
    NoCredentials { service: String },

    #[error("Could not load configuration")]
    #[diagnostic(
        code(netpulse::config),
        help("Run: netpulse config path  to see which file is read.")
    )]
    Config(#[source] ConfigError),

    // ── Engine ───────────────────────────────────────────────────────
    #[error(transparent)]
    #[diagnostic(code(netpulse::core))]
    Core(#[from] CoreError),

    #[error("Could not reach InfluxDB at {url}")]
    #[diagnostic(
        code(netpulse::influx_unreachable),
        help("Check influx.url and that the server is running.")
    )]
    InfluxUnreachable {
        url: String,
        #[source]
        source: netpulse_api::Error,
    },

    #[error(transparent)]
    #[diagnostic(code(netpulse::api))]
    Api(#[from] netpulse_api::Error),

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Could not render JSON: {0}")]
    #[diagnostic(code(netpulse::json))]
    Json(#[from] serde_json::Error),
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            ConfigError::NoCredentials { service } => Self::NoCredentials { service },
            other => Self::Config(other),
        }
    }
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Validation { .. } => exit_code::USAGE,
            Self::NoCredentials { .. } => exit_code::AUTH,
            Self::InfluxUnreachable { .. } => exit_code::CONNECTION,
            _ => exit_code::GENERAL,
        }
    }
}
