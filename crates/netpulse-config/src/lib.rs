//! Configuration for netpulse.
//!
//! One TOML file layered under `NETPULSE_` environment variables, plus
//! credential resolution (env var, then plaintext) and translation into
//! the runtime types of `netpulse-core` and `netpulse-api`.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use netpulse_api::influx::InfluxConfig;
use netpulse_core::{
    CpuSource, Credentials, DeviceDescriptor, MemorySource, PollerConfig, StaticInventory,
    TransportConfig,
};

/// Community used when neither the environment nor the file names one.
pub const FALLBACK_COMMUNITY: &str = "public";

const REDACTED: &str = "********";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no credentials configured for {service}")]
    NoCredentials { service: String },

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

fn invalid(field: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Validation {
        field: field.into(),
        reason: reason.into(),
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub poller: PollerSection,

    #[serde(default)]
    pub snmp: SnmpSection,

    #[serde(default)]
    pub credentials: CredentialsSection,

    #[serde(default)]
    pub influx: InfluxSection,

    /// Devices to poll. Empty means the built-in demo inventory.
    #[serde(default)]
    pub devices: Vec<DeviceDescriptor>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PollerSection {
    #[serde(default = "default_interval")]
    pub interval_secs: u64,

    #[serde(default = "default_error_backoff")]
    pub error_backoff_secs: u64,

    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_secs: u64,

    #[serde(default = "default_walk_limit")]
    pub walk_limit: usize,

    /// Fixed `hrProcessorLoad` rows. Absent means walk the table.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpu_indices: Option<Vec<u32>>,

    /// Fixed `hrStorageTable` row for RAM. Absent means search by
    /// description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory_index: Option<u32>,
}

impl Default for PollerSection {
    fn default() -> Self {
        Self {
            interval_secs: default_interval(),
            error_backoff_secs: default_error_backoff(),
            shutdown_timeout_secs: default_shutdown_timeout(),
            walk_limit: default_walk_limit(),
            cpu_indices: None,
            memory_index: None,
        }
    }
}

fn default_interval() -> u64 {
    30
}
fn default_error_backoff() -> u64 {
    5
}
fn default_shutdown_timeout() -> u64 {
    10
}
fn default_walk_limit() -> usize {
    100
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SnmpSection {
    /// Per-attempt timeout.
    #[serde(default = "default_snmp_timeout")]
    pub timeout_ms: u64,

    #[serde(default = "default_retries")]
    pub retries: u32,
}

impl Default for SnmpSection {
    fn default() -> Self {
        Self {
            timeout_ms: default_snmp_timeout(),
            retries: default_retries(),
        }
    }
}

fn default_snmp_timeout() -> u64 {
    2000
}
fn default_retries() -> u32 {
    1
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CredentialsSection {
    /// Default community (plaintext, prefer `community_env`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub community: Option<String>,

    /// Environment variable holding the default community.
    #[serde(default = "default_community_env", skip_serializing_if = "Option::is_none")]
    pub community_env: Option<String>,

    /// Per-device communities keyed by device name.
    #[serde(default)]
    pub overrides: HashMap<String, String>,
}

impl Default for CredentialsSection {
    fn default() -> Self {
        Self {
            community: None,
            community_env: default_community_env(),
            overrides: HashMap::new(),
        }
    }
}

#[allow(clippy::unnecessary_wraps)]
fn default_community_env() -> Option<String> {
    Some("SNMP_COMMUNITY".into())
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct InfluxSection {
    #[serde(default = "default_influx_url")]
    pub url: String,

    #[serde(default = "default_influx_org")]
    pub org: String,

    #[serde(default = "default_influx_bucket")]
    pub bucket: String,

    /// API token (plaintext, prefer `token_env`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// Environment variable holding the API token.
    #[serde(default = "default_token_env", skip_serializing_if = "Option::is_none")]
    pub token_env: Option<String>,

    #[serde(default = "default_influx_timeout")]
    pub timeout_secs: u64,
}

impl Default for InfluxSection {
    fn default() -> Self {
        Self {
            url: default_influx_url(),
            org: default_influx_org(),
            bucket: default_influx_bucket(),
            token: None,
            token_env: default_token_env(),
            timeout_secs: default_influx_timeout(),
        }
    }
}

fn default_influx_url() -> String {
    "http://localhost:8086".into()
}
fn default_influx_org() -> String {
    "netpulse".into()
}
fn default_influx_bucket() -> String {
    "metrics".into()
}
#[allow(clippy::unnecessary_wraps)]
fn default_token_env() -> Option<String> {
    Some("INFLUXDB_TOKEN".into())
}
fn default_influx_timeout() -> u64 {
    10
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("org", "netpulse", "netpulse").map_or_else(
        || {
            let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
            p.push(".config");
            p.push("netpulse");
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

// ── Config loading ──────────────────────────────────────────────────

/// The provider stack: defaults, then the TOML file, then `NETPULSE_`
/// variables (`NETPULSE_SNMP__RETRIES=3` sets `snmp.retries`).
pub fn figment(path: &Path) -> Figment {
    Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("NETPULSE_").split("__"))
}

/// Load the configuration. An explicit `path` must exist; the default
/// location may be absent.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let path = match path {
        Some(explicit) => {
            if !explicit.is_file() {
                return Err(ConfigError::Io(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("config file not found: {}", explicit.display()),
                )));
            }
            explicit.to_path_buf()
        }
        None => config_path(),
    };
    debug!(path = %path.display(), "loading configuration");

    let config: Config = figment(&path).extract()?;
    Ok(config)
}

// ── Translation ─────────────────────────────────────────────────────

impl Config {
    /// Parse a config from TOML text alone, without file or environment.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let config = Figment::new()
            .merge(Serialized::defaults(Self::default()))
            .merge(Toml::string(text))
            .extract()?;
        Ok(config)
    }

    /// Build the runtime poller configuration, resolving communities from
    /// the process environment.
    pub fn poller_config(&self) -> Result<PollerConfig, ConfigError> {
        self.poller_config_with(|name| std::env::var(name).ok())
    }

    /// Like [`poller_config`](Self::poller_config) with an injectable
    /// environment lookup.
    pub fn poller_config_with(
        &self,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<PollerConfig, ConfigError> {
        let p = &self.poller;
        if p.interval_secs == 0 {
            return Err(invalid("poller.interval_secs", "must be at least 1"));
        }
        if p.walk_limit == 0 {
            return Err(invalid("poller.walk_limit", "must be at least 1"));
        }
        if self.snmp.timeout_ms == 0 {
            return Err(invalid("snmp.timeout_ms", "must be at least 1"));
        }

        let cpu_source = match &p.cpu_indices {
            Some(indices) if indices.is_empty() => {
                return Err(invalid("poller.cpu_indices", "must not be empty"));
            }
            Some(indices) => CpuSource::Indices(indices.clone()),
            None => CpuSource::ProcessorWalk,
        };
        let memory_source = p
            .memory_index
            .map_or(MemorySource::StorageWalk, MemorySource::FixedIndex);

        Ok(PollerConfig {
            poll_interval: Duration::from_secs(p.interval_secs),
            error_backoff: Duration::from_secs(p.error_backoff_secs),
            shutdown_timeout: Duration::from_secs(p.shutdown_timeout_secs),
            transport: TransportConfig {
                timeout: Duration::from_millis(self.snmp.timeout_ms),
                retries: self.snmp.retries,
            },
            walk_limit: p.walk_limit,
            cpu_source,
            memory_source,
            credentials: self.resolve_credentials(env),
        })
    }

    /// Default community: `community_env` variable, then plaintext, then
    /// [`FALLBACK_COMMUNITY`]. Overrides are taken as written.
    fn resolve_credentials(&self, env: impl Fn(&str) -> Option<String>) -> Credentials {
        let section = &self.credentials;
        let default = section
            .community_env
            .as_deref()
            .and_then(&env)
            .filter(|v| !v.is_empty())
            .or_else(|| section.community.clone())
            .unwrap_or_else(|| FALLBACK_COMMUNITY.to_owned());

        section.overrides.iter().fold(
            Credentials::new(SecretString::from(default)),
            |creds, (name, community)| {
                creds.with_override(name.clone(), SecretString::from(community.clone()))
            },
        )
    }

    /// The configured devices, or the demo pair when none are configured.
    /// Device ids must be unique.
    pub fn inventory(&self) -> Result<StaticInventory, ConfigError> {
        if self.devices.is_empty() {
            debug!("no devices configured, using demo inventory");
            return Ok(StaticInventory::demo());
        }

        let mut seen = HashSet::new();
        for device in &self.devices {
            if !seen.insert(device.id.as_str()) {
                return Err(invalid(
                    "devices",
                    format!("duplicate device id '{}'", device.id),
                ));
            }
            if device.interface_index == 0 {
                return Err(invalid(
                    "devices",
                    format!("device '{}' has interface_index 0", device.id),
                ));
            }
        }
        Ok(StaticInventory::new(self.devices.clone()))
    }

    /// InfluxDB settings, or `None` when no token is available (the sink
    /// is then disabled).
    pub fn influx_config(&self) -> Result<Option<InfluxConfig>, ConfigError> {
        self.influx_config_with(|name| std::env::var(name).ok())
    }

    pub fn influx_config_with(
        &self,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Option<InfluxConfig>, ConfigError> {
        let section = &self.influx;
        let token = section
            .token_env
            .as_deref()
            .and_then(&env)
            .filter(|v| !v.is_empty())
            .or_else(|| section.token.clone());
        let Some(token) = token else {
            return Ok(None);
        };

        let url = section
            .url
            .parse()
            .map_err(|e| invalid("influx.url", format!("'{}': {e}", section.url)))?;
        if section.bucket.is_empty() {
            return Err(invalid("influx.bucket", "must not be empty"));
        }

        Ok(Some(InfluxConfig {
            url,
            org: section.org.clone(),
            bucket: section.bucket.clone(),
            token: SecretString::from(token),
            timeout: Duration::from_secs(section.timeout_secs),
        }))
    }

    /// Like [`influx_config`](Self::influx_config) for callers that cannot
    /// run without the database.
    pub fn require_influx(&self) -> Result<InfluxConfig, ConfigError> {
        self.influx_config()?
            .ok_or_else(|| ConfigError::NoCredentials {
                service: "InfluxDB (set influx.token or INFLUXDB_TOKEN)".into(),
            })
    }

    /// Render as TOML with plaintext secrets masked.
    pub fn to_redacted_toml(&self) -> Result<String, ConfigError> {
        let mut shown = self.clone();
        if shown.credentials.community.is_some() {
            shown.credentials.community = Some(REDACTED.into());
        }
        for value in shown.credentials.overrides.values_mut() {
            REDACTED.clone_into(value);
        }
        if shown.influx.token.is_some() {
            shown.influx.token = Some(REDACTED.into());
        }
        Ok(toml::to_string_pretty(&shown)?)
    }
}
