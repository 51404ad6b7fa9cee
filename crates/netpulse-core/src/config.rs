// ── Runtime polling configuration ──
//
// These types describe *how* to poll. They carry credentials and timing
// but never touch disk; `netpulse-config` builds them from files and env.

use std::collections::HashMap;
use std::time::Duration;

use secrecy::SecretString;

pub use netpulse_api::snmp::TransportConfig;

/// Where CPU load comes from.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CpuSource {
    /// Walk `hrProcessorLoad` and average every row.
    #[default]
    ProcessorWalk,
    /// Point-query these `hrProcessorLoad` rows only.
    Indices(Vec<u32>),
}

/// How the RAM row of `hrStorageTable` is located.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MemorySource {
    /// Walk `hrStorageDescr` and take the first RAM-looking row.
    #[default]
    StorageWalk,
    /// Use this `hrStorageIndex` directly.
    FixedIndex(u32),
}

/// Community strings: a default plus per-device overrides keyed by the
/// device's display name.
#[derive(Debug, Clone)]
pub struct Credentials {
    default: SecretString,
    overrides: HashMap<String, SecretString>,
}

impl Credentials {
    pub fn new(default: SecretString) -> Self {
        Self {
            default,
            overrides: HashMap::new(),
        }
    }

    pub fn with_override(mut self, device_name: impl Into<String>, community: SecretString) -> Self {
        self.overrides.insert(device_name.into(), community);
        self
    }

    pub fn community_for(&self, device_name: &str) -> &SecretString {
        self.overrides.get(device_name).unwrap_or(&self.default)
    }
}

impl Default for Credentials {
    fn default() -> Self {
        Self::new(SecretString::from("public".to_owned()))
    }
}

/// Everything the poller needs besides its collaborators.
#[derive(Debug, Clone)]
pub struct PollerConfig {
    pub poll_interval: Duration,
    /// Pause after a cycle that failed as a whole.
    pub error_backoff: Duration,
    /// Upper bound on `Poller::stop`.
    pub shutdown_timeout: Duration,
    pub transport: TransportConfig,
    /// Maximum GET-NEXT steps per table walk.
    pub walk_limit: usize,
    pub cpu_source: CpuSource,
    pub memory_source: MemorySource,
    pub credentials: Credentials,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(30),
            error_backoff: Duration::from_secs(5),
            shutdown_timeout: Duration::from_secs(10),
            transport: TransportConfig::default(),
            walk_limit: 100,
            cpu_source: CpuSource::default(),
            memory_source: MemorySource::default(),
            credentials: Credentials::default(),
        }
    }
}
