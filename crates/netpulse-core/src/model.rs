// ── Domain types ──
//
// What a device is (descriptor) and what one poll of it produced (result).

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use netpulse_api::snmp::oids;

use crate::error::CoreError;

// ── Endpoint ─────────────────────────────────────────────────────────

/// Network address of an agent: host (name or literal) plus UDP port.
///
/// Parsed from `"host:port"`; a bare host gets [`Endpoint::DEFAULT_PORT`].
/// IPv6 literals are written `"[fe80::1]:1161"`, or bare with no port.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
}

impl Endpoint {
    pub const DEFAULT_PORT: u16 = 161;

    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

impl FromStr for Endpoint {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let input = s.trim();
        let invalid = |reason: &str| CoreError::InvalidEndpoint {
            input: s.to_owned(),
            reason: reason.to_owned(),
        };

        let (host, port) = if let Some(rest) = input.strip_prefix('[') {
            let (host, after) = rest
                .split_once(']')
                .ok_or_else(|| invalid("unterminated '['"))?;
            match after {
                "" => (host, None),
                _ => {
                    let port = after
                        .strip_prefix(':')
                        .ok_or_else(|| invalid("expected ':' after ']'"))?;
                    (host, Some(port))
                }
            }
        } else if input.matches(':').count() == 1 {
            let (host, port) = input.split_once(':').ok_or_else(|| invalid("missing ':'"))?;
            (host, Some(port))
        } else {
            // No colon, or an unbracketed IPv6 literal.
            (input, None)
        };

        if host.is_empty() {
            return Err(invalid("empty host"));
        }
        let port = match port {
            None => Self::DEFAULT_PORT,
            Some(p) => match p.parse::<u16>() {
                Ok(0) | Err(_) => return Err(invalid("port must be 1-65535")),
                Ok(port) => port,
            },
        };
        Ok(Self::new(host, port))
    }
}

impl TryFrom<String> for Endpoint {
    type Error = CoreError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Endpoint> for String {
    fn from(e: Endpoint) -> Self {
        e.to_string()
    }
}

// ── Device descriptor ────────────────────────────────────────────────

/// Declared role of a device in the inventory.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum DeviceType {
    Router,
    Switch,
    Firewall,
    Server,
    AccessPoint,
    #[default]
    #[serde(other)]
    Other,
}

/// Which octet counters to sample for bandwidth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum CounterWidth {
    /// `ifInOctets` / `ifOutOctets`
    #[default]
    Bits32,
    /// `ifHCInOctets` / `ifHCOutOctets`
    Bits64,
}

impl CounterWidth {
    /// One full counter cycle; added once when a delta goes negative.
    pub fn modulus(self) -> i128 {
        match self {
            Self::Bits32 => 1 << 32,
            Self::Bits64 => 1 << 64,
        }
    }

    pub fn in_column(self) -> &'static [u32] {
        match self {
            Self::Bits32 => oids::IF_IN_OCTETS,
            Self::Bits64 => oids::IF_HC_IN_OCTETS,
        }
    }

    pub fn out_column(self) -> &'static [u32] {
        match self {
            Self::Bits32 => oids::IF_OUT_OCTETS,
            Self::Bits64 => oids::IF_HC_OUT_OCTETS,
        }
    }
}

impl TryFrom<u8> for CounterWidth {
    type Error = String;

    fn try_from(bits: u8) -> Result<Self, Self::Error> {
        match bits {
            32 => Ok(Self::Bits32),
            64 => Ok(Self::Bits64),
            other => Err(format!("counter width must be 32 or 64, got {other}")),
        }
    }
}

impl From<CounterWidth> for u8 {
    fn from(w: CounterWidth) -> Self {
        match w {
            CounterWidth::Bits32 => 32,
            CounterWidth::Bits64 => 64,
        }
    }
}

fn default_interface_index() -> u32 {
    1
}

/// Static identity of a polled device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceDescriptor {
    /// Store key.
    pub id: String,
    pub name: String,
    pub endpoint: Endpoint,
    #[serde(default, rename = "type")]
    pub device_type: DeviceType,
    /// Interface whose octet counters feed the bandwidth metric.
    #[serde(default = "default_interface_index")]
    pub interface_index: u32,
    #[serde(default)]
    pub counter_width: CounterWidth,
}

impl DeviceDescriptor {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        endpoint: Endpoint,
        device_type: DeviceType,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            endpoint,
            device_type,
            interface_index: default_interface_index(),
            counter_width: CounterWidth::default(),
        }
    }

    pub fn with_interface(mut self, index: u32, width: CounterWidth) -> Self {
        self.interface_index = index;
        self.counter_width = width;
        self
    }
}

// ── Poll results ─────────────────────────────────────────────────────

/// Health classification of one poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
pub enum DeviceStatus {
    Online,
    Warning,
    Offline,
    Error,
}

/// Derived metrics for one poll.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsBundle {
    pub response_time_ms: f64,
    pub cpu_usage: f64,
    pub mem_usage: f64,
    /// Mbps.
    pub bandwidth_in: f64,
    /// Mbps.
    pub bandwidth_out: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uptime_secs: Option<u64>,
}

/// Identity values returned by the system-group query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemInfo {
    pub description: Option<String>,
    pub name: Option<String>,
    pub location: Option<String>,
    pub uptime_secs: Option<u64>,
    /// Vendor recognized from `sysObjectID`.
    pub vendor: Option<String>,
}

/// Outcome of polling one device once. Replaces the previous result for
/// the same key wholesale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollResult {
    pub device: DeviceDescriptor,
    pub status: DeviceStatus,
    pub metrics: Option<MetricsBundle>,
    pub system: Option<SystemInfo>,
    pub polled_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PollResult {
    /// Result for a device whose poll could not complete.
    pub fn failed(device: DeviceDescriptor, error: impl Into<String>) -> Self {
        Self {
            device,
            status: DeviceStatus::Error,
            metrics: None,
            system: None,
            polled_at: Utc::now(),
            error: Some(error.into()),
        }
    }

    pub fn key(&self) -> &str {
        &self.device.id
    }
}
