use thiserror::Error;

/// Top-level error type for the `netpulse-api` crate.
///
/// Covers every failure mode across both wire surfaces:
/// SNMP datagram exchanges and the InfluxDB HTTP API.
/// `netpulse-core` decides which of these are soft failures.
#[derive(Debug, Error)]
pub enum Error {
    // ── SNMP transport ──────────────────────────────────────────────
    /// Socket-level failure (bind, send, receive).
    #[error("UDP transport error: {0}")]
    Io(#[from] std::io::Error),

    /// Host name did not resolve to any socket address.
    #[error("Could not resolve {host}")]
    Resolve { host: String },

    /// No matching response after every retry.
    #[error("No response after {attempts} attempt(s) of {timeout_ms}ms")]
    Timeout { attempts: u32, timeout_ms: u64 },

    /// The agent answered with a non-zero error-status.
    #[error("SNMP error-status {status} at varbind {index}")]
    Protocol { status: i64, index: i64 },

    // ── SNMP data ───────────────────────────────────────────────────
    /// BER decoding failed on an incoming datagram.
    #[error("Malformed SNMP message: {0}")]
    Decode(String),

    /// Identifier string could not be parsed.
    #[error("Invalid object identifier '{0}'")]
    InvalidOid(String),

    // ── InfluxDB ────────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Non-success response from the InfluxDB API.
    #[error("InfluxDB error (HTTP {status}): {message}")]
    Influx { status: u16, message: String },

    /// Query response body was not the expected CSV shape.
    #[error("Malformed query result: {0}")]
    Csv(String),
}

impl Error {
    /// Returns `true` if the device simply did not answer in time.
    pub fn is_timeout(&self) -> bool {
        match self {
            Self::Timeout { .. } => true,
            Self::Http(e) => e.is_timeout(),
            _ => false,
        }
    }

    /// Returns `true` for failures that retrying later could resolve.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Timeout { .. } | Self::Io(_) | Self::Resolve { .. } => true,
            Self::Http(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }
}
