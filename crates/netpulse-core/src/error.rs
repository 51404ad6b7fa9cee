// ── Core error types ──
//
// Most device-level failures never surface as errors: the transport layer
// turns them into empty results and the orchestrator into zeroed metrics.
// What remains here is what callers of the library surface can act on.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Input errors ─────────────────────────────────────────────────
    #[error("Invalid endpoint '{input}': {reason}")]
    InvalidEndpoint { input: String, reason: String },

    #[error("Invalid query parameter: {value}")]
    InvalidQuery { value: String },

    // ── Collaborator errors ──────────────────────────────────────────
    #[error("Inventory unavailable: {message}")]
    Inventory { message: String },

    #[error("Metrics sink error: {message}")]
    Sink { message: String },

    // ── Lifecycle errors ─────────────────────────────────────────────
    #[error("Poller requires a running Tokio runtime")]
    NoRuntime,

    #[error("Polling {device} panicked: {message}")]
    Panicked { device: String, message: String },

    // ── Wire errors (wrapped) ────────────────────────────────────────
    #[error(transparent)]
    Api(#[from] netpulse_api::Error),
}
