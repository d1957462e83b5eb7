// ── Core error types ──
//
// Failure taxonomy for sampling, polling and export. Geometry never
// fails: degenerate paths resolve to fallback geometry instead.

use std::path::PathBuf;

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Per-entity errors (isolated to the offending entity) ────────
    #[error("Invalid {entity}: {message}")]
    Validation { entity: String, message: String },

    #[error("Probe failed for {target}: {message}")]
    Probe { target: String, message: String },

    #[error("Probe for {target} timed out after {timeout_ms}ms")]
    ProbeTimeout { target: String, timeout_ms: u64 },

    // ── Loop errors ──────────────────────────────────────────────────
    #[error("Poll cycle failed: {0}")]
    Orchestration(String),

    #[error("Poll loop is not running")]
    PollerStopped,

    // ── Export errors ────────────────────────────────────────────────
    #[error("Failed to write snapshot {}: {source}", path.display())]
    Export {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl CoreError {
    /// Wrap a transport-layer error for the given target.
    pub fn probe(target: &str, err: &linkwatch_api::Error) -> Self {
        match err {
            linkwatch_api::Error::Timeout { timeout_ms } => Self::ProbeTimeout {
                target: target.to_owned(),
                timeout_ms: *timeout_ms,
            },
            other => Self::Probe {
                target: target.to_owned(),
                message: other.to_string(),
            },
        }
    }
}
