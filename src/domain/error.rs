//! Typed errors for the reconciliation cycle.
//!
//! All error types implement `thiserror::Error`. Transient failures wrap
//! `anyhow::Error` so infrastructure adapters can attach context with `?`.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that abort a single reconciliation cycle.
///
/// The loop itself never dies on a `CycleError`: the cycle is abandoned,
/// the error is logged, and the next scheduled tick proceeds normally.
#[derive(Debug, Error)]
pub enum CycleError {
    /// The checkout path is occupied by something that is not a directory.
    /// Requires operator intervention; retried on the next tick.
    #[error("checkout path {0} exists but is not a directory")]
    CheckoutNotADirectory(PathBuf),

    /// The agent's own container has no bind mount at the internal data
    /// directory. Requires operator intervention; retried on the next tick.
    #[error("no mount with destination {destination} on container '{container}'")]
    DataMountMissing {
        container: String,
        destination: String,
    },

    /// Network, runtime, or apply-tool failure. Expected to clear on its
    /// own; the fixed polling interval is the retry mechanism.
    #[error(transparent)]
    Transient(#[from] anyhow::Error),
}

impl CycleError {
    /// `true` for misconfigurations an operator must fix, as opposed to
    /// transient failures that the next tick may not see.
    #[must_use]
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            CycleError::CheckoutNotADirectory(_) | CycleError::DataMountMissing { .. }
        )
    }
}
