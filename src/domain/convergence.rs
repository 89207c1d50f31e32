//! Convergence evaluation for bounded restart waits.

use std::collections::HashMap;

/// Container status string the runtime reports for a live container.
pub const RUNNING: &str = "running";

/// Terminal result of a restart-and-await operation.
///
/// This is a liveness wait, not a transaction: on timeout nothing is rolled
/// back, and the caller decides on follow-up action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestartOutcome {
    /// Every requested service reported `running` before the deadline.
    Converged,
    /// The deadline elapsed; `stragglers` are the requested services that
    /// were still not running in the last status sample taken.
    TimedOut { stragglers: Vec<String> },
}

/// Names from `requested` that do not report [`RUNNING`] in `statuses`.
///
/// A name absent from `statuses` counts as not running. Order follows
/// `requested`.
#[must_use]
pub fn stragglers(requested: &[String], statuses: &HashMap<String, String>) -> Vec<String> {
    requested
        .iter()
        .filter(|name| statuses.get(*name).map(String::as_str) != Some(RUNNING))
        .cloned()
        .collect()
}
