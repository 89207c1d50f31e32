//! Health aggregation types and pure evaluation.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::domain::convergence::RUNNING;

/// Status reported for a required service that the runtime does not know.
pub const NOT_FOUND: &str = "not found";

/// Result of probing an external health endpoint.
#[derive(Debug, Clone)]
pub struct ProbeResult {
    /// Label under which a failed probe appears in the failed list.
    pub name: String,
    /// Whether the endpoint answered and matched the expected status.
    pub healthy: bool,
}

/// Aggregate health of the managed stack.
#[derive(Debug, Serialize)]
pub struct HealthReport {
    /// `true` only when every required service runs and the external probe
    /// (if configured) passed.
    pub healthy: bool,
    /// Per-required-service status, `"not found"` for unknown names.
    pub services: BTreeMap<String, String>,
    /// Required services not running, plus the probe name on probe failure.
    pub failed: Vec<String>,
}

/// Fold live container statuses and an optional probe result into a report.
#[must_use]
pub fn evaluate_health(
    required: &[String],
    statuses: &HashMap<String, String>,
    probe: Option<&ProbeResult>,
) -> HealthReport {
    let mut services = BTreeMap::new();
    let mut failed = Vec::new();

    for name in required {
        let status = statuses
            .get(name)
            .cloned()
            .unwrap_or_else(|| NOT_FOUND.to_string());
        if status != RUNNING {
            failed.push(name.clone());
        }
        services.insert(name.clone(), status);
    }

    if let Some(probe) = probe {
        if !probe.healthy {
            failed.push(probe.name.clone());
        }
    }

    HealthReport {
        healthy: failed.is_empty(),
        services,
        failed,
    }
}
