//! Application service — read-only stack queries.
//!
//! These interleave freely with the reconciliation loop: every call here is
//! an idempotent runtime read.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::application::ports::{ContainerQuery, ContainerStats, ServiceProbe};
use crate::domain::health::{HealthReport, evaluate_health};
use crate::domain::usage::ResourceUsage;

/// Snapshot of live container statuses, keyed by name.
pub async fn container_statuses(
    runtime: &impl ContainerQuery,
) -> anyhow::Result<HashMap<String, String>> {
    let containers = runtime.list().await?;
    Ok(containers.into_iter().map(|c| (c.name, c.status)).collect())
}

/// Aggregate health of the required services, with the external probe
/// result folded in.
///
/// # Errors
///
/// Returns an error if the runtime cannot be queried. A failing *probe* is
/// not an error — it is reflected in the report.
pub async fn gather_health(
    runtime: &impl ContainerQuery,
    probe: &impl ServiceProbe,
    required: &[String],
) -> anyhow::Result<HealthReport> {
    let statuses = container_statuses(runtime).await?;
    let probe_result = probe.probe().await;
    Ok(evaluate_health(required, &statuses, probe_result.as_ref()))
}

/// One container's entry in the usage snapshot. Sampling failures are
/// reported in-band so one broken container never fails the whole query.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum UsageEntry {
    Usage(ResourceUsage),
    Failed { error: String },
}

/// Per-container CPU and memory usage for every live container.
pub async fn gather_usage(
    runtime: &(impl ContainerQuery + ContainerStats),
) -> anyhow::Result<BTreeMap<String, UsageEntry>> {
    let containers = runtime.list().await?;
    let mut usage = BTreeMap::new();

    for container in containers {
        let entry = match runtime.sample(&container.name).await {
            Ok(sample) => UsageEntry::Usage(ResourceUsage::from_sample(&sample)),
            Err(err) => UsageEntry::Failed {
                error: err.to_string(),
            },
        };
        usage.insert(container.name, entry);
    }

    Ok(usage)
}
