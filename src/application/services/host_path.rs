//! Application service — host data-path discovery.
//!
//! The agent sees its own data directory at an in-container path; every
//! other service in the manifest must bind-mount the *real* host path, or
//! its containers will not share data with the agent. The real path is read
//! from the agent's own mount table, once per cycle and never cached across
//! cycles, so a remount of the agent itself is picked up on the next tick.

use crate::application::ports::ContainerQuery;
use crate::domain::error::CycleError;

/// Host-side source of the mount whose destination equals `data_dir` on
/// the agent's own container (identified by its well-known name).
///
/// # Errors
///
/// Returns [`CycleError::DataMountMissing`] when no such mount exists —
/// a configuration error, not a transient one.
pub async fn resolve_host_data_path(
    runtime: &impl ContainerQuery,
    self_container: &str,
    data_dir: &str,
) -> Result<String, CycleError> {
    let mounts = runtime.mounts(self_container).await?;

    mounts
        .into_iter()
        .find(|m| m.destination == data_dir)
        .map(|m| m.source)
        .ok_or_else(|| CycleError::DataMountMissing {
            container: self_container.to_string(),
            destination: data_dir.to_string(),
        })
}
