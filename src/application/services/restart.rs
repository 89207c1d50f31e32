//! Application service — coordinated restart with a bounded wait.

use std::collections::HashMap;
use std::time::Duration;

use tokio::time::Instant;

use crate::application::ports::{ContainerLifecycle, ContainerQuery};
use crate::domain::convergence::{RestartOutcome, stragglers};

/// Inputs of one restart-and-await operation.
#[derive(Debug, Clone)]
pub struct RestartPlan {
    /// Services to restart, in issue order.
    pub names: Vec<String>,
    /// Graceful-shutdown window per service.
    pub grace: Duration,
    /// Sub-interval between status samples.
    pub poll_interval: Duration,
    /// Total wall-clock budget for convergence.
    pub deadline: Duration,
}

/// Gracefully restart each named service in sequence, then poll the live
/// container set until all of them report running or the deadline elapses.
///
/// A missing service is skipped, not an error. On timeout the stragglers
/// come from the last sample taken before the deadline check. The
/// convergence check runs before the deadline check, so a set that is
/// running exactly at the deadline still converges.
///
/// # Errors
///
/// Returns an error only on runtime query failure — deadline exhaustion is
/// a structured [`RestartOutcome::TimedOut`], not an error.
pub async fn restart_and_await(
    runtime: &(impl ContainerQuery + ContainerLifecycle),
    plan: &RestartPlan,
) -> anyhow::Result<RestartOutcome> {
    for name in &plan.names {
        match runtime.find(name).await? {
            Some(_) => {
                tracing::info!(%name, "restarting service");
                runtime.restart(name, plan.grace).await?;
            }
            None => {
                tracing::warn!(%name, "service not found, skipping restart");
            }
        }
    }

    let started = Instant::now();
    loop {
        let snapshot = runtime.list().await?;
        let statuses: HashMap<String, String> = snapshot
            .into_iter()
            .map(|c| (c.name, c.status))
            .collect();

        let lagging = stragglers(&plan.names, &statuses);
        if lagging.is_empty() {
            return Ok(RestartOutcome::Converged);
        }
        if started.elapsed() >= plan.deadline {
            return Ok(RestartOutcome::TimedOut { stragglers: lagging });
        }

        tracing::debug!(waiting = lagging.len(), "waiting for services to start");
        tokio::time::sleep(plan.poll_interval).await;
    }
}
