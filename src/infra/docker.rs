//! Container runtime adapter backed by the Docker Engine API.
//!
//! The underlying [`Docker`] handle is constructed once at process start
//! and passed in — it is cheap to clone and share, and there is no ambient
//! singleton.

use std::time::Duration;

use anyhow::{Context, Result};
use bollard::Docker;
use bollard::container::{
    InspectContainerOptions, ListContainersOptions, RemoveContainerOptions,
    RestartContainerOptions, StatsOptions, StopContainerOptions,
};
use bollard::errors::Error as DockerError;
use futures_util::StreamExt;

use crate::application::ports::{
    ContainerLifecycle, ContainerQuery, ContainerRecord, ContainerStats, MountEntry,
};
use crate::domain::usage::StatsSample;

/// Production container runtime port implementation.
#[derive(Clone)]
pub struct DockerRuntime {
    docker: Docker,
}

impl DockerRuntime {
    #[must_use]
    pub fn new(docker: Docker) -> Self {
        Self { docker }
    }
}

fn is_not_found(err: &DockerError) -> bool {
    matches!(
        err,
        DockerError::DockerResponseServerError {
            status_code: 404,
            ..
        }
    )
}

/// The API reports names with a leading `/`.
fn strip_name(raw: &str) -> String {
    raw.trim_start_matches('/').to_string()
}

impl ContainerQuery for DockerRuntime {
    async fn list(&self) -> Result<Vec<ContainerRecord>> {
        let containers = self
            .docker
            .list_containers(Some(ListContainersOptions::<String> {
                all: false,
                ..Default::default()
            }))
            .await
            .context("listing containers")?;

        Ok(containers
            .into_iter()
            .filter_map(|c| {
                let name = c.names.as_ref()?.first()?.clone();
                Some(ContainerRecord {
                    name: strip_name(&name),
                    status: c.state.unwrap_or_default(),
                })
            })
            .collect())
    }

    async fn find(&self, name: &str) -> Result<Option<ContainerRecord>> {
        match self
            .docker
            .inspect_container(name, None::<InspectContainerOptions>)
            .await
        {
            Ok(detail) => {
                let status = detail
                    .state
                    .and_then(|s| s.status)
                    .map(|s| s.to_string())
                    .unwrap_or_default();
                Ok(Some(ContainerRecord {
                    name: name.to_string(),
                    status,
                }))
            }
            Err(err) if is_not_found(&err) => Ok(None),
            Err(err) => Err(err).with_context(|| format!("inspecting container {name}")),
        }
    }

    async fn mounts(&self, name: &str) -> Result<Vec<MountEntry>> {
        let detail = self
            .docker
            .inspect_container(name, None::<InspectContainerOptions>)
            .await
            .with_context(|| format!("inspecting container {name}"))?;

        Ok(detail
            .mounts
            .unwrap_or_default()
            .into_iter()
            .filter_map(|m| {
                Some(MountEntry {
                    destination: m.destination?,
                    source: m.source?,
                })
            })
            .collect())
    }
}

impl ContainerLifecycle for DockerRuntime {
    async fn stop(&self, name: &str, grace: Duration) -> Result<()> {
        self.docker
            .stop_container(
                name,
                Some(StopContainerOptions {
                    t: i64::try_from(grace.as_secs()).unwrap_or(i64::MAX),
                }),
            )
            .await
            .with_context(|| format!("stopping container {name}"))
    }

    async fn remove(&self, name: &str) -> Result<()> {
        self.docker
            .remove_container(name, None::<RemoveContainerOptions>)
            .await
            .with_context(|| format!("removing container {name}"))
    }

    async fn restart(&self, name: &str, grace: Duration) -> Result<()> {
        self.docker
            .restart_container(
                name,
                Some(RestartContainerOptions {
                    t: isize::try_from(grace.as_secs()).unwrap_or(isize::MAX),
                }),
            )
            .await
            .with_context(|| format!("restarting container {name}"))
    }
}

impl ContainerStats for DockerRuntime {
    async fn sample(&self, name: &str) -> Result<StatsSample> {
        let mut stream = self.docker.stats(
            name,
            Some(StatsOptions {
                stream: false,
                one_shot: false,
            }),
        );

        let stats = stream
            .next()
            .await
            .with_context(|| format!("no stats sample for {name}"))?
            .with_context(|| format!("sampling stats for {name}"))?;

        let online_cpus = stats.cpu_stats.online_cpus.unwrap_or_else(|| {
            stats
                .cpu_stats
                .cpu_usage
                .percpu_usage
                .as_ref()
                .map_or(1, |v| v.len() as u64)
        });

        Ok(StatsSample {
            cpu_total: stats.cpu_stats.cpu_usage.total_usage,
            precpu_total: stats.precpu_stats.cpu_usage.total_usage,
            system_cpu: stats.cpu_stats.system_cpu_usage.unwrap_or(0),
            presystem_cpu: stats.precpu_stats.system_cpu_usage.unwrap_or(0),
            online_cpus,
            memory_usage: stats.memory_stats.usage.unwrap_or(0),
            memory_limit: stats.memory_stats.limit.unwrap_or(0),
        })
    }
}
