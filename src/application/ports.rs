//! Port trait definitions for the Application layer.
//!
//! Ports are the interfaces (contracts) that infrastructure must fulfill.
//! This file imports only from `crate::domain` — never from `crate::infra`
//! or `crate::api`.

use std::path::Path;
use std::process::Output;
use std::time::Duration;

use anyhow::Result;

use crate::domain::error::CycleError;
use crate::domain::health::ProbeResult;
use crate::domain::usage::StatsSample;

// ── Value Types ───────────────────────────────────────────────────────────────

/// A container as observed by the runtime.
#[derive(Debug, Clone)]
pub struct ContainerRecord {
    /// Container name without the runtime's leading `/`.
    pub name: String,
    /// Runtime status string, e.g. `"running"`, `"exited"`.
    pub status: String,
}

/// One mount on a container: destination inside, source on the host.
#[derive(Debug, Clone)]
pub struct MountEntry {
    pub destination: String,
    pub source: String,
}

/// Result of comparing the local checkout against the remote tracked branch.
#[derive(Debug, Clone)]
pub struct RemoteStatus {
    /// Commit id of the local HEAD.
    pub current: String,
    /// Commit id of the remote tracked-branch tip.
    pub latest: String,
}

impl RemoteStatus {
    /// Commits are compared by identity, never by content diff.
    #[must_use]
    pub fn has_update(&self) -> bool {
        self.current != self.latest
    }
}

// ── Container Runtime Ports ───────────────────────────────────────────────────

/// Read-only container queries. Idempotent and safe to interleave with the
/// reconciliation loop.
#[allow(async_fn_in_trait)]
pub trait ContainerQuery {
    /// List live containers with their status.
    async fn list(&self) -> Result<Vec<ContainerRecord>>;
    /// Look up one container — running or stopped — by exact name.
    async fn find(&self, name: &str) -> Result<Option<ContainerRecord>>;
    /// Mount table of a container, by name.
    async fn mounts(&self, name: &str) -> Result<Vec<MountEntry>>;
}

/// Mutating container operations. Only issued from within a reconciliation
/// cycle or a guarded restart request.
#[allow(async_fn_in_trait)]
pub trait ContainerLifecycle {
    /// Stop a container, allowing `grace` for graceful shutdown.
    async fn stop(&self, name: &str, grace: Duration) -> Result<()>;
    /// Remove a stopped container.
    async fn remove(&self, name: &str) -> Result<()>;
    /// Gracefully restart a container, bounded by `grace`.
    async fn restart(&self, name: &str, grace: Duration) -> Result<()>;
}

/// One-shot resource sampling.
#[allow(async_fn_in_trait)]
pub trait ContainerStats {
    /// Take a single stats sample for the named container.
    async fn sample(&self, name: &str) -> Result<StatsSample>;
}

/// Composite trait — any type implementing the three runtime sub-traits is a
/// `ContainerRuntime`.
pub trait ContainerRuntime: ContainerQuery + ContainerLifecycle + ContainerStats {}

impl<T> ContainerRuntime for T where T: ContainerQuery + ContainerLifecycle + ContainerStats {}

// ── Manifest Repository Port ──────────────────────────────────────────────────

/// The local checkout of the tracked manifest repository.
#[allow(async_fn_in_trait)]
pub trait ManifestRepo {
    /// Clone if absent, reuse if valid, destroy-and-reclone if corrupt.
    async fn ensure_checkout(&self) -> Result<(), CycleError>;
    /// Fetch the remote and compare local HEAD against the tracked branch
    /// tip.
    async fn remote_update(&self) -> Result<RemoteStatus, CycleError>;
    /// Hard-reset the working tree to the remote tracked-branch tip and
    /// fast-forward the local branch ref.
    async fn fast_forward(&self) -> Result<(), CycleError>;
}

// ── Compose Apply Port ────────────────────────────────────────────────────────

/// The external compose-apply tool, invoked against a manifest file path.
/// Both operations report success via exit code.
#[allow(async_fn_in_trait)]
pub trait ComposeApply {
    /// Pull the images the manifest references.
    async fn pull(&self, manifest: &Path) -> Result<()>;
    /// Recreate the running stack from the manifest.
    async fn recreate(&self, manifest: &Path) -> Result<()>;
}

// ── External Probe Port ───────────────────────────────────────────────────────

/// Optional external health endpoint folded into the health report.
#[allow(async_fn_in_trait)]
pub trait ServiceProbe {
    /// `None` when no probe is configured.
    async fn probe(&self) -> Option<ProbeResult>;
}

// ── Command Runner Port ───────────────────────────────────────────────────────

/// Abstracts process execution so infrastructure can be swapped or mocked.
#[allow(async_fn_in_trait)]
pub trait CommandRunner {
    /// Run a program and capture its output, using the implementation's
    /// default timeout.
    async fn run(&self, program: &str, args: &[&str]) -> Result<Output>;

    /// Run a program with a custom timeout override.
    ///
    /// # Errors
    ///
    /// Returns an error if the process cannot be spawned or exceeds
    /// `timeout`. On timeout, the child process must be killed.
    async fn run_with_timeout(
        &self,
        program: &str,
        args: &[&str],
        timeout: Duration,
    ) -> Result<Output>;
}
