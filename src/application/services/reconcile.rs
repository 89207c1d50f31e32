//! Application service — the reconciliation loop.
//!
//! One cycle is detect-remote-change → make-local-state-safe-to-replace →
//! rewrite-manifest-for-host-reality → apply. Exactly one cycle is ever in
//! flight: the loop is a single sequential task, so the scheduling model
//! itself enforces mutual exclusion and no locking is needed.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use tokio::fs;

use crate::application::ports::{ComposeApply, ContainerLifecycle, ContainerQuery, ManifestRepo};
use crate::application::services::host_path::resolve_host_data_path;
use crate::domain::error::CycleError;
use crate::domain::manifest::{patch_volumes, patched_path};

// ── Settings ──────────────────────────────────────────────────────────────────

/// An ancillary config file copied from the checkout into the host-visible
/// data directory on every update, e.g. a message-broker configuration.
#[derive(Debug, Clone)]
pub struct StagedConfig {
    /// Path relative to the checkout root.
    pub source: String,
    /// Path relative to the data directory.
    pub dest: String,
}

/// Static inputs of a reconciliation cycle.
#[derive(Debug, Clone)]
pub struct ReconcileSettings {
    /// Local checkout of the tracked repository.
    pub checkout_dir: PathBuf,
    /// Manifest file path relative to the checkout root.
    pub manifest_path: String,
    /// The agent's in-container data directory — the bind-mount prefix to
    /// rewrite.
    pub data_dir: String,
    /// The agent's own well-known container name.
    pub self_container: String,
    /// Container names the new manifest will recreate; cleared up front so
    /// recreation cannot fail on name collisions.
    pub conflict_services: Vec<String>,
    /// Graceful-shutdown window when clearing conflicting containers.
    pub stop_grace: Duration,
    /// Optional config file to stage alongside the update.
    pub staged_config: Option<StagedConfig>,
}

/// What a completed cycle did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Local HEAD already matches the remote tip; nothing was touched.
    UpToDate,
    /// The stack was recreated from the named commit.
    Applied { commit: String },
}

// ── The loop ──────────────────────────────────────────────────────────────────

/// Background reconciler. Spawned once at process start and runs for the
/// process lifetime; every failure mode is cycle-scoped.
pub struct Reconciler<R, C, A> {
    repo: R,
    runtime: C,
    compose: A,
    settings: ReconcileSettings,
    interval: Duration,
}

impl<R, C, A> Reconciler<R, C, A>
where
    R: ManifestRepo,
    C: ContainerQuery + ContainerLifecycle,
    A: ComposeApply,
{
    pub fn new(repo: R, runtime: C, compose: A, settings: ReconcileSettings, interval: Duration) -> Self {
        Self {
            repo,
            runtime,
            compose,
            settings,
            interval,
        }
    }

    /// Run forever on the fixed interval. There is no backoff and no retry
    /// counter — the interval is the retry mechanism.
    pub async fn run(self) {
        loop {
            tracing::debug!("starting update check");
            match run_cycle(&self.repo, &self.runtime, &self.compose, &self.settings).await {
                Ok(CycleOutcome::UpToDate) => {
                    tracing::debug!("no changes in repository, skipping");
                }
                Ok(CycleOutcome::Applied { commit }) => {
                    tracing::info!(%commit, "stack updated");
                }
                Err(err) if err.is_config() => {
                    tracing::error!(%err, "configuration problem, retrying on next cycle");
                }
                Err(err) => {
                    tracing::error!(%err, "update cycle failed");
                }
            }
            tokio::time::sleep(self.interval).await;
        }
    }
}

// ── One cycle ─────────────────────────────────────────────────────────────────

/// Run a single reconciliation cycle.
///
/// Ordering is load-bearing: the working tree is reset before conflicting
/// containers are cleared, conflicts are cleared before patching, and the
/// patched manifest exists before apply. A failed apply is not rolled back
/// and is not retried until a new commit lands.
///
/// # Errors
///
/// Any [`CycleError`] aborts this cycle only; the loop continues on its
/// normal schedule.
pub async fn run_cycle(
    repo: &impl ManifestRepo,
    runtime: &(impl ContainerQuery + ContainerLifecycle),
    compose: &impl ComposeApply,
    settings: &ReconcileSettings,
) -> Result<CycleOutcome, CycleError> {
    repo.ensure_checkout().await?;

    let remote = repo.remote_update().await?;
    if !remote.has_update() {
        return Ok(CycleOutcome::UpToDate);
    }
    tracing::info!(current = %remote.current, latest = %remote.latest, "remote advanced");

    repo.fast_forward().await?;

    stop_and_remove(runtime, &settings.conflict_services, settings.stop_grace).await?;

    let host_data =
        resolve_host_data_path(runtime, &settings.self_container, &settings.data_dir).await?;
    tracing::info!(host_path = %host_data, "resolved host path for data directory");

    let manifest = settings.checkout_dir.join(&settings.manifest_path);
    let patched = patch_manifest(&manifest, &settings.data_dir, &host_data).await?;

    if let Some(staged) = &settings.staged_config {
        // Best effort: the stack can still come up with defaults.
        if let Err(err) = stage_config(&settings.checkout_dir, &settings.data_dir, staged).await {
            tracing::warn!(%err, source = %staged.source, "failed to stage config file");
        }
    }

    compose.pull(&patched).await?;
    compose.recreate(&patched).await?;

    Ok(CycleOutcome::Applied {
        commit: remote.latest,
    })
}

/// Stop and remove any container — running or stopped — holding one of the
/// given names. Absence of a matching container is not an error. No
/// inter-service ordering is assumed; the recreate step establishes correct
/// startup order.
pub async fn stop_and_remove(
    runtime: &(impl ContainerQuery + ContainerLifecycle),
    names: &[String],
    grace: Duration,
) -> anyhow::Result<()> {
    for name in names {
        if runtime.find(name).await?.is_none() {
            continue;
        }
        tracing::info!(%name, "stopping and removing conflicting container");
        runtime.stop(name, grace).await?;
        runtime.remove(name).await?;
    }
    Ok(())
}

/// Parse the pristine tracked manifest, rewrite matching bind mounts, and
/// write the result to the derived sibling path.
async fn patch_manifest(
    manifest: &Path,
    internal_prefix: &str,
    host_data: &str,
) -> anyhow::Result<PathBuf> {
    let raw = fs::read_to_string(manifest)
        .await
        .with_context(|| format!("reading manifest {}", manifest.display()))?;
    let mut doc: serde_yaml::Value = serde_yaml::from_str(&raw)
        .with_context(|| format!("parsing manifest {}", manifest.display()))?;

    for rewrite in patch_volumes(&mut doc, internal_prefix, host_data) {
        tracing::info!(
            service = %rewrite.service,
            from = %rewrite.from,
            to = %rewrite.to,
            "patched bind mount",
        );
    }

    let out = patched_path(manifest);
    let body = serde_yaml::to_string(&doc).context("serializing patched manifest")?;
    fs::write(&out, body)
        .await
        .with_context(|| format!("writing {}", out.display()))?;
    tracing::info!(path = %out.display(), "patched manifest written");
    Ok(out)
}

/// Copy the ancillary config file from the checkout into the data
/// directory, creating intermediate directories as needed.
async fn stage_config(
    checkout: &Path,
    data_dir: &str,
    staged: &StagedConfig,
) -> anyhow::Result<()> {
    let source = checkout.join(&staged.source);
    let target = Path::new(data_dir).join(&staged.dest);

    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)
            .await
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    fs::copy(&source, &target)
        .await
        .with_context(|| format!("copying {} to {}", source.display(), target.display()))?;
    tracing::info!(target = %target.display(), "staged config file");
    Ok(())
}
