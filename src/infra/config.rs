//! Agent configuration loaded from `DOCKHAND_*` environment variables via
//! `envy`.
//!
//! Every field maps to `DOCKHAND_<FIELD>`. Only `DOCKHAND_REPO_URL` is
//! required; everything else carries the reference defaults. List-valued
//! fields are comma separated.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::application::services::reconcile::{ReconcileSettings, StagedConfig};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// URL of the tracked manifest repository.
    pub repo_url: String,

    /// Tracked branch.
    #[serde(default = "default_branch")]
    pub branch: String,

    /// Local checkout location.
    #[serde(default = "default_checkout_dir")]
    pub checkout_dir: PathBuf,

    /// Manifest file path relative to the checkout root.
    #[serde(default = "default_manifest_path")]
    pub manifest_path: String,

    /// The agent's in-container data directory; doubles as the bind-mount
    /// prefix rewritten during patching.
    #[serde(default = "default_data_dir")]
    pub data_dir: String,

    /// The agent's own well-known container name, used to read its mount
    /// table.
    #[serde(default = "default_self_container")]
    pub self_container: String,

    /// Services the agent manages: the health-required set and the restart
    /// set.
    #[serde(default)]
    pub services: Vec<String>,

    /// Container names cleared before recreate. Defaults to `services`.
    #[serde(default)]
    pub conflict_services: Option<Vec<String>>,

    /// Ancillary config file to stage on update, relative to the checkout.
    #[serde(default)]
    pub staged_config_src: Option<String>,

    /// Staging destination relative to the data directory. Defaults to the
    /// source file name.
    #[serde(default)]
    pub staged_config_dest: Option<String>,

    /// Directory whose files the logs endpoint archives.
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,

    /// File names excluded from log archives.
    #[serde(default)]
    pub log_denylist: Vec<String>,

    /// Where log archives are written.
    #[serde(default = "default_archive_dir")]
    pub archive_dir: PathBuf,

    /// Compose binary; may be multi-word (`"docker compose"`).
    #[serde(default = "default_compose_bin")]
    pub compose_bin: String,

    /// Socket address for the HTTP API.
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Optional external health endpoint folded into `/health`.
    #[serde(default)]
    pub probe_url: Option<String>,

    /// Label under which a failed probe is reported.
    #[serde(default = "default_probe_name")]
    pub probe_name: String,

    /// Expected `status` field in the probe response body, when set.
    #[serde(default)]
    pub probe_expect: Option<String>,

    /// Reconciliation interval in seconds.
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    /// Convergence polling sub-interval in seconds.
    #[serde(default = "default_poll_secs")]
    pub poll_secs: u64,

    /// Graceful stop/restart window per container, in seconds.
    #[serde(default = "default_stop_grace_secs")]
    pub stop_grace_secs: u64,

    /// Total restart convergence budget in seconds.
    #[serde(default = "default_restart_deadline_secs")]
    pub restart_deadline_secs: u64,
}

fn default_branch() -> String {
    "master".to_string()
}

fn default_checkout_dir() -> PathBuf {
    PathBuf::from("/app/repo")
}

fn default_manifest_path() -> String {
    "docker-compose.yaml".to_string()
}

fn default_data_dir() -> String {
    "/app/data".to_string()
}

fn default_self_container() -> String {
    "dockhand".to_string()
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("/app/logs")
}

fn default_archive_dir() -> PathBuf {
    PathBuf::from("/tmp")
}

fn default_compose_bin() -> String {
    "docker-compose".to_string()
}

fn default_listen_addr() -> String {
    "0.0.0.0:5000".to_string()
}

fn default_probe_name() -> String {
    "external-probe".to_string()
}

fn default_interval_secs() -> u64 {
    20
}

fn default_poll_secs() -> u64 {
    5
}

fn default_stop_grace_secs() -> u64 {
    10
}

fn default_restart_deadline_secs() -> u64 {
    300
}

impl Config {
    /// Load from `DOCKHAND_*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error when a required variable is missing or a value
    /// fails to parse.
    pub fn from_env() -> Result<Self> {
        envy::prefixed("DOCKHAND_")
            .from_env()
            .context("loading config from DOCKHAND_* env vars (DOCKHAND_REPO_URL is required)")
    }

    #[must_use]
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_secs)
    }

    #[must_use]
    pub fn stop_grace(&self) -> Duration {
        Duration::from_secs(self.stop_grace_secs)
    }

    #[must_use]
    pub fn restart_deadline(&self) -> Duration {
        Duration::from_secs(self.restart_deadline_secs)
    }

    #[must_use]
    pub fn conflict_services(&self) -> &[String] {
        self.conflict_services.as_deref().unwrap_or(&self.services)
    }

    #[must_use]
    pub fn staged_config(&self) -> Option<StagedConfig> {
        let source = self.staged_config_src.clone()?;
        let dest = self.staged_config_dest.clone().or_else(|| {
            Path::new(&source)
                .file_name()
                .and_then(|n| n.to_str())
                .map(ToString::to_string)
        })?;
        Some(StagedConfig { source, dest })
    }

    #[must_use]
    pub fn reconcile_settings(&self) -> ReconcileSettings {
        ReconcileSettings {
            checkout_dir: self.checkout_dir.clone(),
            manifest_path: self.manifest_path.clone(),
            data_dir: self.data_dir.clone(),
            self_container: self.self_container.clone(),
            conflict_services: self.conflict_services().to_vec(),
            stop_grace: self.stop_grace(),
            staged_config: self.staged_config(),
        }
    }
}

// ── Unit tests ────────────────────────────────────────────────────────────────
