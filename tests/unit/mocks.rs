//! Shared mock infrastructure for unit tests.
//!
//! Provides canned port implementations and a shared event journal so each
//! test file doesn't have to re-define the same boilerplate. Mocks record
//! every mutating call, letting tests assert cross-port ordering.

#![allow(clippy::expect_used)]
#![allow(dead_code)] // each test target uses a subset of the mocks

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;

use dockhand::application::ports::{
    ComposeApply, ContainerLifecycle, ContainerQuery, ContainerRecord, ContainerStats,
    ManifestRepo, MountEntry, RemoteStatus, ServiceProbe,
};
use dockhand::domain::error::CycleError;
use dockhand::domain::health::ProbeResult;
use dockhand::domain::usage::StatsSample;

// ── Event journal ─────────────────────────────────────────────────────────────

/// Ordered record of mutating calls, shared across mocks.
pub type Journal = Arc<Mutex<Vec<String>>>;

pub fn journal() -> Journal {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn record(journal: &Journal, event: impl Into<String>) {
    journal.lock().expect("journal lock").push(event.into());
}

pub fn events(journal: &Journal) -> Vec<String> {
    journal.lock().expect("journal lock").clone()
}

// ── Mock: container runtime with fixed containers ─────────────────────────────

pub struct MockRuntime {
    pub journal: Journal,
    pub containers: Mutex<HashMap<String, String>>,
    pub self_mounts: Vec<MountEntry>,
    pub stats: HashMap<String, StatsSample>,
}

impl MockRuntime {
    pub fn new(journal: Journal) -> Self {
        Self {
            journal,
            containers: Mutex::new(HashMap::new()),
            self_mounts: Vec::new(),
            stats: HashMap::new(),
        }
    }

    #[must_use]
    pub fn with_container(self, name: &str, status: &str) -> Self {
        self.containers
            .lock()
            .expect("containers lock")
            .insert(name.to_string(), status.to_string());
        self
    }

    #[must_use]
    pub fn with_mount(mut self, destination: &str, source: &str) -> Self {
        self.self_mounts.push(MountEntry {
            destination: destination.to_string(),
            source: source.to_string(),
        });
        self
    }

    #[must_use]
    pub fn with_stats(mut self, name: &str, sample: StatsSample) -> Self {
        self.stats.insert(name.to_string(), sample);
        self
    }
}

impl ContainerQuery for MockRuntime {
    async fn list(&self) -> Result<Vec<ContainerRecord>> {
        Ok(self
            .containers
            .lock()
            .expect("containers lock")
            .iter()
            .map(|(name, status)| ContainerRecord {
                name: name.clone(),
                status: status.clone(),
            })
            .collect())
    }

    async fn find(&self, name: &str) -> Result<Option<ContainerRecord>> {
        Ok(self
            .containers
            .lock()
            .expect("containers lock")
            .get(name)
            .map(|status| ContainerRecord {
                name: name.to_string(),
                status: status.clone(),
            }))
    }

    async fn mounts(&self, name: &str) -> Result<Vec<MountEntry>> {
        record(&self.journal, format!("mounts:{name}"));
        Ok(self.self_mounts.clone())
    }
}

impl ContainerLifecycle for MockRuntime {
    async fn stop(&self, name: &str, _grace: Duration) -> Result<()> {
        record(&self.journal, format!("stop:{name}"));
        Ok(())
    }

    async fn remove(&self, name: &str) -> Result<()> {
        record(&self.journal, format!("remove:{name}"));
        self.containers.lock().expect("containers lock").remove(name);
        Ok(())
    }

    async fn restart(&self, name: &str, _grace: Duration) -> Result<()> {
        record(&self.journal, format!("restart:{name}"));
        Ok(())
    }
}

impl ContainerStats for MockRuntime {
    async fn sample(&self, name: &str) -> Result<StatsSample> {
        self.stats
            .get(name)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("stats unavailable for {name}"))
    }
}

// ── Mock: runtime whose containers start running after N polls ────────────────

pub struct FlippingRuntime {
    pub journal: Journal,
    /// Containers the runtime knows about.
    pub names: Vec<String>,
    /// Name → `list()` call number from which it reports running.
    /// Names absent from the map run from the first call.
    pub flips: HashMap<String, usize>,
    pub list_calls: AtomicUsize,
}

impl FlippingRuntime {
    pub fn new(journal: Journal, names: &[&str]) -> Self {
        Self {
            journal,
            names: names.iter().map(|n| (*n).to_string()).collect(),
            flips: HashMap::new(),
            list_calls: AtomicUsize::new(0),
        }
    }

    #[must_use]
    pub fn running_from_call(mut self, name: &str, call: usize) -> Self {
        self.flips.insert(name.to_string(), call);
        self
    }

    fn status_at(&self, name: &str, call: usize) -> String {
        let running = self.flips.get(name).is_none_or(|&at| call >= at);
        if running { "running" } else { "starting" }.to_string()
    }
}

impl ContainerQuery for FlippingRuntime {
    async fn list(&self) -> Result<Vec<ContainerRecord>> {
        let call = self.list_calls.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(self
            .names
            .iter()
            .map(|name| ContainerRecord {
                name: name.clone(),
                status: self.status_at(name, call),
            })
            .collect())
    }

    async fn find(&self, name: &str) -> Result<Option<ContainerRecord>> {
        Ok(self
            .names
            .iter()
            .any(|n| n == name)
            .then(|| ContainerRecord {
                name: name.to_string(),
                status: "running".to_string(),
            }))
    }

    async fn mounts(&self, _name: &str) -> Result<Vec<MountEntry>> {
        Ok(Vec::new())
    }
}

impl ContainerLifecycle for FlippingRuntime {
    async fn stop(&self, name: &str, _grace: Duration) -> Result<()> {
        record(&self.journal, format!("stop:{name}"));
        Ok(())
    }

    async fn remove(&self, name: &str) -> Result<()> {
        record(&self.journal, format!("remove:{name}"));
        Ok(())
    }

    async fn restart(&self, name: &str, _grace: Duration) -> Result<()> {
        record(&self.journal, format!("restart:{name}"));
        Ok(())
    }
}

// ── Mock: manifest repository ─────────────────────────────────────────────────

pub struct MockRepo {
    pub journal: Journal,
    pub current: String,
    pub latest: String,
}

impl MockRepo {
    pub fn new(journal: Journal, current: &str, latest: &str) -> Self {
        Self {
            journal,
            current: current.to_string(),
            latest: latest.to_string(),
        }
    }
}

impl ManifestRepo for MockRepo {
    async fn ensure_checkout(&self) -> Result<(), CycleError> {
        record(&self.journal, "ensure_checkout");
        Ok(())
    }

    async fn remote_update(&self) -> Result<RemoteStatus, CycleError> {
        record(&self.journal, "remote_update");
        Ok(RemoteStatus {
            current: self.current.clone(),
            latest: self.latest.clone(),
        })
    }

    async fn fast_forward(&self) -> Result<(), CycleError> {
        record(&self.journal, "fast_forward");
        Ok(())
    }
}

// ── Mock: compose apply ───────────────────────────────────────────────────────

pub struct MockCompose {
    pub journal: Journal,
    pub fail_pull: bool,
}

impl MockCompose {
    pub fn new(journal: Journal) -> Self {
        Self {
            journal,
            fail_pull: false,
        }
    }

    #[must_use]
    pub fn failing_pull(mut self) -> Self {
        self.fail_pull = true;
        self
    }
}

impl ComposeApply for MockCompose {
    async fn pull(&self, manifest: &std::path::Path) -> Result<()> {
        record(&self.journal, format!("pull:{}", manifest.display()));
        if self.fail_pull {
            anyhow::bail!("image pull failed");
        }
        Ok(())
    }

    async fn recreate(&self, manifest: &std::path::Path) -> Result<()> {
        record(&self.journal, format!("recreate:{}", manifest.display()));
        Ok(())
    }
}

// ── Mock: external probe ──────────────────────────────────────────────────────

pub struct MockProbe {
    pub result: Option<ProbeResult>,
}

impl MockProbe {
    pub fn disabled() -> Self {
        Self { result: None }
    }

    pub fn healthy(name: &str) -> Self {
        Self {
            result: Some(ProbeResult {
                name: name.to_string(),
                healthy: true,
            }),
        }
    }

    pub fn failing(name: &str) -> Self {
        Self {
            result: Some(ProbeResult {
                name: name.to_string(),
                healthy: false,
            }),
        }
    }
}

impl ServiceProbe for MockProbe {
    async fn probe(&self) -> Option<ProbeResult> {
        self.result.clone()
    }
}
