//! Shared application state for the HTTP layer.
//!
//! Constructed once in `main` and passed as `Arc<AppState>` to every
//! handler. The runtime client lives here explicitly — there is no ambient
//! singleton.

use tokio::sync::Mutex;

use crate::infra::config::Config;
use crate::infra::docker::DockerRuntime;
use crate::infra::probe::HttpServiceProbe;

pub struct AppState {
    /// Container runtime port implementation shared with the reconciler.
    pub runtime: DockerRuntime,
    /// External health probe, disabled when no URL is configured.
    pub probe: HttpServiceProbe,
    /// Loaded agent configuration.
    pub config: Config,
    /// Admits at most one restart-and-await operation at a time; an
    /// overlapping request is rejected, not queued.
    pub restart_guard: Mutex<()>,
}

impl AppState {
    #[must_use]
    pub fn new(runtime: DockerRuntime, probe: HttpServiceProbe, config: Config) -> Self {
        Self {
            runtime,
            probe,
            config,
            restart_guard: Mutex::new(()),
        }
    }
}
