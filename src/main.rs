//! dockhand — self-updating deployment agent.
//!
//! Initialises tracing, loads configuration from `DOCKHAND_*` environment
//! variables, connects to the container runtime, spawns the background
//! reconciliation loop, and serves the query API.

use std::sync::Arc;

use anyhow::{Context, Result};
use bollard::Docker;
use tracing_subscriber::EnvFilter;

use dockhand::api;
use dockhand::app::AppState;
use dockhand::application::services::reconcile::Reconciler;
use dockhand::infra::command_runner::TokioCommandRunner;
use dockhand::infra::compose::ComposeCli;
use dockhand::infra::config::Config;
use dockhand::infra::docker::DockerRuntime;
use dockhand::infra::git::GitManifestRepo;
use dockhand::infra::probe::HttpServiceProbe;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    tracing::info!("dockhand starting");

    let config = Config::from_env()?;
    tracing::info!(
        repo = %config.repo_url,
        branch = %config.branch,
        listen_addr = %config.listen_addr,
        services = config.services.len(),
        "configuration loaded",
    );

    // One runtime client handle for the whole process; clones share it.
    let docker = Docker::connect_with_local_defaults().context("connecting to container runtime")?;
    let runtime = DockerRuntime::new(docker);

    let repo = GitManifestRepo::new(
        config.repo_url.clone(),
        config.branch.clone(),
        config.checkout_dir.clone(),
    );
    let compose = ComposeCli::new(TokioCommandRunner::default(), config.compose_bin.clone());
    let reconciler = Reconciler::new(
        repo,
        runtime.clone(),
        compose,
        config.reconcile_settings(),
        config.interval(),
    );

    tracing::info!(interval_secs = config.interval_secs, "starting reconciliation loop");
    tokio::spawn(reconciler.run());

    let probe = HttpServiceProbe::new(
        config.probe_url.clone(),
        config.probe_name.clone(),
        config.probe_expect.clone(),
    )?;
    let state = Arc::new(AppState::new(runtime, probe, config.clone()));

    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .with_context(|| format!("binding {}", config.listen_addr))?;
    tracing::info!("API ready on http://{}", config.listen_addr);

    axum::serve(listener, api::router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")
}

/// Resolve on SIGINT or SIGTERM so in-flight requests drain before exit.
async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                term.recv().await;
            }
            Err(_) => std::future::pending().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    tracing::info!("shutdown signal received");
}
