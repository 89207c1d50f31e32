//! HTTP surface — thin axum handlers over the application services.
//!
//! Handlers translate service results into status codes and JSON bodies;
//! they hold no logic of their own.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use serde::Serialize;

use crate::app::AppState;
use crate::application::services::restart::{RestartPlan, restart_and_await};
use crate::application::services::status::{UsageEntry, gather_health, gather_usage};
use crate::domain::convergence::RestartOutcome;
use crate::domain::health::HealthReport;
use crate::infra::archive::archive_logs;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/logs", get(logs))
        .route("/usage", get(usage))
        .route("/restart", post(restart))
        .with_state(state)
}

// ── Response bodies ───────────────────────────────────────────────────────────

#[derive(Serialize)]
struct StatusBody {
    status: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    failed_services: Option<Vec<String>>,
}

impl StatusBody {
    fn success(message: &str) -> Self {
        Self {
            status: "success",
            message: message.to_string(),
            details: None,
            failed_services: None,
        }
    }

    fn failure(message: &str) -> Self {
        Self {
            status: "failure",
            message: message.to_string(),
            details: None,
            failed_services: None,
        }
    }

    fn unhealthy(report: HealthReport) -> Self {
        Self {
            status: "failure",
            message: "One or more services are not running".to_string(),
            details: Some(report.services),
            failed_services: Some(report.failed),
        }
    }
}

#[derive(Serialize)]
#[serde(untagged)]
enum UsageBody {
    Ok {
        cpu_usage: String,
        memory_usage: String,
        memory_percentage: String,
    },
    Err {
        error: String,
    },
}

impl From<UsageEntry> for UsageBody {
    fn from(entry: UsageEntry) -> Self {
        match entry {
            UsageEntry::Usage(usage) => UsageBody::Ok {
                cpu_usage: format!("{:.2}%", usage.cpu_percent),
                memory_usage: format!("{:.2} MB", usage.memory_mib),
                memory_percentage: format!("{:.2}%", usage.memory_percent),
            },
            UsageEntry::Failed { error } => UsageBody::Err { error },
        }
    }
}

fn internal_error(err: &anyhow::Error) -> Response {
    tracing::error!(%err, "request failed");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(StatusBody::failure(&err.to_string())),
    )
        .into_response()
}

// ── Handlers ──────────────────────────────────────────────────────────────────

async fn health(State(state): State<Arc<AppState>>) -> Response {
    match gather_health(&state.runtime, &state.probe, &state.config.services).await {
        Ok(report) if report.healthy => (
            StatusCode::OK,
            Json(StatusBody::success("All services are running")),
        )
            .into_response(),
        Ok(report) => {
            tracing::warn!(failed = ?report.failed, "health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(StatusBody::unhealthy(report)),
            )
                .into_response()
        }
        Err(err) => internal_error(&err),
    }
}

async fn logs(State(state): State<Arc<AppState>>) -> Response {
    let archive = archive_logs(
        state.config.log_dir.clone(),
        state.config.log_denylist.clone(),
        state.config.archive_dir.clone(),
    )
    .await;

    let path = match archive {
        Ok(path) => path,
        Err(err) => return internal_error(&err),
    };
    let bytes = match tokio::fs::read(&path).await {
        Ok(bytes) => bytes,
        Err(err) => return internal_error(&err.into()),
    };

    let filename = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("logs.zip");
    (
        [
            (header::CONTENT_TYPE, "application/zip".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        bytes,
    )
        .into_response()
}

async fn usage(State(state): State<Arc<AppState>>) -> Response {
    match gather_usage(&state.runtime).await {
        Ok(entries) => {
            let body: BTreeMap<String, UsageBody> = entries
                .into_iter()
                .map(|(name, entry)| (name, entry.into()))
                .collect();
            Json(body).into_response()
        }
        Err(err) => internal_error(&err),
    }
}

async fn restart(State(state): State<Arc<AppState>>) -> Response {
    // At most one mutating convergence operation in flight.
    let Ok(_guard) = state.restart_guard.try_lock() else {
        return (
            StatusCode::CONFLICT,
            Json(StatusBody::failure("a restart is already in flight")),
        )
            .into_response();
    };

    let plan = RestartPlan {
        names: state.config.services.clone(),
        grace: state.config.stop_grace(),
        poll_interval: state.config.poll_interval(),
        deadline: state.config.restart_deadline(),
    };

    match restart_and_await(&state.runtime, &plan).await {
        Ok(RestartOutcome::Converged) => (
            StatusCode::OK,
            Json(StatusBody::success("All services are running")),
        )
            .into_response(),
        Ok(RestartOutcome::TimedOut { stragglers }) => {
            let mut body =
                StatusBody::failure("Timeout reached; some services are not running");
            body.failed_services = Some(stragglers);
            (StatusCode::GATEWAY_TIMEOUT, Json(body)).into_response()
        }
        Err(err) => internal_error(&err),
    }
}
