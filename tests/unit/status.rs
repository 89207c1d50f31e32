//! Stack inspection tests — health aggregation and usage snapshots.

#![allow(clippy::expect_used)]

use dockhand::application::services::status::{UsageEntry, gather_health, gather_usage};
use dockhand::domain::usage::StatsSample;

use crate::mocks::{MockProbe, MockRuntime, journal};

fn required(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| (*n).to_string()).collect()
}

#[tokio::test]
async fn test_health_reports_missing_required_service() {
    let runtime = MockRuntime::new(journal()).with_container("api", "running");

    let report = gather_health(&runtime, &MockProbe::disabled(), &required(&["api", "db"]))
        .await
        .expect("health gathers");

    assert!(!report.healthy);
    assert_eq!(report.failed, ["db"]);
    assert_eq!(report.services["api"], "running");
    assert_eq!(report.services["db"], "not found");
}

#[tokio::test]
async fn test_health_folds_in_failing_probe() {
    let runtime = MockRuntime::new(journal()).with_container("api", "running");

    let report = gather_health(
        &runtime,
        &MockProbe::failing("printer-util"),
        &required(&["api"]),
    )
    .await
    .expect("health gathers");

    assert!(!report.healthy);
    assert_eq!(report.failed, ["printer-util"]);
}

#[tokio::test]
async fn test_health_all_running_with_passing_probe() {
    let runtime = MockRuntime::new(journal())
        .with_container("api", "running")
        .with_container("db", "running");

    let report = gather_health(
        &runtime,
        &MockProbe::healthy("printer-util"),
        &required(&["api", "db"]),
    )
    .await
    .expect("health gathers");

    assert!(report.healthy);
    assert!(report.failed.is_empty());
}

#[tokio::test]
async fn test_usage_reports_per_container_and_inline_errors() {
    let sample = StatsSample {
        cpu_total: 200,
        precpu_total: 100,
        system_cpu: 1100,
        presystem_cpu: 100,
        online_cpus: 2,
        memory_usage: 256 * 1024 * 1024,
        memory_limit: 1024 * 1024 * 1024,
    };
    // db has no stats — its entry must carry the error without failing api's
    let runtime = MockRuntime::new(journal())
        .with_container("api", "running")
        .with_container("db", "running")
        .with_stats("api", sample);

    let usage = gather_usage(&runtime).await.expect("usage gathers");

    match &usage["api"] {
        UsageEntry::Usage(entry) => {
            assert!((entry.cpu_percent - 20.0).abs() < f64::EPSILON);
            assert!((entry.memory_percent - 25.0).abs() < f64::EPSILON);
        }
        UsageEntry::Failed { error } => panic!("expected usage for api, got error: {error}"),
    }
    assert!(matches!(&usage["db"], UsageEntry::Failed { .. }));
}
