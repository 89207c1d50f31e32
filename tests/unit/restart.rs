//! Restart-and-await tests — convergence, deadline exhaustion, and the
//! missing-service skip.
//!
//! Time units are scaled down (10 ms polls) so the suite stays fast.

#![allow(clippy::expect_used)]

use std::time::Duration;

use dockhand::application::services::restart::{RestartPlan, restart_and_await};
use dockhand::domain::convergence::RestartOutcome;

use crate::mocks::{FlippingRuntime, events, journal};

fn plan(names: &[&str], deadline: Duration) -> RestartPlan {
    RestartPlan {
        names: names.iter().map(|n| (*n).to_string()).collect(),
        grace: Duration::from_secs(1),
        poll_interval: Duration::from_millis(10),
        deadline,
    }
}

#[tokio::test]
async fn test_converges_when_all_services_come_up_before_deadline() {
    let log = journal();
    // B starts running on the third poll (~20 ms), inside the 35 ms budget
    let runtime = FlippingRuntime::new(log.clone(), &["A", "B"]).running_from_call("B", 3);

    let outcome = restart_and_await(&runtime, &plan(&["A", "B"], Duration::from_millis(35)))
        .await
        .expect("wait succeeds");

    assert_eq!(outcome, RestartOutcome::Converged);
    assert_eq!(events(&log), ["restart:A", "restart:B"]);
}

#[tokio::test]
async fn test_times_out_with_stragglers_from_last_sample() {
    let log = journal();
    // B would only come up far past the deadline
    let runtime = FlippingRuntime::new(log.clone(), &["A", "B"]).running_from_call("B", 100);

    let outcome = restart_and_await(&runtime, &plan(&["A", "B"], Duration::from_millis(35)))
        .await
        .expect("wait returns a structured outcome");

    assert_eq!(
        outcome,
        RestartOutcome::TimedOut {
            stragglers: vec!["B".to_string()]
        }
    );
}

#[tokio::test]
async fn test_missing_service_is_skipped_and_reported_as_straggler() {
    let log = journal();
    let runtime = FlippingRuntime::new(log.clone(), &["A"]);

    let outcome = restart_and_await(&runtime, &plan(&["A", "ghost"], Duration::from_millis(35)))
        .await
        .expect("wait returns a structured outcome");

    // no restart was issued for the unknown name
    assert_eq!(events(&log), ["restart:A"]);
    assert_eq!(
        outcome,
        RestartOutcome::TimedOut {
            stragglers: vec!["ghost".to_string()]
        }
    );
}

#[tokio::test]
async fn test_immediate_convergence_needs_single_poll() {
    let log = journal();
    let runtime = FlippingRuntime::new(log.clone(), &["A", "B"]);

    let outcome = restart_and_await(&runtime, &plan(&["A", "B"], Duration::from_millis(35)))
        .await
        .expect("wait succeeds");

    assert_eq!(outcome, RestartOutcome::Converged);
    assert_eq!(
        runtime
            .list_calls
            .load(std::sync::atomic::Ordering::SeqCst),
        1
    );
}
