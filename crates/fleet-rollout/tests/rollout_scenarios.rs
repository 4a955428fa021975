//! End-to-end deploy and rollback flows against in-memory backends.

mod support;

use std::sync::{Arc, Mutex};

use fleet_core::{RolloutOutcome, TargetTag, Version};
use fleet_rollout::{Coordinator, RolloutError, SETTLE_INTERVAL};

use support::*;

fn v(major: u64, minor: u64, patch: u64) -> TargetTag {
    TargetTag::Version(Version::new(major, minor, patch))
}

#[tokio::test(start_paused = true)]
async fn deploy_auto_increments_builds_and_passes() {
    let log = CallLog::default();
    let config = fleet_config();
    let coordinator = Coordinator::new(
        &config,
        FakeStore::new(&["v1.0.0", "v1.0.1"], &log),
        FakeRuntime::new(&log).with_running(&["robot-1", "robot-2", "robot-3"]),
        FakeProber::healthy(&log),
    );

    let report = coordinator.deploy(None).await.unwrap();

    assert_eq!(report.target.tag, v(1, 0, 2));
    assert!(!report.target.reused);
    assert_eq!(report.outcome(), RolloutOutcome::Success);
    assert_eq!(report.replaced.len(), 3);
    assert_eq!(report.health.results.len(), 3);

    assert!(coordinator.store().has("v1.0.2"));
    assert!(coordinator.store().has("latest"));
    assert!(calls(&log).contains(&"build:v1.0.2,latest".to_string()));
    assert_eq!(
        coordinator.runtime().started_version.lock().unwrap().as_deref(),
        Some("v1.0.2")
    );
}

#[tokio::test(start_paused = true)]
async fn rollback_selects_previous_and_reuses() {
    let log = CallLog::default();
    let config = fleet_config();
    let coordinator = Coordinator::new(
        &config,
        FakeStore::new(&["v1.0.0", "v1.0.1", "v1.0.2", "latest"], &log),
        FakeRuntime::new(&log),
        FakeProber::healthy(&log),
    );

    let report = coordinator.rollback(None).await.unwrap();

    assert_eq!(report.target.tag, v(1, 0, 1));
    assert!(report.target.reused);
    assert_eq!(report.outcome(), RolloutOutcome::Success);
    assert!(position(&log, "build:").is_none(), "rollback must not rebuild");
    assert_eq!(
        coordinator.runtime().started_version.lock().unwrap().as_deref(),
        Some("v1.0.1")
    );
}

#[tokio::test(start_paused = true)]
async fn rollback_to_missing_version_is_image_not_found() {
    let log = CallLog::default();
    let config = fleet_config();
    let coordinator = Coordinator::new(
        &config,
        FakeStore::new(&["v1.0.0", "v1.0.1"], &log),
        FakeRuntime::new(&log).with_running(&["robot-1"]),
        FakeProber::healthy(&log),
    );

    let err = coordinator.rollback(Some("v9.9.9")).await.unwrap_err();

    match &err {
        RolloutError::ImageNotFound {
            requested,
            available,
            ..
        } => {
            assert_eq!(requested, "v9.9.9");
            assert_eq!(available.display_list(), "v1.0.1, v1.0.0");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(position(&log, "stop_all").is_none(), "nothing may be torn down");
    assert!(position(&log, "start_all").is_none());
    assert_eq!(coordinator.runtime().running.lock().unwrap().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn deploy_with_one_unhealthy_robot_fails_and_keeps_running() {
    let log = CallLog::default();
    let config = fleet_config();
    let coordinator = Coordinator::new(
        &config,
        FakeStore::new(&["v1.0.0"], &log),
        FakeRuntime::new(&log),
        FakeProber::failing(&["robot-2"], &log),
    );

    let report = coordinator.deploy(None).await.unwrap();

    assert_eq!(report.outcome(), RolloutOutcome::Failed(1));
    let failing: Vec<_> = report.health.failing().map(|r| r.robot_id.clone()).collect();
    assert_eq!(failing, ["robot-2"]);

    // No automatic revert: exactly one teardown, before startup.
    let stops = calls(&log).iter().filter(|c| c.starts_with("stop_all")).count();
    assert_eq!(stops, 1);
    assert_eq!(coordinator.runtime().running.lock().unwrap().len(), 3);
}

#[tokio::test(start_paused = true)]
async fn deploy_then_rollback_returns_to_predecessor() {
    let log = CallLog::default();
    let config = fleet_config();
    let coordinator = Coordinator::new(
        &config,
        FakeStore::new(&["v1.0.0"], &log),
        FakeRuntime::new(&log),
        FakeProber::healthy(&log),
    );

    let deployed = coordinator.deploy(None).await.unwrap();
    assert_eq!(deployed.target.tag, v(1, 0, 1));

    let rolled_back = coordinator.rollback(None).await.unwrap();
    assert_eq!(rolled_back.target.tag, v(1, 0, 0));
    assert!(rolled_back.target.reused);
}

#[tokio::test(start_paused = true)]
async fn rollback_without_history_is_insufficient() {
    let log = CallLog::default();
    let config = fleet_config();
    let coordinator = Coordinator::new(
        &config,
        FakeStore::new(&["v1.0.0", "latest"], &log),
        FakeRuntime::new(&log),
        FakeProber::healthy(&log),
    );

    let err = coordinator.rollback(None).await.unwrap_err();
    assert!(matches!(err, RolloutError::InsufficientHistory { .. }));
    assert!(position(&log, "stop_all").is_none());
}

#[tokio::test(start_paused = true)]
async fn bootstrap_deploy_on_empty_store() {
    let log = CallLog::default();
    let config = fleet_config();
    let coordinator = Coordinator::new(
        &config,
        FakeStore::new(&[], &log),
        FakeRuntime::new(&log),
        FakeProber::healthy(&log),
    );

    let report = coordinator.deploy(None).await.unwrap();
    assert_eq!(report.target.tag, v(1, 0, 0));
    assert!(!report.target.reused);
    assert!(report.replaced.is_empty());
}

#[tokio::test(start_paused = true)]
async fn build_failure_aborts_before_startup() {
    let log = CallLog::default();
    let config = fleet_config();
    let coordinator = Coordinator::new(
        &config,
        FakeStore::new(&["v1.0.0"], &log).failing_build(),
        FakeRuntime::new(&log).with_running(&["robot-1", "robot-2", "robot-3"]),
        FakeProber::healthy(&log),
    );

    let err = coordinator.deploy(None).await.unwrap_err();

    match &err {
        RolloutError::BuildFailed { tag, .. } => assert_eq!(tag, "v1.0.1"),
        other => panic!("unexpected error: {other}"),
    }
    assert!(position(&log, "start_all").is_none());
    assert!(position(&log, "probe:").is_none());
    assert!(!coordinator.store().has("v1.0.1"));
    assert!(!coordinator.store().has("latest"));
}

#[tokio::test(start_paused = true)]
async fn explicit_existing_version_is_reused() {
    let log = CallLog::default();
    let config = fleet_config();
    let coordinator = Coordinator::new(
        &config,
        FakeStore::new(&["v1.0.0", "v1.0.1"], &log),
        FakeRuntime::new(&log),
        FakeProber::healthy(&log),
    );

    let report = coordinator.deploy(Some("v1.0.0")).await.unwrap();
    assert_eq!(report.target.tag, v(1, 0, 0));
    assert!(report.target.reused);
    assert!(position(&log, "build:").is_none());
}

#[tokio::test(start_paused = true)]
async fn explicit_unknown_version_is_built_under_that_tag() {
    let log = CallLog::default();
    let config = fleet_config();
    let coordinator = Coordinator::new(
        &config,
        FakeStore::new(&["v1.0.0"], &log),
        FakeRuntime::new(&log),
        FakeProber::healthy(&log),
    );

    let report = coordinator.deploy(Some("v2.0.0")).await.unwrap();
    assert_eq!(report.target.tag, v(2, 0, 0));
    assert!(!report.target.reused);
    assert!(calls(&log).contains(&"build:v2.0.0,latest".to_string()));
}

#[tokio::test(start_paused = true)]
async fn explicit_malformed_tag_passes_through() {
    let log = CallLog::default();
    let config = fleet_config();
    let coordinator = Coordinator::new(
        &config,
        FakeStore::new(&["v1.0.0"], &log),
        FakeRuntime::new(&log),
        FakeProber::healthy(&log),
    );

    let report = coordinator.deploy(Some("hotfix")).await.unwrap();
    assert_eq!(report.target.tag, TargetTag::Unchecked("hotfix".to_string()));
    assert!(calls(&log).contains(&"build:hotfix,latest".to_string()));
}

#[tokio::test(start_paused = true)]
async fn steps_run_in_order() {
    let log = CallLog::default();
    let config = fleet_config();
    let coordinator = Coordinator::new(
        &config,
        FakeStore::new(&["v1.0.0"], &log),
        FakeRuntime::new(&log).with_port_owner(8002, "stray-container"),
        FakeProber::healthy(&log),
    );

    coordinator.deploy(None).await.unwrap();

    let teardown = position(&log, "stop_all").unwrap();
    let reclaim = position(&log, "stop:stray-container").unwrap();
    let build = position(&log, "build:").unwrap();
    let start = position(&log, "start_all").unwrap();
    let probe = position(&log, "probe:").unwrap();
    assert!(teardown < reclaim);
    assert!(reclaim < build);
    assert!(build < start);
    assert!(start < probe);

    let probes: Vec<_> = calls(&log)
        .into_iter()
        .filter(|c| c.starts_with("probe:"))
        .collect();
    assert_eq!(probes, ["probe:robot-1", "probe:robot-2", "probe:robot-3"]);
}

#[tokio::test(start_paused = true)]
async fn host_process_holding_a_port_is_stopped_before_startup() {
    let log = CallLog::default();
    let config = fleet_config();
    let coordinator = Coordinator::new(
        &config,
        FakeStore::new(&["v1.0.0"], &log),
        FakeRuntime::new(&log)
            .with_port_owner(8001, "4242")
            .with_port_owner(8003, "stray-container"),
        FakeProber::healthy(&log),
    );

    coordinator.deploy(None).await.unwrap();

    let host = position(&log, "stop:4242:HostProcess").unwrap();
    let container = position(&log, "stop:stray-container:Container").unwrap();
    let start = position(&log, "start_all").unwrap();
    assert!(host < container);
    assert!(container < start);
    assert!(coordinator.runtime().port_owners.lock().unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn health_is_checked_after_settle_interval() {
    let log = CallLog::default();
    let config = fleet_config();
    let probed_at = Arc::new(Mutex::new(None));
    let coordinator = Coordinator::new(
        &config,
        FakeStore::new(&["v1.0.0"], &log),
        FakeRuntime::new(&log),
        TimedProber {
            probed_at: probed_at.clone(),
        },
    );

    let started = tokio::time::Instant::now();
    coordinator.deploy(None).await.unwrap();

    let probed_at = probed_at.lock().unwrap().unwrap();
    assert!(probed_at - started >= SETTLE_INTERVAL);
}

#[tokio::test(start_paused = true)]
async fn report_serializes_for_json_output() {
    let log = CallLog::default();
    let config = fleet_config();
    let coordinator = Coordinator::new(
        &config,
        FakeStore::new(&["v1.0.0"], &log),
        FakeRuntime::new(&log).with_running(&["robot-1"]),
        FakeProber::failing(&["robot-3"], &log),
    );

    let report = coordinator.deploy(None).await.unwrap();
    let value = serde_json::to_value(&report).unwrap();

    assert_eq!(value["target"]["tag"], "v1.0.1");
    assert_eq!(value["target"]["reused"], false);
    assert_eq!(value["replaced"]["instances"], serde_json::json!(["robot-1"]));
    assert_eq!(value["health"]["outcome"]["verdict"], "failed");
    assert_eq!(value["health"]["outcome"]["unhealthy"], 1);
    assert_eq!(value["health"]["results"][2]["result"], "unhealthy");
}

/// Records when the first probe happened.
struct TimedProber {
    probed_at: Arc<Mutex<Option<tokio::time::Instant>>>,
}

impl fleet_health::Prober for TimedProber {
    fn probe<'a>(&'a self, _robot: &'a fleet_core::RobotConfig) -> fleet_health::ProbeFuture<'a> {
        self.probed_at
            .lock()
            .unwrap()
            .get_or_insert_with(tokio::time::Instant::now);
        Box::pin(async { fleet_health::ProbeResult::Healthy })
    }
}
