//! Convergence properties of the lifecycle reconciler against the mock
//! engine: idempotence, termination in the declared target status, and the
//! exact engine call sequences for the composite CLI scenarios.

use rpmbox_config::SandboxConfig;
use rpmbox_core::{CoreError, ImageStatus, Reconciler};
use rpmbox_engine::{ContainerEngine, ContainerStatus, MockEngine};

const IMAGE: &str = "rpm_build_env:f38";
const CONTAINER: &str = "rpm_builder_f38";

fn config() -> SandboxConfig {
    SandboxConfig {
        build_command: Some("/root/scripts/01-build-rpm.sh".to_owned()),
        mounts: Vec::new(),
        ..SandboxConfig::default()
    }
}

#[test]
fn ensure_image_exists_is_idempotent() {
    let engine = MockEngine::new();
    let cfg = config();
    let reconciler = Reconciler::new(&engine, &cfg);

    let first = reconciler.ensure_image_exists().unwrap();
    assert_eq!(first.current, ImageStatus::Present);

    engine.clear_calls();
    let second = reconciler.ensure_image_exists().unwrap();
    assert_eq!(second.current, ImageStatus::Present);
    assert!(
        engine.mutating_calls().is_empty(),
        "second pass must not mutate engine state"
    );
}

#[test]
fn ensure_image_removed_is_idempotent() {
    let engine = MockEngine::new().with_image(IMAGE);
    let cfg = config();
    let reconciler = Reconciler::new(&engine, &cfg);

    let first = reconciler.ensure_image_removed().unwrap();
    assert_eq!(first.current, ImageStatus::Absent);

    engine.clear_calls();
    let second = reconciler.ensure_image_removed().unwrap();
    assert_eq!(second.current, ImageStatus::Absent);
    assert!(engine.mutating_calls().is_empty());
}

#[test]
fn ensure_stopped_removed_is_idempotent() {
    let engine = MockEngine::new().with_running_container(CONTAINER);
    let cfg = config();
    let reconciler = Reconciler::new(&engine, &cfg);

    let first = reconciler.ensure_container_stopped_removed(true).unwrap();
    assert_eq!(first.current, ContainerStatus::Absent);

    engine.clear_calls();
    let second = reconciler.ensure_container_stopped_removed(true).unwrap();
    assert_eq!(second.current, ContainerStatus::Absent);
    assert!(engine.mutating_calls().is_empty());
}

#[test]
fn interactive_bringup_converges_from_every_status() {
    let cfg = config();

    // Absent: run a fresh container.
    let engine = MockEngine::new().with_image(IMAGE);
    let outcome = Reconciler::new(&engine, &cfg)
        .ensure_container_running(true)
        .unwrap();
    assert_eq!(outcome.prior, ContainerStatus::Absent);
    assert_eq!(outcome.current, ContainerStatus::Running);

    // Stopped: start the existing container.
    let engine = MockEngine::new()
        .with_image(IMAGE)
        .with_stopped_container(CONTAINER);
    let outcome = Reconciler::new(&engine, &cfg)
        .ensure_container_running(true)
        .unwrap();
    assert_eq!(outcome.current, ContainerStatus::Running);

    // Running: nothing to do.
    let engine = MockEngine::new()
        .with_image(IMAGE)
        .with_running_container(CONTAINER);
    let outcome = Reconciler::new(&engine, &cfg)
        .ensure_container_running(true)
        .unwrap();
    assert!(outcome.unchanged());
    assert!(engine.mutating_calls().is_empty());
}

#[test]
fn stop_and_remove_converges_to_absent_from_running_and_stopped() {
    let cfg = config();

    let engine = MockEngine::new().with_running_container(CONTAINER);
    let outcome = Reconciler::new(&engine, &cfg)
        .ensure_container_stopped_removed(true)
        .unwrap();
    assert_eq!(outcome.current, ContainerStatus::Absent);
    assert_eq!(
        engine.mutating_calls(),
        vec![
            format!("stop_container {CONTAINER}"),
            format!("remove_container {CONTAINER}"),
        ]
    );

    let engine = MockEngine::new().with_stopped_container(CONTAINER);
    let outcome = Reconciler::new(&engine, &cfg)
        .ensure_container_stopped_removed(true)
        .unwrap();
    assert_eq!(outcome.current, ContainerStatus::Absent);
    assert_eq!(
        engine.mutating_calls(),
        vec![format!("remove_container {CONTAINER}")]
    );
}

#[test]
fn stop_without_remove_never_issues_a_remove_call() {
    let cfg = config();
    let engine = MockEngine::new().with_running_container(CONTAINER);
    let outcome = Reconciler::new(&engine, &cfg)
        .ensure_container_stopped_removed(false)
        .unwrap();

    assert_eq!(outcome.prior, ContainerStatus::Running);
    assert_eq!(outcome.current, ContainerStatus::Stopped);
    assert_eq!(
        engine.mutating_calls(),
        vec![format!("stop_container {CONTAINER}")]
    );
}

#[test]
fn auto_removed_container_needs_no_explicit_remove() {
    // Stopping a container created with auto-remove deletes it; the re-query
    // observes Absent and the reconciler must not call remove on a container
    // that no longer exists.
    let cfg = config();
    let engine = MockEngine::new()
        .with_running_container(CONTAINER)
        .with_auto_remove_on_stop();
    let outcome = Reconciler::new(&engine, &cfg)
        .ensure_container_stopped_removed(true)
        .unwrap();

    assert_eq!(outcome.current, ContainerStatus::Absent);
    assert_eq!(
        engine.mutating_calls(),
        vec![format!("stop_container {CONTAINER}")]
    );
}

#[test]
fn auto_mode_builds_then_runs_the_command_once() {
    // Image absent, container absent, auto mode: build, then one one-shot
    // run whose container is reaped by the engine. No start, no post-run
    // correction.
    let cfg = config();
    let engine = MockEngine::new();
    let reconciler = Reconciler::new(&engine, &cfg);

    reconciler.ensure_image_exists().unwrap();
    let outcome = reconciler.ensure_container_running(false).unwrap();

    assert_eq!(outcome.current, ContainerStatus::Absent);
    assert_eq!(
        engine.mutating_calls(),
        vec![
            format!("build_image {IMAGE}"),
            format!("run_container {CONTAINER} oneshot /root/scripts/01-build-rpm.sh"),
        ]
    );
    assert_eq!(
        engine.container_status(CONTAINER).unwrap(),
        ContainerStatus::Absent
    );
}

#[test]
fn auto_mode_command_failure_is_the_run_error_class() {
    let cfg = config();
    let engine = MockEngine::new().with_image(IMAGE).with_oneshot_exit_code(5);
    let result = Reconciler::new(&engine, &cfg).ensure_container_running(false);

    match result {
        Err(CoreError::Run(_)) => {}
        other => panic!("expected run-class failure, got {other:?}"),
    }
}

#[test]
fn rerun_scenario_ends_running() {
    // Container running, rerun requested: stop, remove, then a fresh
    // interactive run that ends observed-running.
    let cfg = config();
    let engine = MockEngine::new()
        .with_image(IMAGE)
        .with_running_container(CONTAINER);
    let reconciler = Reconciler::new(&engine, &cfg);

    reconciler.ensure_container_stopped_removed(true).unwrap();
    reconciler.ensure_image_exists().unwrap();
    let outcome = reconciler.ensure_container_running(true).unwrap();

    assert_eq!(outcome.current, ContainerStatus::Running);
    assert_eq!(
        engine.mutating_calls(),
        vec![
            format!("stop_container {CONTAINER}"),
            format!("remove_container {CONTAINER}"),
            format!("run_container {CONTAINER} detached"),
        ]
    );
}
