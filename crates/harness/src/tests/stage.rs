use std::sync::atomic::{AtomicU32, Ordering};

use crate::stage::{run_with_teardown, Stage, StagePlan, StagePolicy, StageRunner};
use crate::HarnessError;

#[tokio::test]
async fn run_stage_executes_work_once() {
    let runner = StageRunner::new(StagePlan::default());
    let calls = AtomicU32::new(0);

    let result: Result<(), HarnessError> = runner
        .run(Stage::Setup, || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
        .await;

    assert!(result.is_ok());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn skipped_stage_does_not_execute_work() {
    let plan = StagePlan {
        validate_service: StagePolicy::Skip,
        ..Default::default()
    };
    let runner = StageRunner::new(plan);
    let calls = AtomicU32::new(0);

    let result: Result<(), HarnessError> = runner
        .run(Stage::ValidateService, || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
        .await;

    assert!(result.is_ok());
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn stage_failure_is_propagated() {
    let runner = StageRunner::new(StagePlan::default());

    let result: Result<(), HarnessError> = runner
        .run(Stage::Setup, || async {
            Err(HarnessError::Provisioning("apply exploded".to_string()))
        })
        .await;

    assert!(matches!(result, Err(HarnessError::Provisioning(_))));
}

#[tokio::test]
async fn teardown_runs_after_successful_body() {
    let runner = StageRunner::new(StagePlan::default());
    let teardowns = AtomicU32::new(0);

    let teardown = runner.run(Stage::Teardown, || async {
        teardowns.fetch_add(1, Ordering::SeqCst);
        Ok(())
    });
    let body = async { Ok::<_, HarnessError>(42) };

    let result = run_with_teardown(body, teardown).await.unwrap();

    assert_eq!(result, 42);
    assert_eq!(teardowns.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn teardown_runs_exactly_once_when_body_fails() {
    let runner = StageRunner::new(StagePlan::default());
    let teardowns = AtomicU32::new(0);

    let teardown = runner.run(Stage::Teardown, || async {
        teardowns.fetch_add(1, Ordering::SeqCst);
        Ok(())
    });
    let body = async {
        Err::<(), HarnessError>(HarnessError::Deployment("install failed".to_string()))
    };

    let result = run_with_teardown(body, teardown).await;

    assert!(matches!(result, Err(HarnessError::Deployment(_))));
    assert_eq!(teardowns.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn body_failure_takes_precedence_over_teardown_failure() {
    let runner = StageRunner::new(StagePlan::default());

    let teardown = runner.run(Stage::Teardown, || async {
        Err(HarnessError::Teardown("destroy exploded".to_string()))
    });
    let body = async {
        Err::<(), HarnessError>(HarnessError::Deployment("install failed".to_string()))
    };

    let result = run_with_teardown(body, teardown).await;

    assert!(matches!(result, Err(HarnessError::Deployment(_))));
}

#[tokio::test]
async fn teardown_failure_surfaces_when_body_succeeded() {
    let runner = StageRunner::new(StagePlan::default());

    let teardown = runner.run(Stage::Teardown, || async {
        Err(HarnessError::Teardown("destroy exploded".to_string()))
    });
    let body = async { Ok::<_, HarnessError>(()) };

    let result = run_with_teardown(body, teardown).await;

    assert!(matches!(result, Err(HarnessError::Teardown(_))));
}

#[test]
fn stage_plan_resolves_skip_toggles_from_env() {
    std::env::set_var("SKIP_VALIDATE_NODE_COUNT", "1");
    std::env::set_var("SKIP_TEARDOWN", "TRUE");

    let plan = StagePlan::from_env();

    std::env::remove_var("SKIP_VALIDATE_NODE_COUNT");
    std::env::remove_var("SKIP_TEARDOWN");

    assert_eq!(plan.setup, StagePolicy::Run);
    assert_eq!(plan.validate_node_count, StagePolicy::Skip);
    assert_eq!(plan.validate_service, StagePolicy::Run);
    assert_eq!(plan.teardown, StagePolicy::Skip);
}

#[test]
fn stage_names_match_their_toggles() {
    assert_eq!(Stage::Setup.name(), "setup");
    assert_eq!(Stage::ValidateNodeCount.name(), "validate_node_count");
    assert_eq!(Stage::ValidateService.name(), "validate_service");
    assert_eq!(Stage::Teardown.name(), "teardown");
}
