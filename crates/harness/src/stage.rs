use std::fmt::Display;
use std::future::Future;
use tracing::{info, warn};

/// Named phases of one test lifecycle, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Setup,
    ValidateNodeCount,
    ValidateService,
    Teardown,
}

impl Stage {
    pub fn name(self) -> &'static str {
        match self {
            Stage::Setup => "setup",
            Stage::ValidateNodeCount => "validate_node_count",
            Stage::ValidateService => "validate_service",
            Stage::Teardown => "teardown",
        }
    }

    fn skip_var(self) -> &'static str {
        match self {
            Stage::Setup => "SKIP_SETUP",
            Stage::ValidateNodeCount => "SKIP_VALIDATE_NODE_COUNT",
            Stage::ValidateService => "SKIP_VALIDATE_SERVICE",
            Stage::Teardown => "SKIP_TEARDOWN",
        }
    }
}

/// Whether a stage's unit of work executes in this run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StagePolicy {
    #[default]
    Run,
    Skip,
}

/// Per-stage policies, resolved once at startup rather than re-read from the
/// environment ad hoc inside each stage.
#[derive(Debug, Clone, Default)]
pub struct StagePlan {
    pub setup: StagePolicy,
    pub validate_node_count: StagePolicy,
    pub validate_service: StagePolicy,
    pub teardown: StagePolicy,
}

impl StagePlan {
    /// Resolves each stage's policy from its `SKIP_<STAGE>` toggle.
    pub fn from_env() -> Self {
        Self {
            setup: policy_from_env(Stage::Setup),
            validate_node_count: policy_from_env(Stage::ValidateNodeCount),
            validate_service: policy_from_env(Stage::ValidateService),
            teardown: policy_from_env(Stage::Teardown),
        }
    }

    pub fn policy(&self, stage: Stage) -> StagePolicy {
        match stage {
            Stage::Setup => self.setup,
            Stage::ValidateNodeCount => self.validate_node_count,
            Stage::ValidateService => self.validate_service,
            Stage::Teardown => self.teardown,
        }
    }
}

fn policy_from_env(stage: Stage) -> StagePolicy {
    match std::env::var(stage.skip_var()) {
        Ok(value) if value == "1" || value.eq_ignore_ascii_case("true") => StagePolicy::Skip,
        _ => StagePolicy::Run,
    }
}

/// Executes named lifecycle stages according to an injected plan. Failures
/// inside a stage's work are fatal to the run, never retried here.
pub struct StageRunner {
    plan: StagePlan,
}

impl StageRunner {
    pub fn new(plan: StagePlan) -> Self {
        Self { plan }
    }

    /// Runs the stage's unit of work unless the plan marks it skipped.
    pub async fn run<E, F, Fut>(&self, stage: Stage, work: F) -> Result<(), E>
    where
        E: Display,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<(), E>>,
    {
        match self.plan.policy(stage) {
            StagePolicy::Skip => {
                info!("Stage '{}' skipped", stage.name());
                Ok(())
            }
            StagePolicy::Run => {
                info!("Stage '{}' starting", stage.name());
                let result = work().await;
                match &result {
                    Ok(()) => info!("Stage '{}' completed", stage.name()),
                    Err(err) => warn!("Stage '{}' failed: {}", stage.name(), err),
                }
                result
            }
        }
    }
}

/// Awaits the lifecycle body, then the teardown future, regardless of how the
/// body exited. The teardown future is created by the caller before setup
/// runs; futures are lazy, so this gives register-before-setup,
/// execute-on-exit ordering. The body's failure takes precedence over a
/// teardown failure.
pub async fn run_with_teardown<T, E>(
    body: impl Future<Output = Result<T, E>>,
    teardown: impl Future<Output = Result<(), E>>,
) -> Result<T, E>
where
    E: Display,
{
    let outcome = body.await;
    let cleanup = teardown.await;
    match outcome {
        Ok(value) => cleanup.map(|_| value),
        Err(err) => {
            if let Err(cleanup_err) = cleanup {
                warn!("Teardown failed after earlier stage failure: {}", cleanup_err);
            }
            Err(err)
        }
    }
}
