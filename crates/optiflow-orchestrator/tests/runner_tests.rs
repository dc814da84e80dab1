use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use optiflow_core::{
    ConfigurationDocument, Objective, ProtocolStep, StepAction, StepResult, Variable, VariableType,
};
use optiflow_orchestrator::{
    handler_fn, HandlerRegistry, NoDelay, OrchestrationContext, ProtocolRunner, RetryPolicy,
    RunnerConfig, StepExecutor, StepHandler,
};
use serde_json::json;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn document(steps: &[(&str, StepAction)]) -> ConfigurationDocument {
    let mut builder = ConfigurationDocument::builder()
        .session_id("run-test")
        .objective(Objective::minimize("total_cost"))
        .variable(Variable::new("orders", VariableType::Array).with_default(json!([])));
    for (id, action) in steps {
        builder = builder.step(ProtocolStep::new(*id, *action));
    }
    builder.build().unwrap()
}

/// Counts calls and fails the first `failures` of them.
struct Counting {
    failures: u32,
    calls: Arc<AtomicU32>,
}

#[async_trait]
impl StepHandler for Counting {
    async fn handle(
        &self,
        _step: &ProtocolStep,
        _context: &mut OrchestrationContext,
    ) -> anyhow::Result<StepResult> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if call <= self.failures {
            anyhow::bail!("data source unavailable");
        }
        Ok(StepResult::ok())
    }
}

/// Writes into session state, as real collection handlers do.
struct LoadOrders;

#[async_trait]
impl StepHandler for LoadOrders {
    async fn handle(
        &self,
        step: &ProtocolStep,
        context: &mut OrchestrationContext,
    ) -> anyhow::Result<StepResult> {
        context.set_variable("orders", json!(["o-1", "o-2"]));
        Ok(StepResult::with_data(json!({ "loadedBy": step.id })))
    }
}

/// Fails unless a previous step populated `orders`.
struct BuildFromOrders;

#[async_trait]
impl StepHandler for BuildFromOrders {
    async fn handle(
        &self,
        _step: &ProtocolStep,
        context: &mut OrchestrationContext,
    ) -> anyhow::Result<StepResult> {
        let count = context
            .get_variable("orders")
            .and_then(|v| v.as_array())
            .map(Vec::len)
            .unwrap_or(0);
        anyhow::ensure!(count > 0, "no orders collected");
        Ok(StepResult::with_data(json!({ "orders": count })))
    }
}

fn config(max_attempts: u32) -> RunnerConfig {
    RunnerConfig {
        retry: RetryPolicy::new(max_attempts, 0),
    }
}

#[tokio::test]
async fn test_flaky_step_recovers_within_policy() {
    init_tracing();
    let calls = Arc::new(AtomicU32::new(0));
    let registry = HandlerRegistry::new().with_handler(
        StepAction::CollectData,
        Counting {
            failures: 2,
            calls: calls.clone(),
        },
    );
    let runner = ProtocolRunner::with_config(StepExecutor::new(registry).with_delay(NoDelay), config(3));

    let result = runner.run(document(&[("collect", StepAction::CollectData)])).await;

    assert!(result.success);
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert_eq!(result.state.warnings.len(), 2);
    assert!(result.state.errors.is_empty());
}

#[tokio::test]
async fn test_exhausted_step_fails_run() {
    init_tracing();
    let calls = Arc::new(AtomicU32::new(0));
    let registry = HandlerRegistry::new().with_handler(
        StepAction::CollectData,
        Counting {
            failures: u32::MAX,
            calls: calls.clone(),
        },
    );
    let runner = ProtocolRunner::with_config(StepExecutor::new(registry).with_delay(NoDelay), config(2));

    let result = runner.run(document(&[("collect", StepAction::CollectData)])).await;

    assert!(!result.success);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(result.state.errors.len(), 1);
    assert!(result.state.errors[0].contains("2 attempts"));
}

#[tokio::test]
async fn test_failure_stops_later_steps() {
    init_tracing();
    let later_calls = Arc::new(AtomicU32::new(0));
    let registry = HandlerRegistry::new()
        .with_handler(
            StepAction::CollectData,
            Counting {
                failures: u32::MAX,
                calls: Arc::new(AtomicU32::new(0)),
            },
        )
        .with_handler(
            StepAction::BuildModel,
            Counting {
                failures: 0,
                calls: later_calls.clone(),
            },
        );
    let runner = ProtocolRunner::with_config(StepExecutor::new(registry).with_delay(NoDelay), config(2));

    let result = runner
        .run(document(&[
            ("a", StepAction::CollectData),
            ("b", StepAction::BuildModel),
        ]))
        .await;

    assert!(!result.success);
    assert_eq!(result.state.current_step_index, 0);
    assert!(!result.state.step_results.contains_key("b"));
    assert_eq!(later_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_steps_share_session_state() {
    init_tracing();
    let registry = HandlerRegistry::new()
        .with_handler(StepAction::CollectData, LoadOrders)
        .with_handler(StepAction::BuildModel, BuildFromOrders)
        .with_handler(
            StepAction::SolveModel,
            handler_fn(|step| async move { Ok(StepResult::with_data(json!({ "solved": step.id }))) }),
        );
    let runner = ProtocolRunner::new(StepExecutor::new(registry).with_delay(NoDelay));

    let doc = document(&[
        ("collect", StepAction::CollectData),
        ("build", StepAction::BuildModel),
        ("solve", StepAction::SolveModel),
    ]);
    let result = runner.run(doc.clone()).await;

    assert!(result.success, "errors: {:?}", result.state.errors);
    assert_eq!(result.state.variables["orders"], json!(["o-1", "o-2"]));
    assert_eq!(
        result.state.step_results["build"].data,
        Some(json!({ "orders": 2 }))
    );
    assert_eq!(result.document, doc);
}

#[tokio::test]
async fn test_run_result_json_shape() {
    let registry = HandlerRegistry::new().with_handler(
        StepAction::CollectData,
        handler_fn(|_| async { Ok(StepResult::ok()) }),
    );
    let runner = ProtocolRunner::new(StepExecutor::new(registry).with_delay(NoDelay));
    let result = runner.run(document(&[("collect", StepAction::CollectData)])).await;

    let value = serde_json::to_value(&result).unwrap();
    assert_eq!(value["success"], json!(true));
    assert_eq!(value["state"]["currentStepIndex"], json!(1));
    assert_eq!(value["state"]["stepResults"]["collect"]["success"], json!(true));
    assert_eq!(value["document"]["sessionId"], json!("run-test"));
}

#[tokio::test]
async fn test_repeated_step_id_keeps_first_result() {
    init_tracing();
    let build_calls = Arc::new(AtomicU32::new(0));
    let registry = HandlerRegistry::new()
        .with_handler(
            StepAction::CollectData,
            handler_fn(|_| async { Ok(StepResult::with_data(json!("collected"))) }),
        )
        .with_handler(
            StepAction::BuildModel,
            Counting {
                failures: 0,
                calls: build_calls.clone(),
            },
        );
    let runner = ProtocolRunner::new(StepExecutor::new(registry).with_delay(NoDelay));

    let result = runner
        .run(document(&[
            ("s", StepAction::CollectData),
            ("s", StepAction::BuildModel),
        ]))
        .await;

    assert!(!result.success);
    assert_eq!(build_calls.load(Ordering::SeqCst), 0);
    assert_eq!(result.state.step_results["s"].data, Some(json!("collected")));
    assert_eq!(
        result.last_error(),
        Some("Step s already has a recorded result")
    );
}

/// Rejects every step it is asked to run.
struct Unconfigured;

#[async_trait]
impl StepHandler for Unconfigured {
    async fn handle(
        &self,
        _step: &ProtocolStep,
        _context: &mut OrchestrationContext,
    ) -> anyhow::Result<StepResult> {
        Ok(StepResult::ok())
    }

    async fn validate(&self, _step: &ProtocolStep) -> anyhow::Result<()> {
        anyhow::bail!("no solver licence")
    }
}

#[tokio::test]
async fn test_rejected_step_stops_run() {
    init_tracing();
    let registry = HandlerRegistry::new()
        .with_handler(StepAction::CollectData, LoadOrders)
        .with_handler(StepAction::SolveModel, Unconfigured);
    let runner = ProtocolRunner::new(StepExecutor::new(registry).with_delay(NoDelay));

    let result = runner
        .run(document(&[
            ("collect", StepAction::CollectData),
            ("solve", StepAction::SolveModel),
        ]))
        .await;

    assert!(!result.success);
    assert_eq!(result.state.current_step_index, 1);
    assert!(result.state.warnings.is_empty());
    assert_eq!(
        result.last_error(),
        Some("Step validation failed for action solve_model: no solver licence")
    );
}
