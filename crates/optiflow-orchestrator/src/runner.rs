//! Fail-fast protocol execution.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use optiflow_core::{ConfigurationDocument, OptiflowError, RunResult};
use tracing::{error, info, info_span, warn, Instrument};

use crate::config::RunnerConfig;
use crate::context::OrchestrationContext;
use crate::executor::StepExecutor;

/// Drives a document's protocol from the first step to completion or to the
/// first failed step.
///
/// Steps run strictly in order. Once a step records an error no later step
/// is attempted, and the partial state is returned in the [`RunResult`].
pub struct ProtocolRunner {
    executor: StepExecutor,
    config: RunnerConfig,
}

impl ProtocolRunner {
    /// Runner using the executor's own retry policy.
    pub fn new(executor: StepExecutor) -> Self {
        let config = RunnerConfig {
            retry: *executor.policy(),
        };
        Self { executor, config }
    }

    pub fn with_config(executor: StepExecutor, config: RunnerConfig) -> Self {
        Self { executor, config }
    }

    pub fn executor(&self) -> &StepExecutor {
        &self.executor
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Run the protocol against a fresh session.
    ///
    /// Never fails: a panic while executing a step is recorded as
    /// `Protocol execution failed: <message>` and the run ends there.
    pub async fn run(&self, document: ConfigurationDocument) -> RunResult {
        let span = info_span!(
            "protocol_run",
            session_id = %document.session_id,
            steps = document.protocol.steps.len()
        );
        self.run_inner(document).instrument(span).await
    }

    async fn run_inner(&self, document: ConfigurationDocument) -> RunResult {
        let missing = self.executor.registry().missing_actions(&document.protocol);
        if !missing.is_empty() {
            warn!(?missing, "Protocol uses actions without handlers");
        }

        let document = Arc::new(document);
        let mut context = OrchestrationContext::new(document.clone());

        info!("🚀 Running protocol");
        let outcome = AssertUnwindSafe(self.drive(&mut context))
            .catch_unwind()
            .await;

        if let Err(panic) = outcome {
            let err = OptiflowError::ProtocolAborted {
                message: panic_message(panic.as_ref()),
            };
            error!(error = %err, "Protocol aborted");
            context.add_error(err.to_string());
        }

        let success = !context.has_errors();
        let state = context.into_state();
        if success {
            info!(completed = state.step_results.len(), "✅ Protocol completed");
        } else {
            warn!(
                step_index = state.current_step_index,
                errors = state.errors.len(),
                "❌ Protocol stopped"
            );
        }

        RunResult {
            success,
            state,
            document: Arc::try_unwrap(document).unwrap_or_else(|shared| (*shared).clone()),
        }
    }

    async fn drive(&self, context: &mut OrchestrationContext) {
        while !context.is_complete() {
            let Some(step) = context.current_step().cloned() else {
                break;
            };

            let outcome = self
                .executor
                .run_step_with(&step, context, &self.config.retry)
                .await;

            if outcome.is_err() || context.has_errors() {
                break;
            }
            context.advance_step();
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use optiflow_core::{Objective, ProtocolStep, StepAction, StepResult};

    use crate::config::RetryPolicy;
    use crate::delay::NoDelay;
    use crate::handler::{handler_fn, HandlerRegistry, StepHandler};

    struct Crashing;

    #[async_trait]
    impl StepHandler for Crashing {
        async fn handle(
            &self,
            _step: &ProtocolStep,
            _context: &mut OrchestrationContext,
        ) -> anyhow::Result<StepResult> {
            panic!("solver crashed");
        }
    }

    fn document(actions: &[(&str, StepAction)]) -> ConfigurationDocument {
        let mut builder = ConfigurationDocument::builder().objective(Objective::minimize("cost"));
        for (id, action) in actions {
            builder = builder.step(ProtocolStep::new(*id, *action));
        }
        builder.build().unwrap()
    }

    fn runner(registry: HandlerRegistry) -> ProtocolRunner {
        ProtocolRunner::new(
            StepExecutor::new(registry)
                .with_policy(RetryPolicy::new(2, 0))
                .with_delay(NoDelay),
        )
    }

    #[tokio::test]
    async fn test_empty_protocol_succeeds() {
        let result = runner(HandlerRegistry::new()).run(document(&[])).await;
        assert!(result.success);
        assert_eq!(result.state.current_step_index, 0);
    }

    #[tokio::test]
    async fn test_runs_every_step() {
        let registry = HandlerRegistry::new()
            .with_handler(
                StepAction::CollectData,
                handler_fn(|_| async { Ok(StepResult::ok()) }),
            )
            .with_handler(
                StepAction::SolveModel,
                handler_fn(|_| async { Ok(StepResult::ok()) }),
            );

        let doc = document(&[
            ("collect", StepAction::CollectData),
            ("solve", StepAction::SolveModel),
        ]);
        let result = runner(registry).run(doc.clone()).await;

        assert!(result.success);
        assert_eq!(result.completed_steps(), 2);
        assert_eq!(result.state.current_step_index, 2);
        assert_eq!(result.document, doc);
    }

    #[tokio::test]
    async fn test_missing_handler_stops_run() {
        let registry = HandlerRegistry::new().with_handler(
            StepAction::CollectData,
            handler_fn(|_| async { Ok(StepResult::ok()) }),
        );
        let result = runner(registry)
            .run(document(&[
                ("collect", StepAction::CollectData),
                ("solve", StepAction::SolveModel),
                ("explain", StepAction::ExplainSolution),
            ]))
            .await;

        assert!(!result.success);
        assert_eq!(result.state.current_step_index, 1);
        assert_eq!(result.completed_steps(), 1);
        assert_eq!(
            result.last_error(),
            Some("No agent found for action type: solve_model")
        );
    }

    #[tokio::test]
    async fn test_panic_becomes_terminal_error() {
        let registry = HandlerRegistry::new().with_handler(StepAction::BuildModel, Crashing);
        let result = runner(registry)
            .run(document(&[("build", StepAction::BuildModel)]))
            .await;

        assert!(!result.success);
        assert_eq!(
            result.state.errors,
            vec!["Protocol execution failed: solver crashed"]
        );
        assert!(result.state.step_results.is_empty());
    }

    #[test]
    fn test_panic_message() {
        let owned: Box<dyn Any + Send> = Box::new(String::from("owned"));
        let borrowed: Box<dyn Any + Send> = Box::new("borrowed");
        let other: Box<dyn Any + Send> = Box::new(42_u8);
        assert_eq!(panic_message(owned.as_ref()), "owned");
        assert_eq!(panic_message(borrowed.as_ref()), "borrowed");
        assert_eq!(panic_message(other.as_ref()), "unknown panic");
    }
}
