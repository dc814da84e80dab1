//! Single-step execution with bounded retry.

use std::sync::Arc;

use optiflow_core::{OptiflowError, ProtocolStep, Result, StepResult};
use tracing::{debug, error, info, warn};

use crate::config::RetryPolicy;
use crate::context::OrchestrationContext;
use crate::delay::{Delay, TokioDelay};
use crate::handler::HandlerRegistry;

/// Runs one protocol step through its registered handler.
///
/// Fatal, never retried:
/// - no handler for the action
/// - the step id already has a result in this session
/// - the handler's `validate` rejects the step
/// - a failed attempt cannot be rolled back
///
/// A handler `Err` is rolled back and retried under the [`RetryPolicy`],
/// with one session warning per retry and one session error on exhaustion.
#[derive(Clone)]
pub struct StepExecutor {
    registry: Arc<HandlerRegistry>,
    policy: RetryPolicy,
    delay: Arc<dyn Delay>,
}

impl StepExecutor {
    pub fn new(registry: HandlerRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
            policy: RetryPolicy::default(),
            delay: Arc::new(TokioDelay),
        }
    }

    /// Set the default retry policy.
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Replace the timer used between attempts.
    pub fn with_delay(mut self, delay: impl Delay + 'static) -> Self {
        self.delay = Arc::new(delay);
        self
    }

    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Run a step under the default policy.
    pub async fn run_step(
        &self,
        step: &ProtocolStep,
        context: &mut OrchestrationContext,
    ) -> Result<StepResult> {
        self.run_step_with(step, context, &self.policy).await
    }

    /// Run a step under an explicit policy.
    pub async fn run_step_with(
        &self,
        step: &ProtocolStep,
        context: &mut OrchestrationContext,
        policy: &RetryPolicy,
    ) -> Result<StepResult> {
        let Some(handler) = self.registry.get(step.action) else {
            let err = OptiflowError::NoHandler {
                action: step.action,
            };
            error!(step_id = %step.id, action = %step.action, "No handler registered");
            return Err(fail(context, err));
        };

        if context.step_result(&step.id).is_some() {
            error!(step_id = %step.id, "Step already has a result");
            return Err(fail(
                context,
                OptiflowError::DuplicateStep {
                    step_id: step.id.clone(),
                },
            ));
        }

        if let Err(e) = handler.validate(step).await {
            error!(step_id = %step.id, action = %step.action, error = %e, "Step rejected");
            return Err(fail(
                context,
                OptiflowError::StepRejected {
                    step_id: step.id.clone(),
                    action: step.action,
                    reason: e.to_string(),
                },
            ));
        }

        let max_attempts = policy.attempts();
        let mut attempt = 1;

        loop {
            debug!(
                step_id = %step.id,
                action = %step.action,
                attempt,
                max_attempts,
                "Running step"
            );

            match handler.handle(step, context).await {
                Ok(result) => {
                    info!(
                        step_id = %step.id,
                        success = result.success,
                        attempts = attempt,
                        "Step finished"
                    );
                    context.set_step_result(step.id.clone(), result.clone());
                    return Ok(result);
                }
                Err(e) => {
                    if let Err(rollback) = handler.rollback(step, context).await {
                        error!(
                            step_id = %step.id,
                            error = %e,
                            rollback_error = %rollback,
                            "Rollback failed"
                        );
                        return Err(fail(
                            context,
                            OptiflowError::RollbackFailed {
                                step_id: step.id.clone(),
                                message: e.to_string(),
                                rollback_error: rollback.to_string(),
                            },
                        ));
                    }

                    if attempt >= max_attempts {
                        error!(step_id = %step.id, attempts = attempt, error = %e, "Step failed");
                        return Err(fail(
                            context,
                            OptiflowError::StepFailed {
                                step_id: step.id.clone(),
                                attempts: attempt,
                                message: e.to_string(),
                            },
                        ));
                    }

                    warn!(step_id = %step.id, attempt, error = %e, "Step attempt failed, retrying");
                    context.add_warning(format!(
                        "Retry attempt {} for step {}: {}",
                        attempt, step.id, e
                    ));
                    self.delay.wait(policy.delay()).await;
                    attempt += 1;
                }
            }
        }
    }
}

/// Record a fatal error on the session and hand it back.
fn fail(context: &mut OrchestrationContext, err: OptiflowError) -> OptiflowError {
    context.add_error(err.to_string());
    err
}
