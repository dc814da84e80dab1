//! Per-run session state.

use std::sync::Arc;

use optiflow_core::{ConfigurationDocument, ProtocolStep, SessionState, StepResult};
use serde_json::Value;

/// Mutable working memory of one orchestration run.
///
/// Owns the [`SessionState`] exclusively; handlers receive `&mut` access for
/// the duration of their call. The document is shared read-only.
#[derive(Debug)]
pub struct OrchestrationContext {
    document: Arc<ConfigurationDocument>,
    state: SessionState,
}

impl OrchestrationContext {
    /// Create a fresh context, seeding variables from the document's
    /// defaults. Variables without a default start as `null`.
    pub fn new(document: Arc<ConfigurationDocument>) -> Self {
        let variables = document
            .model
            .variables
            .iter()
            .map(|v| (v.name.clone(), v.default.clone().unwrap_or(Value::Null)))
            .collect();

        Self {
            document,
            state: SessionState {
                variables,
                ..Default::default()
            },
        }
    }

    pub fn document(&self) -> &ConfigurationDocument {
        &self.document
    }

    pub fn get_variable(&self, name: &str) -> Option<&Value> {
        self.state.variables.get(name)
    }

    pub fn set_variable(&mut self, name: impl Into<String>, value: Value) {
        self.state.variables.insert(name.into(), value);
    }

    /// The step under the cursor, or `None` once the protocol is exhausted.
    pub fn current_step(&self) -> Option<&ProtocolStep> {
        self.document.protocol.steps.get(self.state.current_step_index)
    }

    pub fn current_step_index(&self) -> usize {
        self.state.current_step_index
    }

    /// Move the cursor forward. No bounds check; see [`Self::is_complete`].
    pub fn advance_step(&mut self) {
        self.state.current_step_index += 1;
    }

    pub fn set_step_result(&mut self, step_id: impl Into<String>, result: StepResult) {
        self.state.step_results.insert(step_id.into(), result);
    }

    pub fn step_result(&self, step_id: &str) -> Option<&StepResult> {
        self.state.step_results.get(step_id)
    }

    pub fn add_error(&mut self, message: impl Into<String>) {
        self.state.errors.push(message.into());
    }

    pub fn add_warning(&mut self, message: impl Into<String>) {
        self.state.warnings.push(message.into());
    }

    pub fn has_errors(&self) -> bool {
        !self.state.errors.is_empty()
    }

    pub fn is_complete(&self) -> bool {
        self.state.current_step_index >= self.document.protocol.steps.len()
    }

    /// A snapshot of the session state. Mutating it does not affect the
    /// context.
    pub fn state(&self) -> SessionState {
        self.state.clone()
    }

    /// Consume the context, returning the final state.
    pub fn into_state(self) -> SessionState {
        self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use optiflow_core::{Objective, StepAction, Variable, VariableType};
    use serde_json::json;

    fn document() -> Arc<ConfigurationDocument> {
        Arc::new(
            ConfigurationDocument::builder()
                .objective(Objective::minimize("cost"))
                .variable(Variable::new("budget", VariableType::Number).with_default(json!(500)))
                .variable(Variable::new("route", VariableType::Array))
                .step(ProtocolStep::new("collect", StepAction::CollectData))
                .step(ProtocolStep::new("solve", StepAction::SolveModel))
                .build()
                .unwrap(),
        )
    }

    #[test]
    fn test_variables_seeded_from_defaults() {
        let ctx = OrchestrationContext::new(document());
        assert_eq!(ctx.get_variable("budget"), Some(&json!(500)));
        assert_eq!(ctx.get_variable("route"), Some(&Value::Null));
        assert_eq!(ctx.get_variable("missing"), None);
    }

    #[test]
    fn test_cursor() {
        let mut ctx = OrchestrationContext::new(document());
        assert_eq!(ctx.current_step().unwrap().id, "collect");
        assert!(!ctx.is_complete());

        ctx.advance_step();
        assert_eq!(ctx.current_step().unwrap().id, "solve");

        ctx.advance_step();
        assert!(ctx.is_complete());
        assert!(ctx.current_step().is_none());

        ctx.advance_step();
        assert_eq!(ctx.current_step_index(), 3);
        assert!(ctx.current_step().is_none());
    }

    #[test]
    fn test_state_is_a_copy() {
        let mut ctx = OrchestrationContext::new(document());
        ctx.set_step_result("collect", StepResult::ok());

        let mut snapshot = ctx.state();
        snapshot.errors.push("tampered".to_string());
        snapshot.step_results.clear();
        snapshot.variables.insert("budget".to_string(), json!(0));

        assert!(!ctx.has_errors());
        assert!(ctx.step_result("collect").is_some());
        assert_eq!(ctx.get_variable("budget"), Some(&json!(500)));
    }

    #[test]
    fn test_errors_and_warnings() {
        let mut ctx = OrchestrationContext::new(document());
        ctx.add_warning("slow data source");
        assert!(!ctx.has_errors());

        ctx.add_error("boom");
        assert!(ctx.has_errors());

        let state = ctx.into_state();
        assert_eq!(state.warnings, vec!["slow data source"]);
        assert_eq!(state.errors, vec!["boom"]);
    }
}
