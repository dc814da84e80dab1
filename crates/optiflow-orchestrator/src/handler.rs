//! Step handlers and the action registry.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use optiflow_core::{OptiflowError, Protocol, ProtocolStep, Result, StepAction, StepResult};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::context::OrchestrationContext;

const RESOURCE: &str = "handler";

/// Implementation of one abstract step action.
///
/// Returning `Err` from [`handle`](Self::handle) marks the attempt as failed
/// and makes it eligible for retry. The error is only ever stringified,
/// never inspected.
#[async_trait]
pub trait StepHandler: Send + Sync {
    async fn handle(
        &self,
        step: &ProtocolStep,
        context: &mut OrchestrationContext,
    ) -> anyhow::Result<StepResult>;

    /// Checked once before the first attempt. `Err` rejects the step
    /// without running it; the reason is reported to the session.
    async fn validate(&self, _step: &ProtocolStep) -> anyhow::Result<()> {
        Ok(())
    }

    /// Undo the effects of a failed attempt. Runs after every failed
    /// attempt, before any retry.
    async fn rollback(
        &self,
        _step: &ProtocolStep,
        _context: &mut OrchestrationContext,
    ) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Descriptive information about a registered handler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandlerMetadata {
    pub name: String,

    #[serde(default)]
    pub description: String,

    pub version: String,

    #[serde(default)]
    pub author: String,

    /// Actions this handler expects to have run earlier in the protocol.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<StepAction>,
}

impl HandlerMetadata {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            version: version.into(),
            author: String::new(),
            dependencies: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn depends_on(mut self, action: StepAction) -> Self {
        self.dependencies.push(action);
        self
    }
}

/// Handler backed by an async closure over the step.
pub struct FnHandler<F> {
    f: F,
}

/// Wrap an async closure as a [`StepHandler`].
///
/// The closure receives an owned copy of the step and no context access;
/// implement [`StepHandler`] directly when the handler needs session state.
pub fn handler_fn<F, Fut>(f: F) -> FnHandler<F>
where
    F: Fn(ProtocolStep) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<StepResult>> + Send + 'static,
{
    FnHandler { f }
}

#[async_trait]
impl<F, Fut> StepHandler for FnHandler<F>
where
    F: Fn(ProtocolStep) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<StepResult>> + Send + 'static,
{
    async fn handle(
        &self,
        step: &ProtocolStep,
        _context: &mut OrchestrationContext,
    ) -> anyhow::Result<StepResult> {
        (self.f)(step.clone()).await
    }
}

#[derive(Clone)]
struct Registration {
    handler: Arc<dyn StepHandler>,
    metadata: Option<HandlerMetadata>,
}

/// Maps each action to its handler. Read-only once handed to an executor.
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    handlers: HashMap<StepAction, Registration>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler. Fails if the action already has one.
    pub fn register(&mut self, action: StepAction, handler: impl StepHandler + 'static) -> Result<()> {
        self.insert(action, Arc::new(handler), None)
    }

    /// Register a handler together with its metadata.
    pub fn register_with_metadata(
        &mut self,
        action: StepAction,
        handler: impl StepHandler + 'static,
        metadata: HandlerMetadata,
    ) -> Result<()> {
        self.insert(action, Arc::new(handler), Some(metadata))
    }

    /// Builder-style [`Self::register`].
    ///
    /// A duplicate registration is logged and ignored; the first handler
    /// for an action stays in place.
    pub fn with_handler(mut self, action: StepAction, handler: impl StepHandler + 'static) -> Self {
        if let Err(e) = self.register(action, handler) {
            warn!(%action, error = %e, "Ignoring duplicate handler");
        }
        self
    }

    fn insert(
        &mut self,
        action: StepAction,
        handler: Arc<dyn StepHandler>,
        metadata: Option<HandlerMetadata>,
    ) -> Result<()> {
        if self.handlers.contains_key(&action) {
            return Err(OptiflowError::AlreadyExists {
                resource_type: RESOURCE.to_string(),
                id: action.to_string(),
            });
        }

        info!(
            %action,
            name = metadata.as_ref().map(|m| m.name.as_str()),
            "Registered handler"
        );
        self.handlers.insert(action, Registration { handler, metadata });
        Ok(())
    }

    /// Remove the handler for an action.
    pub fn unregister(&mut self, action: StepAction) -> Result<()> {
        match self.handlers.remove(&action) {
            Some(_) => Ok(()),
            None => Err(OptiflowError::NotFound {
                resource_type: RESOURCE.to_string(),
                id: action.to_string(),
            }),
        }
    }

    pub fn get(&self, action: StepAction) -> Option<Arc<dyn StepHandler>> {
        self.handlers.get(&action).map(|r| r.handler.clone())
    }

    pub fn metadata(&self, action: StepAction) -> Option<&HandlerMetadata> {
        self.handlers.get(&action).and_then(|r| r.metadata.as_ref())
    }

    /// Registered actions with their metadata, ordered by action name.
    pub fn list(&self) -> Vec<(StepAction, Option<&HandlerMetadata>)> {
        let mut entries: Vec<_> = self
            .handlers
            .iter()
            .map(|(action, r)| (*action, r.metadata.as_ref()))
            .collect();
        entries.sort_by_key(|(action, _)| action.as_str());
        entries
    }

    pub fn contains(&self, action: StepAction) -> bool {
        self.handlers.contains_key(&action)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Actions used by the protocol that have no handler, in first-use
    /// order and without duplicates.
    pub fn missing_actions(&self, protocol: &Protocol) -> Vec<StepAction> {
        let mut missing = Vec::new();
        for step in &protocol.steps {
            if !self.contains(step.action) && !missing.contains(&step.action) {
                missing.push(step.action);
            }
        }
        missing
    }
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut actions: Vec<_> = self.handlers.keys().map(StepAction::as_str).collect();
        actions.sort_unstable();
        f.debug_struct("HandlerRegistry")
            .field("actions", &actions)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use optiflow_core::{ConfigurationDocument, Objective};
    use serde_json::json;

    fn document() -> Arc<ConfigurationDocument> {
        Arc::new(
            ConfigurationDocument::builder()
                .objective(Objective::minimize("cost"))
                .step(ProtocolStep::new("collect", StepAction::CollectData))
                .step(ProtocolStep::new("solve", StepAction::SolveModel))
                .step(ProtocolStep::new("resolve", StepAction::SolveModel))
                .step(ProtocolStep::new("explain", StepAction::ExplainSolution))
                .build()
                .unwrap(),
        )
    }

    #[test]
    fn test_missing_actions() {
        let registry = HandlerRegistry::new().with_handler(
            StepAction::CollectData,
            handler_fn(|_| async { Ok(StepResult::ok()) }),
        );

        let doc = document();
        assert_eq!(
            registry.missing_actions(&doc.protocol),
            vec![StepAction::SolveModel, StepAction::ExplainSolution]
        );
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn test_handler_fn_receives_step() {
        let handler = handler_fn(|step: ProtocolStep| async move {
            Ok(StepResult::with_data(json!({ "step": step.id })))
        });

        let doc = document();
        let step = doc.protocol.steps[0].clone();
        let mut ctx = OrchestrationContext::new(doc);
        let result = handler.handle(&step, &mut ctx).await.unwrap();
        assert_eq!(result.data, Some(json!({ "step": "collect" })));
    }

    #[test]
    fn test_duplicate_registration_is_rejected() {
        let mut registry = HandlerRegistry::new();
        registry
            .register(StepAction::SolveModel, handler_fn(|_| async { Ok(StepResult::ok()) }))
            .unwrap();

        let err = registry
            .register(
                StepAction::SolveModel,
                handler_fn(|_| async { Ok(StepResult::failed("second")) }),
            )
            .unwrap_err();
        assert!(matches!(err, OptiflowError::AlreadyExists { .. }));
        assert_eq!(
            err.to_string(),
            "Resource already exists: handler with id solve_model"
        );
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn test_with_handler_keeps_first() {
        let registry = HandlerRegistry::new()
            .with_handler(
                StepAction::CollectData,
                handler_fn(|_| async { Ok(StepResult::ok()) }),
            )
            .with_handler(
                StepAction::CollectData,
                handler_fn(|_| async { Ok(StepResult::failed("replacement")) }),
            );

        let doc = document();
        let step = doc.protocol.steps[0].clone();
        let mut ctx = OrchestrationContext::new(doc);
        let handler = registry.get(StepAction::CollectData).unwrap();
        assert!(handler.handle(&step, &mut ctx).await.unwrap().success);
    }

    #[test]
    fn test_metadata_and_unregister() {
        let mut registry = HandlerRegistry::new();
        registry
            .register_with_metadata(
                StepAction::BuildModel,
                handler_fn(|_| async { Ok(StepResult::ok()) }),
                HandlerMetadata::new("milp-builder", "2.1.0")
                    .with_description("Builds a MILP from collected orders")
                    .depends_on(StepAction::CollectData),
            )
            .unwrap();
        registry
            .register(StepAction::CollectData, handler_fn(|_| async { Ok(StepResult::ok()) }))
            .unwrap();

        let meta = registry.metadata(StepAction::BuildModel).unwrap();
        assert_eq!(meta.dependencies, vec![StepAction::CollectData]);
        assert!(registry.metadata(StepAction::CollectData).is_none());

        let listed: Vec<_> = registry.list().into_iter().map(|(a, _)| a).collect();
        assert_eq!(listed, vec![StepAction::BuildModel, StepAction::CollectData]);

        registry.unregister(StepAction::BuildModel).unwrap();
        assert!(!registry.contains(StepAction::BuildModel));
        assert!(matches!(
            registry.unregister(StepAction::BuildModel),
            Err(OptiflowError::NotFound { .. })
        ));
    }
}
