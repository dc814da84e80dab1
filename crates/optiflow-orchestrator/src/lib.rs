//! # Optiflow Orchestrator
//!
//! Executes the ordered steps of a configuration document's protocol.
//!
//! - [`OrchestrationContext`] - per-run session state
//! - [`StepHandler`] / [`HandlerRegistry`] - action implementations
//! - [`StepExecutor`] - one step, with bounded retry
//! - [`ProtocolRunner`] - all steps, fail-fast
//!
//! ```ignore
//! let registry = HandlerRegistry::new()
//!     .with_handler(StepAction::CollectData, handler_fn(|_| async { Ok(StepResult::ok()) }));
//! let runner = ProtocolRunner::new(StepExecutor::new(registry));
//! let result = runner.run(document).await;
//! ```

pub mod config;
pub mod context;
pub mod delay;
pub mod executor;
pub mod handler;
pub mod runner;

pub use config::{RetryPolicy, RunnerConfig};
pub use context::OrchestrationContext;
pub use delay::{Delay, NoDelay, TokioDelay};
pub use executor::StepExecutor;
pub use handler::{handler_fn, FnHandler, HandlerMetadata, HandlerRegistry, StepHandler};
pub use runner::ProtocolRunner;
