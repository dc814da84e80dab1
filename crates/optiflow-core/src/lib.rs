//! # Optiflow Core
//!
//! Core types shared by the Optiflow orchestration engine and validator.
//!
//! This crate provides the fundamental building blocks:
//! - [`ConfigurationDocument`] - Declarative optimization-problem description
//! - [`DomainModel`] - Fleet, scheduling, inventory or production sub-model
//! - [`StepResult`], [`SessionState`], [`RunResult`] - Orchestration outputs
//! - [`OptiflowError`] - Error types

pub mod constraint;
pub mod document;
pub mod domain;
pub mod error;
pub mod result;
pub mod types;

// Re-exports for convenience
pub use constraint::{CapacityConstraint, DistanceConstraint, TimeWindowConstraint};
pub use document::{
    ConfigurationDocument, Constraint, Dataset, DocumentBuilder, Environment, HumanInTheLoop,
    Model, Objective, Objectives, ProblemContext, Protocol, ProtocolStep, StepAction, Variable,
};
pub use domain::DomainModel;
pub use error::{OptiflowError, Result};
pub use result::{RunResult, SessionState, StepResult};
pub use types::*;

/// Prelude module for common imports
pub mod prelude {
    pub use crate::document::{
        ConfigurationDocument, Constraint, DocumentBuilder, Objective, ProtocolStep, StepAction,
        Variable,
    };
    pub use crate::domain::DomainModel;
    pub use crate::error::{OptiflowError, Result};
    pub use crate::result::{RunResult, SessionState, StepResult};
    pub use crate::types::{DocumentStatus, ProblemType};
}
