//! Error types for Optiflow.

use thiserror::Error;

use crate::document::StepAction;

/// Main error type for Optiflow operations.
#[derive(Error, Debug, Clone)]
pub enum OptiflowError {
    /// The configuration document could not be accepted.
    #[error("Invalid configuration document: {message}")]
    InvalidDocument {
        session_id: Option<String>,
        message: String,
    },

    /// No handler is registered for a step's action.
    #[error("No agent found for action type: {action}")]
    NoHandler { action: StepAction },

    /// A handler refused a step before running it.
    #[error("Step validation failed for action {action}: {reason}")]
    StepRejected {
        step_id: String,
        action: StepAction,
        reason: String,
    },

    /// A step id already has a recorded result in this session.
    #[error("Step {step_id} already has a recorded result")]
    DuplicateStep { step_id: String },

    /// A failed attempt could not be rolled back; retrying is unsafe.
    #[error("Step {step_id} failed and rollback failed: {message}. Rollback error: {rollback_error}")]
    RollbackFailed {
        step_id: String,
        message: String,
        rollback_error: String,
    },

    /// A step exhausted its retry budget.
    #[error("Step {step_id} failed after {attempts} attempts. Last error: {message}")]
    StepFailed {
        step_id: String,
        attempts: u32,
        message: String,
    },

    /// The protocol run stopped on an unexpected failure.
    #[error("Protocol execution failed: {message}")]
    ProtocolAborted { message: String },

    /// Resource not found.
    #[error("Resource not found: {resource_type} with id {id}")]
    NotFound { resource_type: String, id: String },

    /// Resource already exists.
    #[error("Resource already exists: {resource_type} with id {id}")]
    AlreadyExists { resource_type: String, id: String },

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Internal error (should not happen).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl OptiflowError {
    /// Returns true if the failure is a configuration problem rather than a
    /// step-level fault.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            OptiflowError::InvalidDocument { .. }
                | OptiflowError::NoHandler { .. }
                | OptiflowError::StepRejected { .. }
                | OptiflowError::DuplicateStep { .. }
        )
    }

    /// Returns the step ID if available.
    pub fn step_id(&self) -> Option<&str> {
        match self {
            OptiflowError::StepFailed { step_id, .. }
            | OptiflowError::StepRejected { step_id, .. }
            | OptiflowError::DuplicateStep { step_id }
            | OptiflowError::RollbackFailed { step_id, .. } => Some(step_id),
            _ => None,
        }
    }
}

/// Convenience Result type for Optiflow operations.
pub type Result<T> = std::result::Result<T, OptiflowError>;

impl From<serde_json::Error> for OptiflowError {
    fn from(err: serde_json::Error) -> Self {
        OptiflowError::SerializationError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_handler_message() {
        let err = OptiflowError::NoHandler {
            action: StepAction::SolveModel,
        };
        assert_eq!(err.to_string(), "No agent found for action type: solve_model");
        assert!(err.is_configuration_error());
    }

    #[test]
    fn test_step_failed_message() {
        let err = OptiflowError::StepFailed {
            step_id: "solve".to_string(),
            attempts: 2,
            message: "timeout".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Step solve failed after 2 attempts. Last error: timeout"
        );
        assert_eq!(err.step_id(), Some("solve"));
        assert!(!err.is_configuration_error());
    }

    #[test]
    fn test_step_rejected_message() {
        let err = OptiflowError::StepRejected {
            step_id: "solve".to_string(),
            action: StepAction::SolveModel,
            reason: "no solver configured".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Step validation failed for action solve_model: no solver configured"
        );
        assert!(err.is_configuration_error());
        assert_eq!(err.step_id(), Some("solve"));
    }
}
