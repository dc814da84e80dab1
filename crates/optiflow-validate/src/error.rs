//! Validation error type.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One violation found in a configuration document.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[error("{message}")]
pub struct ValidationError {
    /// Human-readable description naming the offending field or entity.
    pub message: String,

    /// JSON pointer of the offending field, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,

    /// Structured context (e.g. computed totals).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            field: None,
            details: None,
        }
    }

    /// Attach the JSON pointer of the offending field.
    pub fn at(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }
}

/// Ordered list of violations; empty means valid.
pub type ValidationErrors = Vec<ValidationError>;
