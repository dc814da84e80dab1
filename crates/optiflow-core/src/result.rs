//! Step, session and run result types.
//!
//! These are the JSON-serializable outputs of an orchestration run.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::document::ConfigurationDocument;

/// Outcome reported by a step handler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepResult {
    pub success: bool,

    /// Handler payload; never inspected by the engine.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl StepResult {
    /// A successful result without payload.
    pub fn ok() -> Self {
        Self {
            success: true,
            data: None,
            error: None,
            warnings: Vec::new(),
        }
    }

    /// A successful result carrying data.
    pub fn with_data(data: serde_json::Value) -> Self {
        Self {
            data: Some(data),
            ..Self::ok()
        }
    }

    /// An unsuccessful result reported by the handler itself.
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
            warnings: Vec::new(),
        }
    }

    /// Attach a warning.
    pub fn warn(mut self, warning: impl Into<String>) -> Self {
        self.warnings.push(warning.into());
        self
    }
}

/// Mutable working memory of one orchestration run.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    /// Variable bindings, seeded from the document's defaults.
    pub variables: HashMap<String, serde_json::Value>,

    /// Results keyed by step id.
    pub step_results: HashMap<String, StepResult>,

    /// Cursor into the protocol steps.
    pub current_step_index: usize,

    pub errors: Vec<String>,

    pub warnings: Vec<String>,
}

/// Final output of running a protocol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    /// True when no error was recorded.
    pub success: bool,

    /// Final session state, including partial results on failure.
    pub state: SessionState,

    /// The document that was run, unchanged.
    pub document: ConfigurationDocument,
}

impl RunResult {
    /// Number of steps that recorded a result.
    pub fn completed_steps(&self) -> usize {
        self.state.step_results.len()
    }

    /// The last recorded error, if the run failed.
    pub fn last_error(&self) -> Option<&str> {
        self.state.errors.last().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_result_constructors() {
        let ok = StepResult::with_data(serde_json::json!({ "rows": 3 })).warn("sparse data");
        assert!(ok.success);
        assert_eq!(ok.data.as_ref().unwrap()["rows"], 3);
        assert_eq!(ok.warnings, vec!["sparse data".to_string()]);

        let failed = StepResult::failed("solver unavailable");
        assert!(!failed.success);
        assert_eq!(failed.error.as_deref(), Some("solver unavailable"));
    }

    #[test]
    fn test_session_state_wire_format() {
        let mut state = SessionState::default();
        state.step_results.insert("collect".to_string(), StepResult::ok());
        state.current_step_index = 1;

        let value = serde_json::to_value(&state).unwrap();
        assert_eq!(value["currentStepIndex"], 1);
        assert_eq!(value["stepResults"]["collect"]["success"], true);
        assert!(value["stepResults"]["collect"].get("warnings").is_none());
        assert!(value["errors"].as_array().unwrap().is_empty());
    }
}
