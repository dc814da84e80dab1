//! The two-pass configuration validator.

use optiflow_core::ConfigurationDocument;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::config::ValidatorConfig;
use crate::domain;
use crate::error::{ValidationError, ValidationErrors};
use crate::rules;
use crate::schema;

/// Validates configuration documents.
///
/// Runs the structural pass first; business rules only see documents that
/// passed it. Nothing is mutated, so one validator can be shared freely.
#[derive(Debug, Clone, Default)]
pub struct ConfigValidator {
    config: ValidatorConfig,
}

impl ConfigValidator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ValidatorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    /// Validate a typed document.
    pub fn validate(&self, doc: &ConfigurationDocument) -> ValidationErrors {
        let value = match serde_json::to_value(doc) {
            Ok(value) => value,
            Err(e) => {
                return vec![ValidationError::new(format!(
                    "Document could not be serialized: {}",
                    e
                ))]
            }
        };

        let structural = self.check_structure(&value);
        if !structural.is_empty() {
            info!(
                session_id = %doc.session_id,
                errors = structural.len(),
                "Document failed structural validation"
            );
            return structural;
        }

        self.check_rules(doc)
    }

    /// Validate a raw JSON document.
    pub fn validate_value(&self, value: &Value) -> ValidationErrors {
        let structural = self.check_structure(value);
        if !structural.is_empty() {
            info!(errors = structural.len(), "Document failed structural validation");
            return structural;
        }

        match ConfigurationDocument::deserialize(value) {
            Ok(doc) => self.check_rules(&doc),
            Err(e) => vec![ValidationError::new(format!(
                "Document does not match the schema: {}",
                e
            ))],
        }
    }

    /// Validate a JSON string.
    pub fn validate_str(&self, json: &str) -> ValidationErrors {
        match serde_json::from_str::<Value>(json) {
            Ok(value) => self.validate_value(&value),
            Err(e) => vec![ValidationError::new(format!("Invalid JSON: {}", e))],
        }
    }

    /// Whether a typed document passes both passes.
    pub fn is_valid(&self, doc: &ConfigurationDocument) -> bool {
        self.validate(doc).is_empty()
    }

    /// Structural pass only.
    pub fn check_structure(&self, value: &Value) -> ValidationErrors {
        schema::check(value)
    }

    /// Business-rule pass only. Every violation is collected.
    pub fn check_rules(&self, doc: &ConfigurationDocument) -> ValidationErrors {
        let mut errors = Vec::new();

        rules::check_temporal(doc, &mut errors);
        rules::check_step_order(doc, &mut errors);
        rules::check_step_ids(doc, &mut errors);
        rules::check_variable_names(doc, &mut errors);
        if self.config.domain_rules {
            domain::check(&doc.model, &self.config, &mut errors);
        }
        rules::check_human_in_the_loop(doc, &mut errors);

        debug!(
            session_id = %doc.session_id,
            problem_type = %doc.problem_type(),
            errors = errors.len(),
            "Business rules checked"
        );
        errors
    }
}
