//! Generic business rules that apply to every document.

use std::collections::HashSet;

use optiflow_core::ConfigurationDocument;
use serde_json::json;

use crate::error::ValidationError;

/// `lastModified` must not precede `created`.
pub fn check_temporal(doc: &ConfigurationDocument, errors: &mut Vec<ValidationError>) {
    if doc.last_modified < doc.created {
        errors.push(
            ValidationError::new("lastModified cannot be before created")
                .at("/lastModified")
                .with_details(json!({
                    "created": doc.created,
                    "lastModified": doc.last_modified,
                })),
        );
    }
}

/// Well-known actions must appear in non-decreasing rank order.
///
/// Tracks the running maximum rank; every step ranked below it is reported
/// once. Custom actions have no rank and are skipped.
pub fn check_step_order(doc: &ConfigurationDocument, errors: &mut Vec<ValidationError>) {
    let mut highest: Option<u8> = None;

    for (index, step) in doc.protocol.steps.iter().enumerate() {
        let Some(rank) = step.action.rank() else {
            continue;
        };
        match highest {
            Some(max) if rank < max => errors.push(
                ValidationError::new(format!(
                    "Invalid step order: {} cannot come after previous steps",
                    step.action
                ))
                .at(format!("/protocol/steps/{}/action", index)),
            ),
            _ => highest = Some(rank),
        }
    }
}

/// Variable names are unique within a model.
pub fn check_variable_names(doc: &ConfigurationDocument, errors: &mut Vec<ValidationError>) {
    let mut seen = HashSet::new();
    for (index, variable) in doc.model.variables.iter().enumerate() {
        if !seen.insert(variable.name.as_str()) {
            errors.push(
                ValidationError::new(format!("Duplicate variable name: {}", variable.name))
                    .at(format!("/model/variables/{}/name", index)),
            );
        }
    }
}

/// Step ids are unique within a protocol; each one keys a step result.
pub fn check_step_ids(doc: &ConfigurationDocument, errors: &mut Vec<ValidationError>) {
    let mut seen = HashSet::new();
    for (index, step) in doc.protocol.steps.iter().enumerate() {
        if !seen.insert(step.id.as_str()) {
            errors.push(
                ValidationError::new(format!("Duplicate step id: {}", step.id))
                    .at(format!("/protocol/steps/{}/id", index)),
            );
        }
    }
}

/// A protocol that requires human review must name its approval steps.
pub fn check_human_in_the_loop(doc: &ConfigurationDocument, errors: &mut Vec<ValidationError>) {
    let hitl = &doc.protocol.human_in_the_loop;
    if !hitl.required {
        return;
    }
    let named = hitl.approval_steps.as_ref().is_some_and(|steps| !steps.is_empty());
    if !named {
        errors.push(
            ValidationError::new(
                "Approval steps must be specified when human-in-the-loop is required",
            )
            .at("/protocol/humanInTheLoop/approvalSteps"),
        );
    }
}
