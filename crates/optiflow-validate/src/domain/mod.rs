//! Domain validators, one per problem-type family.
//!
//! Selected by the variant of the model's [`DomainModel`]; the structural
//! pass has already guaranteed it matches `context.problemType`.

mod fleet;
mod inventory;
mod production;
mod scheduling;

use chrono::DateTime;
use optiflow_core::domain::TimeSpan;
use optiflow_core::{DomainModel, Model};

use crate::config::ValidatorConfig;
use crate::error::ValidationError;

/// Run the rules of whichever domain the model carries.
pub fn check(model: &Model, config: &ValidatorConfig, errors: &mut Vec<ValidationError>) {
    match &model.domain {
        Some(DomainModel::Fleet(fleet)) => fleet::check(fleet, &model.constraints, config, errors),
        Some(DomainModel::Scheduling(scheduling)) => scheduling::check(scheduling, errors),
        Some(DomainModel::Inventory(inventory)) => inventory::check(inventory, errors),
        Some(DomainModel::Production(production)) => production::check(production, errors),
        None => {}
    }
}

/// A window must end strictly after it starts.
///
/// Unparseable bounds are left to the structural pass.
fn check_window(owner: &str, span: &TimeSpan, field: String, errors: &mut Vec<ValidationError>) {
    let (Ok(start), Ok(end)) = (
        DateTime::parse_from_rfc3339(&span.start),
        DateTime::parse_from_rfc3339(&span.end),
    ) else {
        return;
    };
    if end <= start {
        errors.push(
            ValidationError::new(format!(
                "Invalid time window for {}: end must be after start",
                owner
            ))
            .at(field),
        );
    }
}
