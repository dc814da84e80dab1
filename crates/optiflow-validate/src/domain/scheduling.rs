//! Resource scheduling rules.

use optiflow_core::domain::SchedulingModel;

use super::check_window;
use crate::error::ValidationError;

pub(super) fn check(model: &SchedulingModel, errors: &mut Vec<ValidationError>) {
    if model.resources.is_empty() {
        errors.push(
            ValidationError::new("Scheduling problem must have at least one resource")
                .at("/model/scheduling/resources"),
        );
    }

    for (index, resource) in model.resources.iter().enumerate() {
        let path = format!("/model/scheduling/resources/{}", index);
        if resource.id.is_empty() {
            errors.push(
                ValidationError::new(format!("Resource at index {} must have an id", index))
                    .at(format!("{}/id", path)),
            );
        }
        if resource.skills.is_empty() {
            errors.push(
                ValidationError::new(format!(
                    "Resource {} must have at least one skill",
                    resource.id
                ))
                .at(format!("{}/skills", path)),
            );
        }
        if resource.availability.is_empty() {
            errors.push(
                ValidationError::new(format!(
                    "Resource {} must have availability defined",
                    resource.id
                ))
                .at(format!("{}/availability", path)),
            );
        }
        for (w, window) in resource.availability.iter().enumerate() {
            check_window(
                &format!("resource {}", resource.id),
                window,
                format!("{}/availability/{}", path, w),
                errors,
            );
        }
    }

    if model.tasks.is_empty() {
        errors.push(
            ValidationError::new("Scheduling problem must have at least one task")
                .at("/model/scheduling/tasks"),
        );
    }

    for (index, task) in model.tasks.iter().enumerate() {
        let path = format!("/model/scheduling/tasks/{}", index);
        if task.id.is_empty() {
            errors.push(
                ValidationError::new(format!("Task at index {} must have an id", index))
                    .at(format!("{}/id", path)),
            );
        }
        if task.required_skills.is_empty() {
            errors.push(
                ValidationError::new(format!("Task {} must have required skills", task.id))
                    .at(format!("{}/requiredSkills", path)),
            );
        }
        if task.duration <= 0.0 {
            errors.push(
                ValidationError::new(format!("Task {} must have positive duration", task.id))
                    .at(format!("{}/duration", path)),
            );
        }
    }
}
