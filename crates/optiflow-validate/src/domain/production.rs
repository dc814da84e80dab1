//! Production planning rules.

use optiflow_core::domain::ProductionModel;

use crate::error::ValidationError;

pub(super) fn check(model: &ProductionModel, errors: &mut Vec<ValidationError>) {
    if model.machines.is_empty() {
        errors.push(
            ValidationError::new("Production problem must have at least one machine")
                .at("/model/production/machines"),
        );
    }

    for (index, machine) in model.machines.iter().enumerate() {
        let path = format!("/model/production/machines/{}", index);
        if machine.id.is_empty() {
            errors.push(
                ValidationError::new(format!("Machine at index {} must have an id", index))
                    .at(format!("{}/id", path)),
            );
        }
        if machine.processing_rate <= 0.0 {
            errors.push(
                ValidationError::new(format!(
                    "Machine {} must have positive processing rate",
                    machine.id
                ))
                .at(format!("{}/processingRate", path)),
            );
        }
        if machine.capabilities.is_empty() {
            errors.push(
                ValidationError::new(format!(
                    "Machine {} must have at least one capability",
                    machine.id
                ))
                .at(format!("{}/capabilities", path)),
            );
        }
    }

    if model.materials.is_empty() {
        errors.push(
            ValidationError::new("Production problem must have at least one material")
                .at("/model/production/materials"),
        );
    }

    for (index, material) in model.materials.iter().enumerate() {
        let path = format!("/model/production/materials/{}", index);
        if material.id.is_empty() {
            errors.push(
                ValidationError::new(format!("Material at index {} must have an id", index))
                    .at(format!("{}/id", path)),
            );
        }
        if material.cost < 0.0 {
            errors.push(
                ValidationError::new(format!(
                    "Material {} must have non-negative cost",
                    material.id
                ))
                .at(format!("{}/cost", path)),
            );
        }
    }

    if model.orders.is_empty() {
        errors.push(
            ValidationError::new("Production problem must have at least one order")
                .at("/model/production/orders"),
        );
    }

    for (index, order) in model.orders.iter().enumerate() {
        let path = format!("/model/production/orders/{}", index);
        if order.id.is_empty() {
            errors.push(
                ValidationError::new(format!("Order at index {} must have an id", index))
                    .at(format!("{}/id", path)),
            );
        }
        if order.product_id.is_empty() {
            errors.push(
                ValidationError::new(format!("Order {} must have a product id", order.id))
                    .at(format!("{}/productId", path)),
            );
        }
        if order.quantity <= 0.0 {
            errors.push(
                ValidationError::new(format!("Order {} must have positive quantity", order.id))
                    .at(format!("{}/quantity", path)),
            );
        }
        if order.routing_steps.is_empty() {
            errors.push(
                ValidationError::new(format!(
                    "Order {} must have at least one routing step",
                    order.id
                ))
                .at(format!("{}/routingSteps", path)),
            );
        }
    }
}
