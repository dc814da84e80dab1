//! Inventory optimization rules.

use optiflow_core::domain::InventoryModel;

use crate::error::ValidationError;

pub(super) fn check(model: &InventoryModel, errors: &mut Vec<ValidationError>) {
    if model.products.is_empty() {
        errors.push(
            ValidationError::new("Inventory problem must have at least one product")
                .at("/model/inventory/products"),
        );
    }

    for (index, product) in model.products.iter().enumerate() {
        let path = format!("/model/inventory/products/{}", index);
        if product.id.is_empty() {
            errors.push(
                ValidationError::new(format!("Product at index {} must have an id", index))
                    .at(format!("{}/id", path)),
            );
        }
        if product.unit_cost < 0.0 {
            errors.push(
                ValidationError::new(format!(
                    "Product {} must have non-negative unit cost",
                    product.id
                ))
                .at(format!("{}/unitCost", path)),
            );
        }
        if product.holding_cost < 0.0 {
            errors.push(
                ValidationError::new(format!(
                    "Product {} must have non-negative holding cost",
                    product.id
                ))
                .at(format!("{}/holdingCost", path)),
            );
        }
    }

    if model.warehouses.is_empty() {
        errors.push(
            ValidationError::new("Inventory problem must have at least one warehouse")
                .at("/model/inventory/warehouses"),
        );
    }

    for (index, warehouse) in model.warehouses.iter().enumerate() {
        let path = format!("/model/inventory/warehouses/{}", index);
        if warehouse.id.is_empty() {
            errors.push(
                ValidationError::new(format!("Warehouse at index {} must have an id", index))
                    .at(format!("{}/id", path)),
            );
        }
        if warehouse.capacity <= 0.0 {
            errors.push(
                ValidationError::new(format!(
                    "Warehouse {} must have positive capacity",
                    warehouse.id
                ))
                .at(format!("{}/capacity", path)),
            );
        }
    }

    if model.demand_forecasts.is_empty() {
        errors.push(
            ValidationError::new("Inventory problem must have at least one demand forecast")
                .at("/model/inventory/demandForecasts"),
        );
    }
}
