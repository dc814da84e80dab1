//! Fleet routing rules.

use optiflow_core::domain::FleetModel;
use optiflow_core::Constraint;
use serde_json::json;

use super::check_window;
use crate::config::ValidatorConfig;
use crate::error::ValidationError;
use crate::geo;

pub(super) fn check(
    fleet: &FleetModel,
    constraints: &[Constraint],
    config: &ValidatorConfig,
    errors: &mut Vec<ValidationError>,
) {
    check_reachability(fleet, config.earth_radius_km, errors);
    check_capacity(fleet, errors);

    if !constraints
        .iter()
        .any(|c| c.is_kind(&config.fleet_constraint_kinds))
    {
        errors.push(
            ValidationError::new(format!(
                "Fleet problems must include at least one {} constraint",
                config.fleet_constraint_kinds.join(" or ")
            ))
            .at("/model/constraints"),
        );
    }

    for (index, customer) in fleet.customers.iter().enumerate() {
        for (w, window) in customer.time_windows.iter().enumerate() {
            check_window(
                &format!("customer {}", customer.id),
                window,
                format!("/model/fleet/customers/{}/timeWindows/{}", index, w),
                errors,
            );
        }
    }
}

/// Each customer must lie within the round-trip limit of some vehicle,
/// measured from the customer's nearest depot.
fn check_reachability(fleet: &FleetModel, radius: f64, errors: &mut Vec<ValidationError>) {
    for (index, customer) in fleet.customers.iter().enumerate() {
        let Some(distance) = geo::nearest_depot_distance(customer, &fleet.depots, radius) else {
            continue;
        };
        let round_trip = 2.0 * distance;
        let reachable = fleet
            .vehicles
            .iter()
            .any(|v| v.max_distance.map_or(true, |max| round_trip <= max));

        if !reachable {
            tracing::debug!(customer = %customer.id, round_trip, "customer out of range");
            errors.push(
                ValidationError::new(format!(
                    "Customer {} cannot be serviced by any vehicle due to distance constraints",
                    customer.id
                ))
                .at(format!("/model/fleet/customers/{}", index))
                .with_details(json!({ "roundTripKm": round_trip })),
            );
        }
    }
}

fn check_capacity(fleet: &FleetModel, errors: &mut Vec<ValidationError>) {
    let capacity = fleet.total_capacity();
    let demand = fleet.total_demand();
    if capacity < demand {
        errors.push(
            ValidationError::new(format!(
                "Total fleet capacity ({}) is insufficient for total customer demand ({})",
                capacity, demand
            ))
            .at("/model/fleet/vehicles")
            .with_details(json!({
                "totalCapacity": capacity,
                "totalDemand": demand,
            })),
        );
    }
}
