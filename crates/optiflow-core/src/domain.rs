//! Domain-specific sub-models.
//!
//! A document carries at most one of these, selected by
//! `context.problemType`. On the wire each variant lives under its own key
//! of `model` (`fleet`, `scheduling`, `inventory`, `production`).

use serde::{Deserialize, Serialize};

use crate::types::ProblemType;

/// The domain sub-model attached to a document's model.
#[derive(Debug, Clone, PartialEq)]
pub enum DomainModel {
    Fleet(FleetModel),
    Scheduling(SchedulingModel),
    Inventory(InventoryModel),
    Production(ProductionModel),
}

impl DomainModel {
    /// The model key this variant is stored under.
    pub fn key(&self) -> &'static str {
        match self {
            DomainModel::Fleet(_) => "fleet",
            DomainModel::Scheduling(_) => "scheduling",
            DomainModel::Inventory(_) => "inventory",
            DomainModel::Production(_) => "production",
        }
    }

    /// Whether this sub-model belongs to the given problem type.
    pub fn matches(&self, problem_type: ProblemType) -> bool {
        problem_type.domain_key() == Some(self.key())
    }
}

// ---------------------------------------------------------------------------
// Fleet routing
// ---------------------------------------------------------------------------

/// Vehicles, depots and customers of a routing problem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FleetModel {
    pub vehicles: Vec<Vehicle>,
    pub depots: Vec<Location>,
    pub customers: Vec<Location>,
}

impl FleetModel {
    /// Sum of all vehicle capacities.
    pub fn total_capacity(&self) -> f64 {
        self.vehicles.iter().map(|v| v.capacity).sum()
    }

    /// Sum of all customer demand; customers without demand count as zero.
    pub fn total_demand(&self) -> f64 {
        self.customers.iter().map(|c| c.demand.unwrap_or(0.0)).sum()
    }
}

/// A vehicle type available to the fleet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vehicle {
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Load the vehicle can carry.
    pub capacity: f64,

    pub cost_per_km: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost_per_hour: Option<f64>,

    /// Maximum round-trip distance in kilometres.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_distance: Option<f64>,

    /// Maximum route duration in minutes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_duration: Option<f64>,
}

impl Vehicle {
    pub fn new(id: impl Into<String>, capacity: f64) -> Self {
        Self {
            id: id.into(),
            name: None,
            capacity,
            cost_per_km: 1.0,
            cost_per_hour: None,
            max_distance: None,
            max_duration: None,
        }
    }

    pub fn with_max_distance(mut self, km: f64) -> Self {
        self.max_distance = Some(km);
        self
    }
}

/// A depot or customer location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub id: String,
    pub latitude: f64,
    pub longitude: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub demand: Option<f64>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub time_windows: Vec<TimeSpan>,
}

impl Location {
    pub fn new(id: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            id: id.into(),
            latitude,
            longitude,
            address: None,
            demand: None,
            time_windows: Vec::new(),
        }
    }

    pub fn with_demand(mut self, demand: f64) -> Self {
        self.demand = Some(demand);
        self
    }
}

/// A start/end pair of RFC 3339 timestamps.
///
/// Kept as strings: the structural pass checks the format and the business
/// rules compare the parsed values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSpan {
    pub start: String,
    pub end: String,
}

impl TimeSpan {
    pub fn new(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Resource scheduling
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulingModel {
    #[serde(default)]
    pub resources: Vec<Resource>,
    #[serde(default)]
    pub tasks: Vec<Task>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub availability: Vec<TimeSpan>,
    #[serde(default)]
    pub cost: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub efficiency: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_workload: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// Duration in minutes.
    pub duration: f64,
    #[serde(default)]
    pub required_skills: Vec<String>,
    #[serde(default)]
    pub priority: i64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub earliest_start: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latest_end: Option<String>,
}

// ---------------------------------------------------------------------------
// Inventory
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryModel {
    #[serde(default)]
    pub products: Vec<Product>,
    #[serde(default)]
    pub warehouses: Vec<Warehouse>,
    #[serde(default)]
    pub demand_forecasts: Vec<DemandForecast>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub unit_cost: f64,
    pub holding_cost: f64,
    #[serde(default)]
    pub setup_cost: f64,
    /// Lead time in days.
    #[serde(default)]
    pub lead_time: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_order_quantity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_order_quantity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shelf_life: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Warehouse {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub capacity: f64,
    #[serde(default)]
    pub fixed_cost: f64,
    #[serde(default)]
    pub handling_cost: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DemandForecast {
    pub product_id: String,
    pub period: String,
    pub quantity: f64,
    #[serde(default)]
    pub confidence: f64,
}

// ---------------------------------------------------------------------------
// Production planning
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductionModel {
    #[serde(default)]
    pub machines: Vec<Machine>,
    #[serde(default)]
    pub materials: Vec<Material>,
    #[serde(default)]
    pub orders: Vec<ProductionOrder>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Machine {
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// Setup time in minutes.
    #[serde(default)]
    pub setup_time: f64,
    /// Units per hour.
    pub processing_rate: f64,
    #[serde(default)]
    pub capabilities: Vec<String>,
    #[serde(default)]
    pub cost_per_hour: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Material {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub cost: f64,
    #[serde(default)]
    pub lead_time: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supplier: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductionOrder {
    pub id: String,
    #[serde(default)]
    pub product_id: String,
    pub quantity: f64,
    #[serde(default)]
    pub due_date: String,
    #[serde(default)]
    pub priority: i64,
    #[serde(default)]
    pub routing_steps: Vec<RoutingStep>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutingStep {
    pub machine_type: String,
    #[serde(default)]
    pub duration: f64,
    #[serde(default)]
    pub materials: Vec<MaterialUsage>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterialUsage {
    pub material_id: String,
    pub quantity: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fleet_totals() {
        let fleet = FleetModel {
            vehicles: vec![Vehicle::new("v1", 60.0), Vehicle::new("v2", 40.0)],
            depots: vec![Location::new("d1", 37.77, -122.41)],
            customers: vec![
                Location::new("c1", 37.78, -122.41).with_demand(30.0),
                Location::new("c2", 37.79, -122.42),
            ],
        };

        assert_eq!(fleet.total_capacity(), 100.0);
        assert_eq!(fleet.total_demand(), 30.0);
    }

    #[test]
    fn test_domain_matches_problem_type() {
        let scheduling = DomainModel::Scheduling(SchedulingModel {
            resources: vec![],
            tasks: vec![],
        });
        assert!(scheduling.matches(ProblemType::ResourceScheduling));
        assert!(!scheduling.matches(ProblemType::VehicleRouting));
        assert!(!scheduling.matches(ProblemType::Custom));
    }

    #[test]
    fn test_location_wire_format() {
        let json = serde_json::json!({
            "id": "c1",
            "latitude": 37.7833,
            "longitude": -122.4167,
            "demand": 10,
            "timeWindows": [{ "start": "2024-03-20T09:00:00Z", "end": "2024-03-20T10:00:00Z" }]
        });
        let location: Location = serde_json::from_value(json).unwrap();
        assert_eq!(location.demand, Some(10.0));
        assert_eq!(location.time_windows.len(), 1);
    }
}
