//! Common enumerations used across Optiflow documents.
//!
//! Every enum exposes `VALUES`, the exact set of wire names it accepts, so the
//! structural validator can check enum membership on raw JSON.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle status of a configuration document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    /// Document is waiting to be run.
    #[default]
    Pending,
    /// A protocol run is in progress.
    InProgress,
    /// The last run completed successfully.
    Completed,
    /// The last run failed.
    Failed,
    /// The session was cancelled.
    Cancelled,
}

impl DocumentStatus {
    pub const VALUES: &'static [&'static str] =
        &["pending", "in_progress", "completed", "failed", "cancelled"];

    /// Returns true if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            DocumentStatus::Completed | DocumentStatus::Failed | DocumentStatus::Cancelled
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentStatus::Pending => "pending",
            DocumentStatus::InProgress => "in_progress",
            DocumentStatus::Completed => "completed",
            DocumentStatus::Failed => "failed",
            DocumentStatus::Cancelled => "cancelled",
        }
    }
}

/// Kind of optimization problem a document describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProblemType {
    VehicleRouting,
    FleetScheduling,
    ResourceScheduling,
    InventoryOptimization,
    ProductionPlanning,
    #[default]
    Custom,
}

impl ProblemType {
    pub const VALUES: &'static [&'static str] = &[
        "vehicle_routing",
        "fleet_scheduling",
        "resource_scheduling",
        "inventory_optimization",
        "production_planning",
        "custom",
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProblemType::VehicleRouting => "vehicle_routing",
            ProblemType::FleetScheduling => "fleet_scheduling",
            ProblemType::ResourceScheduling => "resource_scheduling",
            ProblemType::InventoryOptimization => "inventory_optimization",
            ProblemType::ProductionPlanning => "production_planning",
            ProblemType::Custom => "custom",
        }
    }

    /// Model key of the domain sub-model this problem type requires, if any.
    pub fn domain_key(&self) -> Option<&'static str> {
        match self {
            ProblemType::VehicleRouting | ProblemType::FleetScheduling => Some("fleet"),
            ProblemType::ResourceScheduling => Some("scheduling"),
            ProblemType::InventoryOptimization => Some("inventory"),
            ProblemType::ProductionPlanning => Some("production"),
            ProblemType::Custom => None,
        }
    }

    /// Parse a wire name.
    pub fn from_wire(value: &str) -> Option<Self> {
        match value {
            "vehicle_routing" => Some(ProblemType::VehicleRouting),
            "fleet_scheduling" => Some(ProblemType::FleetScheduling),
            "resource_scheduling" => Some(ProblemType::ResourceScheduling),
            "inventory_optimization" => Some(ProblemType::InventoryOptimization),
            "production_planning" => Some(ProblemType::ProductionPlanning),
            "custom" => Some(ProblemType::Custom),
            _ => None,
        }
    }
}

impl fmt::Display for ProblemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Industry vertical the problem belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Industry {
    Logistics,
    Delivery,
    FieldService,
    Custom,
}

impl Industry {
    pub const VALUES: &'static [&'static str] = &["logistics", "delivery", "field_service", "custom"];
}

/// Self-reported quality of the input dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataQuality {
    Good,
    Fair,
    Poor,
}

impl DataQuality {
    pub const VALUES: &'static [&'static str] = &["good", "fair", "poor"];
}

/// Declared type of a model variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariableType {
    Integer,
    Float,
    Number,
    String,
    Boolean,
    Array,
    Object,
    Datetime,
}

impl VariableType {
    pub const VALUES: &'static [&'static str] = &[
        "integer", "float", "number", "string", "boolean", "array", "object", "datetime",
    ];
}

/// Comparison operator of a constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintOperator {
    Eq,
    Neq,
    Gt,
    Gte,
    Lt,
    Lte,
    Between,
}

impl ConstraintOperator {
    pub const VALUES: &'static [&'static str] = &["eq", "neq", "gt", "gte", "lt", "lte", "between"];
}

/// How strictly a constraint must hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintPriority {
    #[default]
    Must,
    Should,
    NiceToHave,
}

impl ConstraintPriority {
    pub const VALUES: &'static [&'static str] = &["must", "should", "nice_to_have"];
}

/// Optimization direction of an objective.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectiveType {
    Minimize,
    Maximize,
}

impl ObjectiveType {
    pub const VALUES: &'static [&'static str] = &["minimize", "maximize"];
}
