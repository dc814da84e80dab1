//! Typed builders for common constraint kinds.

use crate::document::Constraint;
use crate::types::{ConstraintOperator, ConstraintPriority};

/// Upper bound on total load.
#[derive(Debug, Clone)]
pub struct CapacityConstraint {
    max_capacity: f64,
    priority: ConstraintPriority,
    penalty: Option<f64>,
}

impl CapacityConstraint {
    pub fn new(max_capacity: f64) -> Self {
        Self {
            max_capacity,
            priority: ConstraintPriority::Must,
            penalty: None,
        }
    }

    pub fn priority(mut self, priority: ConstraintPriority) -> Self {
        self.priority = priority;
        self
    }

    pub fn penalty(mut self, penalty: f64) -> Self {
        self.penalty = Some(penalty);
        self
    }

    pub fn build(self) -> Constraint {
        Constraint {
            kind: "capacity".to_string(),
            description: format!("Total load must not exceed {}", self.max_capacity),
            operator: ConstraintOperator::Lte,
            field: "total_load".to_string(),
            value: Some(serde_json::json!(self.max_capacity)),
            priority: Some(self.priority),
            penalty: self.penalty,
        }
    }
}

/// Service must happen inside a time window.
#[derive(Debug, Clone)]
pub struct TimeWindowConstraint {
    start: String,
    end: String,
    priority: ConstraintPriority,
    penalty: Option<f64>,
}

impl TimeWindowConstraint {
    pub fn new(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
            priority: ConstraintPriority::Must,
            penalty: None,
        }
    }

    pub fn priority(mut self, priority: ConstraintPriority) -> Self {
        self.priority = priority;
        self
    }

    pub fn penalty(mut self, penalty: f64) -> Self {
        self.penalty = Some(penalty);
        self
    }

    pub fn build(self) -> Constraint {
        Constraint {
            kind: "time_window".to_string(),
            description: format!(
                "Service must be performed between {} and {}",
                self.start, self.end
            ),
            operator: ConstraintOperator::Between,
            field: "service_time".to_string(),
            value: Some(serde_json::json!([self.start, self.end])),
            priority: Some(self.priority),
            penalty: self.penalty,
        }
    }
}

/// Upper bound on total route distance.
#[derive(Debug, Clone)]
pub struct DistanceConstraint {
    max_distance: f64,
    priority: ConstraintPriority,
}

impl DistanceConstraint {
    pub fn new(max_distance: f64) -> Self {
        Self {
            max_distance,
            priority: ConstraintPriority::Must,
        }
    }

    pub fn priority(mut self, priority: ConstraintPriority) -> Self {
        self.priority = priority;
        self
    }

    pub fn build(self) -> Constraint {
        Constraint {
            kind: "distance".to_string(),
            description: format!("Total distance must not exceed {} km", self.max_distance),
            operator: ConstraintOperator::Lte,
            field: "total_distance".to_string(),
            value: Some(serde_json::json!(self.max_distance)),
            priority: Some(self.priority),
            penalty: None,
        }
    }
}
