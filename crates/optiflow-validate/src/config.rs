//! Validator configuration.

use serde::{Deserialize, Serialize};

/// Configuration for the validator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidatorConfig {
    /// Run the domain validator selected by `context.problemType`.
    pub domain_rules: bool,

    /// Constraint type prefixes that satisfy the fleet requirement for a
    /// routing-relevant constraint.
    pub fleet_constraint_kinds: Vec<String>,

    /// Earth radius used for great-circle distances, in kilometres.
    pub earth_radius_km: f64,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            domain_rules: true,
            fleet_constraint_kinds: vec!["capacity".to_string(), "time_window".to_string()],
            earth_radius_km: 6371.0,
        }
    }
}

impl ValidatorConfig {
    /// Parse from JSON; missing fields take their defaults.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = ValidatorConfig::from_json(r#"{ "domain_rules": false }"#).unwrap();
        assert!(!config.domain_rules);
        assert_eq!(config.fleet_constraint_kinds.len(), 2);
        assert_eq!(config.earth_radius_km, 6371.0);
    }
}
