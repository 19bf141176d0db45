use serde::{Deserialize, Serialize};

use crate::model::{RequirementSet, WeightConfig};

/// Operating policy: conflict thresholds, fallback quotas and weights.
///
/// Every field has a default, so a request may carry a partial `policy`
/// object and only override what it names.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct PolicyConfig {
    /// Raw branding weight above which branded vehicles in IBL are flagged.
    pub branding_weight_threshold: f64,
    /// Raw cleaning weight above which unclean vehicles in service are flagged.
    pub cleaning_weight_threshold: f64,
    /// Fitness above which an IBL placement counts as wasted readiness.
    pub idle_fitness_threshold: f64,
    /// Kilometres since maintenance above which running a vehicle is flagged.
    pub mileage_threshold: u64,
    /// Maintenance types that escalate an open job card to high severity.
    pub critical_maintenance_types: Vec<String>,
    /// Quotas used when neither the request nor the requirement table has any.
    pub default_requirements: RequirementSet,
    /// Weights used when the request carries none.
    pub default_weights: WeightConfig,
    /// Maintenance age assigned to vehicles with no usable maintenance date.
    pub unknown_maintenance_age_days: i64,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        PolicyConfig {
            branding_weight_threshold: 60.0,
            cleaning_weight_threshold: 50.0,
            idle_fitness_threshold: 0.8,
            mileage_threshold: 18_000,
            critical_maintenance_types: vec![
                "Major Repair".to_string(),
                "Critical Failure".to_string(),
            ],
            default_requirements: RequirementSet::new(15, 5),
            default_weights: WeightConfig::new()
                .with("readiness", 80.0)
                .with("maintenance", 60.0)
                .with("cleaning", 50.0)
                .with("branding", 80.0)
                .with("mileage", 50.0),
            unknown_maintenance_age_days: 9999,
        }
    }
}

impl PolicyConfig {
    pub fn is_critical_maintenance(&self, maintenance_type: &str) -> bool {
        self.critical_maintenance_types
            .iter()
            .any(|t| t == maintenance_type)
    }
}
