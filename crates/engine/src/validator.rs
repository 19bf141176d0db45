use std::collections::HashSet;

use serde::Serialize;

use crate::fleet::FleetData;
use crate::model::{Criterion, JobCardStatus, WeightConfig};
use crate::scorer::parse_date;

// ---------------------------------------------------------------------------
// Validation result types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct ValidationResult {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationResult {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Validate implementation
// ---------------------------------------------------------------------------

/// Validate fleet snapshots and a weight configuration, returning errors
/// (the data is structurally wrong) and warnings (advisory; the engine will
/// still plan around them). Errors are listed before warnings.
pub fn validate(fleet: &FleetData, weights: &WeightConfig) -> ValidationResult {
    let mut errors: Vec<String> = Vec::new();
    let mut warnings: Vec<String> = Vec::new();

    if fleet.is_empty() {
        warnings.push("No fleet snapshots supplied -- every optimization will fail".to_string());
    }

    for (date, vehicles) in fleet.iter() {
        // Error: snapshot key is not a date
        if parse_date(date).is_none() {
            errors.push(format!(
                "Snapshot key '{}' is not a date -- expected YYYY-MM-DD",
                date
            ));
        }

        if vehicles.is_empty() {
            warnings.push(format!("Snapshot {} has no vehicles", date));
        }

        let mut seen: HashSet<&str> = HashSet::new();
        for v in vehicles {
            // Error: empty or duplicate IDs
            if v.id.trim().is_empty() {
                errors.push(format!("Snapshot {} has a vehicle with no ID", date));
                continue;
            }
            if !seen.insert(v.id.as_str()) {
                errors.push(format!(
                    "Duplicate vehicle ID '{}' in snapshot {} -- each vehicle must appear once per date",
                    v.id, date
                ));
            }

            // Warnings: values outside their documented ranges
            if !(0.0..=1.0).contains(&v.fitness_score) {
                warnings.push(format!(
                    "Vehicle '{}' on {} has fitness score {} outside 0-1 -- it will be clamped",
                    v.id, date, v.fitness_score
                ));
            }
            if !(0.0..=1.0).contains(&v.branding_priority) {
                warnings.push(format!(
                    "Vehicle '{}' on {} has branding priority {} outside 0-1 -- it will be clamped",
                    v.id, date, v.branding_priority
                ));
            }
            if let Some(d) = v.last_maintenance_date.as_deref() {
                if parse_date(d).is_none() {
                    warnings.push(format!(
                        "Vehicle '{}' on {} has unreadable last maintenance date '{}' -- it will score as never maintained",
                        v.id, date, d
                    ));
                }
            }
            if v.job_card_status == JobCardStatus::Open && v.maintenance_type.is_none() {
                warnings.push(format!(
                    "Vehicle '{}' on {} has an open job card with no maintenance type",
                    v.id, date
                ));
            }
            if v.branding_active && v.branding_company.is_none() {
                warnings.push(format!(
                    "Vehicle '{}' on {} is branded but has no branding company",
                    v.id, date
                ));
            }
        }
    }

    // -----------------------------------------------------------------------
    // Weight warnings
    // -----------------------------------------------------------------------
    for (key, w) in weights.iter() {
        match Criterion::from_key(key) {
            None => warnings.push(format!(
                "Weight '{}' is not a recognized criterion -- it will be ignored",
                key
            )),
            Some(c) if c.key() != key && weights.raw(c.key()).is_some() => {
                warnings.push(format!(
                    "Weight '{}' is shadowed by '{}' -- only '{}' will be used",
                    key,
                    c.key(),
                    c.key()
                ))
            }
            Some(_) => {}
        }
        if !w.is_finite() || w < 0.0 {
            warnings.push(format!("Weight '{}' is negative -- it will count as 0", key));
        }
    }
    if weights.total() == 0.0 {
        warnings.push(
            "All criterion weights are zero -- every vehicle will score 0 and ties keep input order"
                .to_string(),
        );
    }

    ValidationResult { errors, warnings }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::VehicleRecord;

    fn weights() -> WeightConfig {
        WeightConfig::new().with("readiness", 80.0).with("mileage", 50.0)
    }

    #[test]
    fn test_clean_fleet_has_no_errors_or_warnings() {
        let v = VehicleRecord {
            fitness_score: 0.9,
            last_maintenance_date: Some("2025-09-01".to_string()),
            ..VehicleRecord::new("T01")
        };
        let fleet = FleetData::new().with("2025-09-18", vec![v]);
        let result = validate(&fleet, &weights());
        assert!(result.is_ok());
        assert!(result.warnings.is_empty(), "{:?}", result.warnings);
    }

    #[test]
    fn test_duplicate_and_empty_ids_are_errors() {
        let fleet = FleetData::new().with(
            "2025-09-18",
            vec![
                VehicleRecord::new("T01"),
                VehicleRecord::new("T01"),
                VehicleRecord::new(""),
            ],
        );
        let result = validate(&fleet, &weights());
        assert!(!result.is_ok());
        assert_eq!(result.errors.len(), 2);
        assert!(result.errors[0].contains("Duplicate vehicle ID 'T01'"));
        assert!(result.errors[1].contains("no ID"));
    }

    #[test]
    fn test_bad_snapshot_key_is_an_error() {
        let fleet = FleetData::new().with("yesterday", vec![VehicleRecord::new("T01")]);
        let result = validate(&fleet, &weights());
        assert!(result.errors.iter().any(|e| e.contains("'yesterday'")));
    }

    #[test]
    fn test_record_warnings() {
        let v = VehicleRecord {
            fitness_score: 1.4,
            branding_active: true,
            job_card_status: JobCardStatus::Open,
            last_maintenance_date: Some("sometime".to_string()),
            ..VehicleRecord::new("T02")
        };
        let fleet = FleetData::new().with("2025-09-18", vec![v]);
        let result = validate(&fleet, &weights());
        assert!(result.is_ok());
        let all = result.warnings.join("\n");
        assert!(all.contains("fitness score 1.4"));
        assert!(all.contains("unreadable last maintenance date"));
        assert!(all.contains("open job card"));
        assert!(all.contains("no branding company"));
    }

    #[test]
    fn test_weight_warnings() {
        let w = WeightConfig::new()
            .with("punctuality", 80.0)
            .with("readiness", 10.0)
            .with("comfort", 5.0)
            .with("branding", -3.0);
        let fleet = FleetData::new().with("2025-09-18", vec![VehicleRecord::new("A")]);
        let result = validate(&fleet, &w);
        let all = result.warnings.join("\n");
        assert!(all.contains("'comfort' is not a recognized criterion"));
        assert!(all.contains("'punctuality' is shadowed by 'readiness'"));
        assert!(all.contains("'branding' is negative"));
        assert!(!all.contains("All criterion weights are zero"));
    }

    #[test]
    fn test_zero_weights_and_empty_fleet_warn() {
        let result = validate(&FleetData::new(), &WeightConfig::new());
        assert!(result.is_ok());
        assert!(result.warnings.iter().any(|w| w.contains("No fleet snapshots")));
        assert!(result.warnings.iter().any(|w| w.contains("All criterion weights are zero")));
    }
}
