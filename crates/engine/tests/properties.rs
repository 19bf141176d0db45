//! Property tests for the planning pipeline: completeness, quota respect,
//! forced-IBL placement, rank monotonicity, determinism and zero-weight
//! safety over randomly generated fleets.

use std::collections::HashSet;

use chrono::NaiveDate;
use proptest::prelude::*;

use metropal_engine::model::{
    Assignment, JobCardStatus, PlanEntry, RequirementSet, VehicleRecord, WeightConfig,
};
use metropal_engine::optimizer::plan_snapshot;
use metropal_engine::PolicyConfig;

// ============================================================================
// Strategies
// ============================================================================

fn eval_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 9, 18).unwrap()
}

fn vehicle_strategy() -> impl Strategy<Value = VehicleRecord> {
    (
        (0.0f64..=1.0, 0u64..30_000, prop::option::of(0i64..400)),
        (any::<bool>(), any::<bool>(), any::<bool>(), any::<bool>()),
        (0.0f64..=1.0, prop::option::of(prop_oneof![
            Just("Maintenance (IBL)".to_string()),
            Just("Standby (Cleaning)".to_string()),
            Just("Revenue Service".to_string()),
        ])),
    )
        .prop_map(
            |(
                (fitness, km, age),
                (due, open, cleaning, branded),
                (priority, action),
            )| VehicleRecord {
                fitness_score: fitness,
                mileage_since_maintenance: km,
                last_maintenance_date: age.map(|d| {
                    (eval_date() - chrono::Duration::days(d))
                        .format("%Y-%m-%d")
                        .to_string()
                }),
                maintenance_due: due,
                job_card_status: if open {
                    JobCardStatus::Open
                } else {
                    JobCardStatus::Closed
                },
                maintenance_type: open.then(|| "Minor Defect".to_string()),
                needs_cleaning: cleaning,
                branding_active: branded,
                branding_priority: priority,
                recommended_action: action,
                ..VehicleRecord::default()
            },
        )
}

/// Fleets with unique ids T00, T01, ... in generation order.
fn fleet_strategy() -> impl Strategy<Value = Vec<VehicleRecord>> {
    prop::collection::vec(vehicle_strategy(), 0..30).prop_map(|mut vs| {
        for (i, v) in vs.iter_mut().enumerate() {
            v.id = format!("T{:02}", i);
        }
        vs
    })
}

fn weights_strategy() -> impl Strategy<Value = WeightConfig> {
    (0.0f64..100.0, 0.0f64..100.0, 0.0f64..100.0, 0.0f64..100.0, 0.0f64..100.0).prop_map(
        |(r, m, c, b, k)| {
            WeightConfig::new()
                .with("readiness", r)
                .with("maintenance", m)
                .with("cleaning", c)
                .with("branding", b)
                .with("mileage", k)
        },
    )
}

fn requirements_strategy() -> impl Strategy<Value = RequirementSet> {
    (0u32..25, 0u32..10).prop_map(|(s, b)| RequirementSet::new(s, b))
}

fn plan_of(
    fleet: &[VehicleRecord],
    weights: &WeightConfig,
    req: &RequirementSet,
) -> Vec<PlanEntry> {
    plan_snapshot(fleet, weights, req, eval_date(), &PolicyConfig::default()).plan
}

fn scores(plan: &[PlanEntry], assignment: Assignment) -> Vec<f64> {
    plan.iter()
        .filter(|e| e.assignment == assignment && !e.forced)
        .map(|e| e.score)
        .collect()
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn plan_covers_every_vehicle_once(
        fleet in fleet_strategy(),
        weights in weights_strategy(),
        req in requirements_strategy(),
    ) {
        let plan = plan_of(&fleet, &weights, &req);
        prop_assert_eq!(plan.len(), fleet.len());

        let plan_ids: HashSet<&str> = plan.iter().map(|e| e.vehicle_id.as_str()).collect();
        let fleet_ids: HashSet<&str> = fleet.iter().map(|v| v.id.as_str()).collect();
        prop_assert_eq!(plan_ids.len(), plan.len());
        prop_assert_eq!(plan_ids, fleet_ids);
    }

    #[test]
    fn quotas_are_respected(
        fleet in fleet_strategy(),
        weights in weights_strategy(),
        req in requirements_strategy(),
    ) {
        let plan = plan_of(&fleet, &weights, &req);
        let eligible = fleet.iter().filter(|v| !v.is_maintenance_forced()).count();
        let service = plan.iter().filter(|e| e.assignment == Assignment::Service).count();
        let standby = plan.iter().filter(|e| e.assignment == Assignment::Standby).count();

        prop_assert_eq!(service, (req.service as usize).min(eligible));
        prop_assert_eq!(standby, (req.standby as usize).min(eligible - service));
    }

    #[test]
    fn forced_vehicles_land_in_ibl(
        fleet in fleet_strategy(),
        weights in weights_strategy(),
        req in requirements_strategy(),
    ) {
        let plan = plan_of(&fleet, &weights, &req);
        for v in &fleet {
            let entry = plan.iter().find(|e| e.vehicle_id == v.id).unwrap();
            if v.job_card_status == JobCardStatus::Open || v.maintenance_due {
                prop_assert_eq!(entry.assignment, Assignment::Ibl);
                prop_assert!(entry.forced);
            }
            prop_assert_eq!(entry.forced, v.is_maintenance_forced());
        }
    }

    #[test]
    fn ranks_are_monotone(
        fleet in fleet_strategy(),
        weights in weights_strategy(),
        req in requirements_strategy(),
    ) {
        let plan = plan_of(&fleet, &weights, &req);
        let service = scores(&plan, Assignment::Service);
        let standby = scores(&plan, Assignment::Standby);
        let ibl = scores(&plan, Assignment::Ibl);

        let min_service = service.iter().copied().fold(f64::INFINITY, f64::min);
        let max_standby = standby.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let min_standby = standby.iter().copied().fold(f64::INFINITY, f64::min);
        let max_ibl = ibl.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        prop_assert!(max_standby <= min_service);
        prop_assert!(max_ibl <= min_standby);
        if standby.is_empty() {
            prop_assert!(max_ibl <= min_service);
        }
    }

    #[test]
    fn identical_input_gives_identical_output(
        fleet in fleet_strategy(),
        weights in weights_strategy(),
        req in requirements_strategy(),
    ) {
        let first = plan_snapshot(&fleet, &weights, &req, eval_date(), &PolicyConfig::default());
        let second = plan_snapshot(&fleet, &weights, &req, eval_date(), &PolicyConfig::default());
        prop_assert_eq!(
            serde_json::to_string(&first.plan).unwrap(),
            serde_json::to_string(&second.plan).unwrap()
        );
        prop_assert_eq!(first.conflicts, second.conflicts);
    }

    #[test]
    fn zero_weights_score_zero_and_plan_completely(
        fleet in fleet_strategy(),
        req in requirements_strategy(),
    ) {
        let weights = WeightConfig::new()
            .with("readiness", 0.0)
            .with("maintenance", 0.0)
            .with("cleaning", 0.0)
            .with("branding", 0.0)
            .with("mileage", 0.0);
        let plan = plan_of(&fleet, &weights, &req);
        prop_assert_eq!(plan.len(), fleet.len());
        prop_assert!(plan.iter().all(|e| e.score == 0.0));

        let eligible = fleet.iter().filter(|v| !v.is_maintenance_forced()).count();
        let service = plan.iter().filter(|e| e.assignment == Assignment::Service).count();
        prop_assert_eq!(service, (req.service as usize).min(eligible));
    }

    #[test]
    fn scores_stay_in_unit_range(
        fleet in fleet_strategy(),
        weights in weights_strategy(),
    ) {
        let plan = plan_of(&fleet, &weights, &RequirementSet::new(5, 2));
        for e in &plan {
            prop_assert!((0.0..=1.0).contains(&e.score), "{} scored {}", e.vehicle_id, e.score);
        }
    }
}
