use crate::model::{Assignment, PlanEntry, Placement, Reason, RequirementSet, ScoredVehicle};
use crate::scorer::round_to;

/// Note appended to the reasons of every maintenance-forced entry.
pub const FORCED_IBL_NOTE: &str = "Forced IBL due to maintenance status";

// ---------------------------------------------------------------------------
// Public assignment function
// ---------------------------------------------------------------------------

/// Fill the Service and Standby quotas greedily by score.
///
/// Vehicles are processed in two groups:
/// 1. Eligible vehicles, ranked by score descending (stable on ties, so equal
///    scores keep their input order). The first `requirements.service` go to
///    Service, the next `requirements.standby` to Standby, the rest to IBL.
/// 2. Maintenance-forced vehicles, appended to IBL in input order with a note.
///
/// Quotas larger than the eligible pool are filled partially. Every input
/// vehicle appears in the output exactly once.
pub fn assign(scored: &[ScoredVehicle<'_>], requirements: &RequirementSet) -> Vec<PlanEntry> {
    place(scored, requirements)
        .into_iter()
        .map(|p| p.entry)
        .collect()
}

/// Same as [`assign`], but each entry keeps a reference to its own record so
/// later passes never have to look vehicles up by id.
pub fn place<'a>(
    scored: &[ScoredVehicle<'a>],
    requirements: &RequirementSet,
) -> Vec<Placement<'a>> {
    let (forced, mut eligible): (Vec<&ScoredVehicle<'a>>, Vec<&ScoredVehicle<'a>>) = scored
        .iter()
        .partition(|s| s.vehicle.is_maintenance_forced());

    // Vec::sort_by is stable.
    eligible.sort_by(|a, b| b.score.total_cmp(&a.score));

    let service_end = (requirements.service as usize).min(eligible.len());
    let standby_end = service_end
        .saturating_add(requirements.standby as usize)
        .min(eligible.len());

    tracing::debug!(
        eligible = eligible.len(),
        forced = forced.len(),
        service = service_end,
        standby = standby_end - service_end,
        "assigning fleet"
    );

    let mut plan: Vec<Placement<'a>> = Vec::with_capacity(scored.len());

    for (rank, s) in eligible.into_iter().enumerate() {
        let assignment = if rank < service_end {
            Assignment::Service
        } else if rank < standby_end {
            Assignment::Standby
        } else {
            Assignment::Ibl
        };
        plan.push(entry(s, assignment, false));
    }

    for s in forced {
        plan.push(entry(s, Assignment::Ibl, true));
    }

    plan
}

fn entry<'a>(s: &ScoredVehicle<'a>, assignment: Assignment, forced: bool) -> Placement<'a> {
    let mut reasons = s.reasons.clone();
    if forced {
        reasons.push(Reason::note(FORCED_IBL_NOTE));
    }
    Placement {
        vehicle: s.vehicle,
        entry: PlanEntry {
            vehicle_id: s.vehicle.id.clone(),
            assignment,
            score: round_to(s.score, 3),
            reasons,
            forced,
        },
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{JobCardStatus, VehicleRecord};

    fn scored<'a>(vehicles: &'a [VehicleRecord], scores: &[f64]) -> Vec<ScoredVehicle<'a>> {
        vehicles
            .iter()
            .zip(scores)
            .map(|(vehicle, &score)| ScoredVehicle {
                vehicle,
                score,
                reasons: vec![],
            })
            .collect()
    }

    fn ids(plan: &[PlanEntry], assignment: Assignment) -> Vec<&str> {
        plan.iter()
            .filter(|e| e.assignment == assignment)
            .map(|e| e.vehicle_id.as_str())
            .collect()
    }

    #[test]
    fn test_fills_service_then_standby_by_rank() {
        let fleet: Vec<VehicleRecord> =
            ["A", "B", "C", "D"].iter().map(|id| VehicleRecord::new(*id)).collect();
        let s = scored(&fleet, &[0.2, 0.9, 0.5, 0.7]);
        let plan = assign(&s, &RequirementSet::new(2, 1));

        let order: Vec<&str> = plan.iter().map(|e| e.vehicle_id.as_str()).collect();
        assert_eq!(order, vec!["B", "D", "C", "A"]);
        assert_eq!(ids(&plan, Assignment::Service), vec!["B", "D"]);
        assert_eq!(ids(&plan, Assignment::Standby), vec!["C"]);
        assert_eq!(ids(&plan, Assignment::Ibl), vec!["A"]);
        assert!(plan.iter().all(|e| !e.forced));
    }

    #[test]
    fn test_ties_keep_input_order() {
        let fleet: Vec<VehicleRecord> =
            ["A", "B", "C"].iter().map(|id| VehicleRecord::new(*id)).collect();
        let s = scored(&fleet, &[0.5, 0.5, 0.5]);
        let plan = assign(&s, &RequirementSet::new(1, 1));
        let order: Vec<&str> = plan.iter().map(|e| e.vehicle_id.as_str()).collect();
        assert_eq!(order, vec!["A", "B", "C"]);
        assert_eq!(plan[0].assignment, Assignment::Service);
        assert_eq!(plan[1].assignment, Assignment::Standby);
        assert_eq!(plan[2].assignment, Assignment::Ibl);
    }

    #[test]
    fn test_forced_vehicles_appended_in_input_order() {
        let mut fleet: Vec<VehicleRecord> =
            ["A", "B", "C", "D"].iter().map(|id| VehicleRecord::new(*id)).collect();
        fleet[0].maintenance_due = true;
        fleet[2].job_card_status = JobCardStatus::Open;
        let s = scored(&fleet, &[0.99, 0.1, 0.98, 0.2]);
        let plan = assign(&s, &RequirementSet::new(1, 0));

        let order: Vec<&str> = plan.iter().map(|e| e.vehicle_id.as_str()).collect();
        assert_eq!(order, vec!["D", "B", "A", "C"]);
        assert_eq!(plan[0].assignment, Assignment::Service);
        assert_eq!(plan[1].assignment, Assignment::Ibl);
        assert!(!plan[1].forced);
        assert!(plan[2].forced && plan[3].forced);
        assert_eq!(plan[2].reasons.last(), Some(&Reason::note(FORCED_IBL_NOTE)));
    }

    #[test]
    fn test_over_requested_quotas_fill_partially() {
        let fleet: Vec<VehicleRecord> =
            ["A", "B"].iter().map(|id| VehicleRecord::new(*id)).collect();
        let s = scored(&fleet, &[0.4, 0.6]);
        let plan = assign(&s, &RequirementSet::new(5, 5));
        assert_eq!(ids(&plan, Assignment::Service), vec!["B", "A"]);
        assert!(ids(&plan, Assignment::Standby).is_empty());
        assert!(ids(&plan, Assignment::Ibl).is_empty());
    }

    #[test]
    fn test_huge_quotas_do_not_overflow() {
        let fleet = vec![VehicleRecord::new("A")];
        let s = scored(&fleet, &[0.4]);
        let plan = assign(&s, &RequirementSet::new(u32::MAX, u32::MAX));
        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].assignment, Assignment::Service);
    }

    #[test]
    fn test_empty_fleet() {
        let plan = assign(&[], &RequirementSet::new(3, 2));
        assert!(plan.is_empty());
    }

    #[test]
    fn test_placements_keep_their_own_record() {
        let mut fleet = vec![VehicleRecord::new("X"), VehicleRecord::new("X")];
        fleet[0].maintenance_due = true;
        fleet[1].fitness_score = 0.9;
        let s = scored(&fleet, &[0.1, 0.9]);
        let placed = place(&s, &RequirementSet::new(1, 0));

        assert_eq!(placed[0].entry.assignment, Assignment::Service);
        assert!(std::ptr::eq(placed[0].vehicle, &fleet[1]));
        assert!(placed[1].entry.forced);
        assert!(std::ptr::eq(placed[1].vehicle, &fleet[0]));
    }

    #[test]
    fn test_plan_scores_rounded() {
        let fleet = vec![VehicleRecord::new("A")];
        let s = scored(&fleet, &[0.123456]);
        let plan = assign(&s, &RequirementSet::new(1, 0));
        assert_eq!(plan[0].score, 0.123);
    }
}
