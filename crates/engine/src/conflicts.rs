use crate::config::PolicyConfig;
use crate::model::{
    Assignment, ConflictFinding, ConflictKind, Criterion, JobCardStatus, PlanEntry, Placement,
    Severity, VehicleRecord, WeightConfig,
};

// ---------------------------------------------------------------------------
// Rule context
// ---------------------------------------------------------------------------

/// Everything a rule may consult besides the entry and its vehicle.
#[derive(Debug, Clone, Copy)]
pub struct RuleContext<'a> {
    pub weights: &'a WeightConfig,
    pub policy: &'a PolicyConfig,
}

/// A single policy check over one plan entry. Rules are independent: each sees
/// the unaltered plan and may fire for any vehicle another rule fired for.
pub type Rule = fn(&RuleContext<'_>, &PlanEntry, &VehicleRecord) -> Option<ConflictFinding>;

/// Rules in reporting order.
pub const RULES: [Rule; 6] = [
    branded_in_ibl,
    fit_vehicle_in_ibl,
    maintenance_due_in_service,
    high_mileage_in_service,
    open_job_card_in_service,
    unclean_in_service,
];

// ---------------------------------------------------------------------------
// Detection
// ---------------------------------------------------------------------------

/// Scan the placed plan against the vehicle records and weights.
///
/// Every entry is checked against the record it was built from, so duplicate
/// ids never borrow each other's state. Findings are grouped by rule (in
/// `RULES` order) and, within a rule, follow plan order.
pub fn detect_conflicts(
    plan: &[Placement<'_>],
    weights: &WeightConfig,
    policy: &PolicyConfig,
) -> Vec<ConflictFinding> {
    let ctx = RuleContext { weights, policy };

    let mut findings: Vec<ConflictFinding> = Vec::new();
    for rule in RULES {
        for placed in plan {
            findings.extend(rule(&ctx, &placed.entry, placed.vehicle));
        }
    }

    tracing::debug!(findings = findings.len(), "conflict scan complete");
    findings
}

// ---------------------------------------------------------------------------
// Rules
// ---------------------------------------------------------------------------

/// Branding is weighted heavily but a branded vehicle is parked in IBL.
pub fn branded_in_ibl(
    ctx: &RuleContext<'_>,
    entry: &PlanEntry,
    vehicle: &VehicleRecord,
) -> Option<ConflictFinding> {
    let branding_weight = ctx.weights.weight(Criterion::Branding);
    if branding_weight <= ctx.policy.branding_weight_threshold
        || entry.assignment != Assignment::Ibl
        || !vehicle.branding_active
    {
        return None;
    }
    let mut f = ConflictFinding::new(
        &entry.vehicle_id,
        ConflictKind::BrandedInIbl,
        "Branded vehicle assigned to IBL while branding priority is high",
        Severity::Medium,
    );
    f.assignment = Some(entry.assignment);
    f.branding_company = vehicle.branding_company.clone();
    f.branding_priority = Some(vehicle.branding_priority);
    Some(f)
}

/// A healthy vehicle held in IBL, whatever the cause.
pub fn fit_vehicle_in_ibl(
    ctx: &RuleContext<'_>,
    entry: &PlanEntry,
    vehicle: &VehicleRecord,
) -> Option<ConflictFinding> {
    if entry.assignment != Assignment::Ibl
        || vehicle.fitness_score <= ctx.policy.idle_fitness_threshold
    {
        return None;
    }
    let mut f = ConflictFinding::new(
        &entry.vehicle_id,
        ConflictKind::FitVehicleInIbl,
        "High-fitness vehicle held in IBL",
        Severity::Low,
    );
    f.assignment = Some(entry.assignment);
    f.fitness_score = Some(vehicle.fitness_score);
    Some(f)
}

pub fn maintenance_due_in_service(
    _ctx: &RuleContext<'_>,
    entry: &PlanEntry,
    vehicle: &VehicleRecord,
) -> Option<ConflictFinding> {
    if !entry.assignment.is_operational() || !vehicle.maintenance_due {
        return None;
    }
    let mut f = ConflictFinding::new(
        &entry.vehicle_id,
        ConflictKind::MaintenanceDueInService,
        format!("Maintenance-due vehicle assigned to {}", entry.assignment),
        Severity::High,
    );
    f.assignment = Some(entry.assignment);
    f.mileage_since_maintenance = Some(vehicle.mileage_since_maintenance);
    Some(f)
}

pub fn high_mileage_in_service(
    ctx: &RuleContext<'_>,
    entry: &PlanEntry,
    vehicle: &VehicleRecord,
) -> Option<ConflictFinding> {
    if !entry.assignment.is_operational()
        || vehicle.mileage_since_maintenance <= ctx.policy.mileage_threshold
    {
        return None;
    }
    let mut f = ConflictFinding::new(
        &entry.vehicle_id,
        ConflictKind::HighMileageInService,
        format!("High-mileage vehicle assigned to {}", entry.assignment),
        Severity::Medium,
    );
    f.assignment = Some(entry.assignment);
    f.mileage_since_maintenance = Some(vehicle.mileage_since_maintenance);
    Some(f)
}

/// High severity when the open work is in the policy's critical set.
pub fn open_job_card_in_service(
    ctx: &RuleContext<'_>,
    entry: &PlanEntry,
    vehicle: &VehicleRecord,
) -> Option<ConflictFinding> {
    if !entry.assignment.is_operational() || vehicle.job_card_status != JobCardStatus::Open {
        return None;
    }
    let critical = vehicle
        .maintenance_type
        .as_deref()
        .is_some_and(|t| ctx.policy.is_critical_maintenance(t));
    let severity = if critical {
        Severity::High
    } else {
        Severity::Medium
    };
    let mut f = ConflictFinding::new(
        &entry.vehicle_id,
        ConflictKind::OpenJobCardInService,
        format!("Vehicle with open job card assigned to {}", entry.assignment),
        severity,
    );
    f.assignment = Some(entry.assignment);
    f.maintenance_type = vehicle.maintenance_type.clone();
    Some(f)
}

/// Cleaning is weighted heavily but an unclean vehicle runs in service.
pub fn unclean_in_service(
    ctx: &RuleContext<'_>,
    entry: &PlanEntry,
    vehicle: &VehicleRecord,
) -> Option<ConflictFinding> {
    let cleaning_weight = ctx.weights.weight(Criterion::Cleaning);
    if cleaning_weight <= ctx.policy.cleaning_weight_threshold
        || entry.assignment != Assignment::Service
        || !vehicle.needs_cleaning
    {
        return None;
    }
    let mut f = ConflictFinding::new(
        &entry.vehicle_id,
        ConflictKind::UncleanInService,
        "Vehicle needing cleaning assigned to Service while cleaning priority is high",
        Severity::Low,
    );
    f.assignment = Some(entry.assignment);
    Some(f)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
