#![deny(clippy::all)]

use std::collections::HashMap;

use metropal_engine::model as engine;
use metropal_engine::{optimizer, validator, FleetData, OptimizeInput, PolicyConfig};
use napi_derive::napi;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

#[napi(string_enum)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobCardStatus {
    Open,
    Closed,
}

#[napi(string_enum)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assignment {
    Service,
    Standby,
    #[napi(value = "IBL")]
    Ibl,
}

#[napi(string_enum)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    #[napi(value = "low")]
    Low,
    #[napi(value = "medium")]
    Medium,
    #[napi(value = "high")]
    High,
}

#[napi(string_enum = "camelCase")]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictKind {
    BrandedInIbl,
    FitVehicleInIbl,
    MaintenanceDueInService,
    HighMileageInService,
    OpenJobCardInService,
    UncleanInService,
}

// ---------------------------------------------------------------------------
// Enum conversions
// ---------------------------------------------------------------------------

impl From<JobCardStatus> for engine::JobCardStatus {
    fn from(v: JobCardStatus) -> Self {
        match v {
            JobCardStatus::Open => engine::JobCardStatus::Open,
            JobCardStatus::Closed => engine::JobCardStatus::Closed,
        }
    }
}

impl From<engine::Assignment> for Assignment {
    fn from(v: engine::Assignment) -> Self {
        match v {
            engine::Assignment::Service => Assignment::Service,
            engine::Assignment::Standby => Assignment::Standby,
            engine::Assignment::Ibl => Assignment::Ibl,
        }
    }
}

impl From<engine::Severity> for Severity {
    fn from(v: engine::Severity) -> Self {
        match v {
            engine::Severity::Low => Severity::Low,
            engine::Severity::Medium => Severity::Medium,
            engine::Severity::High => Severity::High,
        }
    }
}

impl From<engine::ConflictKind> for ConflictKind {
    fn from(v: engine::ConflictKind) -> Self {
        match v {
            engine::ConflictKind::BrandedInIbl => ConflictKind::BrandedInIbl,
            engine::ConflictKind::FitVehicleInIbl => ConflictKind::FitVehicleInIbl,
            engine::ConflictKind::MaintenanceDueInService => ConflictKind::MaintenanceDueInService,
            engine::ConflictKind::HighMileageInService => ConflictKind::HighMileageInService,
            engine::ConflictKind::OpenJobCardInService => ConflictKind::OpenJobCardInService,
            engine::ConflictKind::UncleanInService => ConflictKind::UncleanInService,
        }
    }
}

fn clamp_u32(v: u64) -> u32 {
    u32::try_from(v).unwrap_or(u32::MAX)
}

fn clamp_usize(v: usize) -> u32 {
    u32::try_from(v).unwrap_or(u32::MAX)
}

// ---------------------------------------------------------------------------
// Mirror types: input side
// ---------------------------------------------------------------------------

/// Vehicle snapshot. Every field except `id` may be omitted.
#[napi(object)]
#[derive(Debug, Clone)]
pub struct VehicleRecord {
    pub id: String,
    pub fitness_score: Option<f64>,
    pub mileage_since_maintenance: Option<u32>,
    pub last_maintenance_date: Option<String>,
    pub maintenance_due: Option<bool>,
    pub job_card_status: Option<JobCardStatus>,
    pub maintenance_type: Option<String>,
    pub needs_cleaning: Option<bool>,
    pub branding_active: Option<bool>,
    pub branding_priority: Option<f64>,
    pub branding_company: Option<String>,
    pub recommended_action: Option<String>,
}

impl From<VehicleRecord> for engine::VehicleRecord {
    fn from(v: VehicleRecord) -> Self {
        engine::VehicleRecord {
            id: v.id,
            fitness_score: v.fitness_score.unwrap_or(0.0),
            mileage_since_maintenance: u64::from(v.mileage_since_maintenance.unwrap_or(0)),
            last_maintenance_date: v.last_maintenance_date,
            maintenance_due: v.maintenance_due.unwrap_or(false),
            job_card_status: v.job_card_status.map(Into::into).unwrap_or_default(),
            maintenance_type: v.maintenance_type,
            needs_cleaning: v.needs_cleaning.unwrap_or(false),
            branding_active: v.branding_active.unwrap_or(false),
            branding_priority: v.branding_priority.unwrap_or(0.0),
            branding_company: v.branding_company,
            recommended_action: v.recommended_action,
            ..Default::default()
        }
    }
}

#[napi(object)]
#[derive(Debug, Clone, Copy)]
pub struct RequirementSet {
    pub service: u32,
    pub standby: u32,
}

impl From<RequirementSet> for engine::RequirementSet {
    fn from(v: RequirementSet) -> Self {
        engine::RequirementSet::new(v.service, v.standby)
    }
}

#[napi(object)]
#[derive(Debug, Clone)]
pub struct DailyRequirement {
    pub date: String,
    pub service: u32,
    pub standby: u32,
}

impl From<DailyRequirement> for engine::DailyRequirement {
    fn from(v: DailyRequirement) -> Self {
        engine::DailyRequirement {
            date: v.date,
            requirements: engine::RequirementSet::new(v.service, v.standby),
        }
    }
}

/// Overrides applied on top of the default policy.
#[napi(object)]
#[derive(Debug, Clone)]
pub struct PolicyOverrides {
    pub branding_weight_threshold: Option<f64>,
    pub cleaning_weight_threshold: Option<f64>,
    pub idle_fitness_threshold: Option<f64>,
    pub mileage_threshold: Option<u32>,
    pub critical_maintenance_types: Option<Vec<String>>,
    pub default_requirements: Option<RequirementSet>,
}

impl From<PolicyOverrides> for PolicyConfig {
    fn from(v: PolicyOverrides) -> Self {
        let mut policy = PolicyConfig::default();
        if let Some(t) = v.branding_weight_threshold {
            policy.branding_weight_threshold = t;
        }
        if let Some(t) = v.cleaning_weight_threshold {
            policy.cleaning_weight_threshold = t;
        }
        if let Some(t) = v.idle_fitness_threshold {
            policy.idle_fitness_threshold = t;
        }
        if let Some(t) = v.mileage_threshold {
            policy.mileage_threshold = u64::from(t);
        }
        if let Some(types) = v.critical_maintenance_types {
            policy.critical_maintenance_types = types;
        }
        if let Some(r) = v.default_requirements {
            policy.default_requirements = r.into();
        }
        policy
    }
}

/// Arguments of `optimize`.
#[napi(object)]
#[derive(Debug, Clone)]
pub struct OptimizeOptions {
    /// Snapshot date -> vehicles.
    pub fleet: HashMap<String, Vec<VehicleRecord>>,
    /// Criterion key -> weight. Policy defaults when omitted.
    pub weights: Option<HashMap<String, f64>>,
    /// ISO date; today's local date when omitted.
    pub date: Option<String>,
    pub requirements: Option<RequirementSet>,
    pub daily_requirements: Option<Vec<DailyRequirement>>,
    pub policy: Option<PolicyOverrides>,
}

/// Arguments of `optimizeBatch`.
#[napi(object)]
#[derive(Debug, Clone)]
pub struct BatchOptions {
    pub fleet: HashMap<String, Vec<VehicleRecord>>,
    pub weights: Option<HashMap<String, f64>>,
    pub dates: Vec<String>,
    pub requirements: Option<RequirementSet>,
    pub daily_requirements: Option<Vec<DailyRequirement>>,
    pub policy: Option<PolicyOverrides>,
}

fn to_fleet(fleet: HashMap<String, Vec<VehicleRecord>>) -> FleetData {
    let mut data = FleetData::new();
    for (date, vehicles) in fleet {
        data.insert(date, vehicles.into_iter().map(Into::into).collect());
    }
    data
}

fn to_weights(weights: HashMap<String, f64>) -> engine::WeightConfig {
    weights.into_iter().collect()
}

/// Engine-side owned inputs shared by `optimize` and `optimizeBatch`.
struct Inputs {
    fleet: FleetData,
    weights: engine::WeightConfig,
    requirements: Option<engine::RequirementSet>,
    daily_requirements: Vec<engine::DailyRequirement>,
    policy: PolicyConfig,
}

impl Inputs {
    fn new(
        fleet: HashMap<String, Vec<VehicleRecord>>,
        weights: Option<HashMap<String, f64>>,
        requirements: Option<RequirementSet>,
        daily_requirements: Option<Vec<DailyRequirement>>,
        policy: Option<PolicyOverrides>,
    ) -> Self {
        let policy: PolicyConfig = policy.map(Into::into).unwrap_or_default();
        let weights = weights
            .map(to_weights)
            .unwrap_or_else(|| policy.default_weights.clone());
        Inputs {
            fleet: to_fleet(fleet),
            weights,
            requirements: requirements.map(Into::into),
            daily_requirements: daily_requirements
                .unwrap_or_default()
                .into_iter()
                .map(Into::into)
                .collect(),
            policy,
        }
    }

    fn input(&self) -> OptimizeInput<'_> {
        OptimizeInput {
            fleet: &self.fleet,
            weights: &self.weights,
            requirements: self.requirements,
            daily_requirements: &self.daily_requirements,
            policy: &self.policy,
        }
    }
}

// ---------------------------------------------------------------------------
// Mirror types: output side
// ---------------------------------------------------------------------------

/// One diagnostic line. Metric lines set `metric` and exactly one of
/// `number`/`flag`; note lines set only `note`.
#[napi(object)]
#[derive(Debug, Clone)]
pub struct Reason {
    pub metric: Option<String>,
    pub number: Option<f64>,
    pub flag: Option<bool>,
    pub note: Option<String>,
}

impl From<engine::Reason> for Reason {
    fn from(v: engine::Reason) -> Self {
        match v {
            engine::Reason::Metric { metric, value } => {
                let (number, flag) = match value {
                    engine::ReasonValue::Flag(b) => (None, Some(b)),
                    engine::ReasonValue::Count(n) => (Some(n as f64), None),
                    engine::ReasonValue::Number(x) => (Some(x), None),
                };
                Reason {
                    metric: Some(metric),
                    number,
                    flag,
                    note: None,
                }
            }
            engine::Reason::Note { note } => Reason {
                metric: None,
                number: None,
                flag: None,
                note: Some(note),
            },
        }
    }
}

#[napi(object)]
#[derive(Debug, Clone)]
pub struct PlanEntry {
    pub vehicle_id: String,
    pub assignment: Assignment,
    pub score: f64,
    pub reasons: Vec<Reason>,
    pub forced: bool,
}

impl From<engine::PlanEntry> for PlanEntry {
    fn from(v: engine::PlanEntry) -> Self {
        PlanEntry {
            vehicle_id: v.vehicle_id,
            assignment: v.assignment.into(),
            score: v.score,
            reasons: v.reasons.into_iter().map(Into::into).collect(),
            forced: v.forced,
        }
    }
}

#[napi(object)]
#[derive(Debug, Clone)]
pub struct ConflictFinding {
    pub vehicle_id: String,
    pub kind: ConflictKind,
    pub issue: String,
    pub severity: Severity,
    pub assignment: Option<Assignment>,
    pub fitness_score: Option<f64>,
    pub mileage_since_maintenance: Option<u32>,
    pub maintenance_type: Option<String>,
    pub branding_company: Option<String>,
    pub branding_priority: Option<f64>,
}

impl From<engine::ConflictFinding> for ConflictFinding {
    fn from(v: engine::ConflictFinding) -> Self {
        ConflictFinding {
            vehicle_id: v.vehicle_id,
            kind: v.kind.into(),
            issue: v.issue,
            severity: v.severity.into(),
            assignment: v.assignment.map(Into::into),
            fitness_score: v.fitness_score,
            mileage_since_maintenance: v.mileage_since_maintenance.map(clamp_u32),
            maintenance_type: v.maintenance_type,
            branding_company: v.branding_company,
            branding_priority: v.branding_priority,
        }
    }
}

#[napi(object)]
#[derive(Debug, Clone)]
pub struct PlanSummary {
    pub total_vehicles: u32,
    pub service_count: u32,
    pub standby_count: u32,
    pub ibl_count: u32,
    pub forced_maintenance_count: u32,
    pub conflicts_found: u32,
    pub high_severity_conflicts: u32,
    pub medium_severity_conflicts: u32,
    pub low_severity_conflicts: u32,
    pub average_service_score: f64,
}

impl From<engine::PlanSummary> for PlanSummary {
    fn from(v: engine::PlanSummary) -> Self {
        PlanSummary {
            total_vehicles: clamp_usize(v.total_vehicles),
            service_count: clamp_usize(v.service_count),
            standby_count: clamp_usize(v.standby_count),
            ibl_count: clamp_usize(v.ibl_count),
            forced_maintenance_count: clamp_usize(v.forced_maintenance_count),
            conflicts_found: clamp_usize(v.conflicts_found),
            high_severity_conflicts: clamp_usize(v.high_severity_conflicts),
            medium_severity_conflicts: clamp_usize(v.medium_severity_conflicts),
            low_severity_conflicts: clamp_usize(v.low_severity_conflicts),
            average_service_score: v.average_service_score,
        }
    }
}

#[napi(object)]
#[derive(Debug, Clone)]
pub struct OptimizationResult {
    pub date: String,
    pub data_date: String,
    pub service_needed: u32,
    pub standby_needed: u32,
    pub plan: Vec<PlanEntry>,
    pub conflicts: Vec<ConflictFinding>,
    pub summary: PlanSummary,
}

impl From<engine::OptimizationResult> for OptimizationResult {
    fn from(v: engine::OptimizationResult) -> Self {
        OptimizationResult {
            date: v.date,
            data_date: v.data_date,
            service_needed: v.service_needed,
            standby_needed: v.standby_needed,
            plan: v.plan.into_iter().map(Into::into).collect(),
            conflicts: v.conflicts.into_iter().map(Into::into).collect(),
            summary: v.summary.into(),
        }
    }
}

/// Outcome for one batch date: `result` on success, `error` otherwise.
#[napi(object)]
#[derive(Debug, Clone)]
pub struct DateOutcome {
    pub date: String,
    pub result: Option<OptimizationResult>,
    pub error: Option<String>,
}

#[napi(object)]
#[derive(Debug, Clone)]
pub struct BatchResult {
    /// Ordered by date string.
    pub results: Vec<DateOutcome>,
    pub total_dates: u32,
    pub successful: u32,
    pub failed: u32,
}

impl From<optimizer::BatchResult> for BatchResult {
    fn from(v: optimizer::BatchResult) -> Self {
        let results = v
            .results
            .into_iter()
            .map(|(date, outcome)| match outcome {
                optimizer::DateOutcome::Planned(r) => DateOutcome {
                    date,
                    result: Some((*r).into()),
                    error: None,
                },
                optimizer::DateOutcome::Failed { error } => DateOutcome {
                    date,
                    result: None,
                    error: Some(error),
                },
            })
            .collect();
        BatchResult {
            results,
            total_dates: clamp_usize(v.total_dates),
            successful: clamp_usize(v.successful),
            failed: clamp_usize(v.failed),
        }
    }
}

// ---------------------------------------------------------------------------
// Validation result
// ---------------------------------------------------------------------------

#[napi(object)]
#[derive(Debug, Clone)]
pub struct ValidationResult {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl From<validator::ValidationResult> for ValidationResult {
    fn from(v: validator::ValidationResult) -> Self {
        ValidationResult {
            errors: v.errors,
            warnings: v.warnings,
        }
    }
}

// ---------------------------------------------------------------------------
// Exported functions
// ---------------------------------------------------------------------------

/// Plan one date. Fails only when there is no fleet data for the date or the
/// date is unreadable.
#[napi]
pub fn optimize(options: OptimizeOptions) -> napi::Result<OptimizationResult> {
    let date = options.date;
    let inputs = Inputs::new(
        options.fleet,
        options.weights,
        options.requirements,
        options.daily_requirements,
        options.policy,
    );
    optimizer::optimize(&inputs.input(), date.as_deref())
        .map(Into::into)
        .map_err(|e| napi::Error::from_reason(e.to_string()))
}

/// Plan several dates independently. Per-date failures are reported in the
/// result; only an empty date list is an error.
#[napi]
pub fn optimize_batch(options: BatchOptions) -> napi::Result<BatchResult> {
    let dates = options.dates;
    let inputs = Inputs::new(
        options.fleet,
        options.weights,
        options.requirements,
        options.daily_requirements,
        options.policy,
    );
    optimizer::optimize_batch(&inputs.input(), &dates)
        .map(Into::into)
        .map_err(|e| napi::Error::from_reason(e.to_string()))
}

/// Check fleet snapshots and weights without planning.
#[napi]
pub fn validate(
    fleet: HashMap<String, Vec<VehicleRecord>>,
    weights: Option<HashMap<String, f64>>,
) -> ValidationResult {
    let fleet = to_fleet(fleet);
    let weights = weights
        .map(to_weights)
        .unwrap_or_else(|| PolicyConfig::default().default_weights);
    validator::validate(&fleet, &weights).into()
}
