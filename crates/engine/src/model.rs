use std::collections::BTreeMap;
use std::fmt;

use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize};

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Work-order state attached to a vehicle by the maintenance depot.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum JobCardStatus {
    /// Outstanding work; the vehicle may not run until it is closed.
    #[serde(alias = "open", alias = "OPEN")]
    Open,
    #[default]
    #[serde(alias = "closed", alias = "CLOSED")]
    Closed,
}

/// Operational state a vehicle is placed in for the planned day.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Assignment {
    /// Revenue service.
    Service,
    /// Stabled and ready to replace a failed service vehicle.
    Standby,
    /// Inspection/maintenance bay line.
    #[serde(rename = "IBL")]
    Ibl,
}

impl Assignment {
    /// Service and Standby both put the vehicle on the running roster.
    pub fn is_operational(self) -> bool {
        matches!(self, Assignment::Service | Assignment::Standby)
    }
}

impl fmt::Display for Assignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Assignment::Service => "Service",
            Assignment::Standby => "Standby",
            Assignment::Ibl => "IBL",
        };
        f.write_str(s)
    }
}

/// Scoring criteria understood by the engine.
///
/// Each criterion has one canonical weight key plus an explicit list of
/// accepted aliases. No other spelling is recognized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Criterion {
    Readiness,
    Maintenance,
    Cleaning,
    Branding,
    Mileage,
}

impl Criterion {
    pub const ALL: [Criterion; 5] = [
        Criterion::Readiness,
        Criterion::Maintenance,
        Criterion::Cleaning,
        Criterion::Branding,
        Criterion::Mileage,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Criterion::Readiness => "readiness",
            Criterion::Maintenance => "maintenance",
            Criterion::Cleaning => "cleaning",
            Criterion::Branding => "branding",
            Criterion::Mileage => "mileage",
        }
    }

    /// Compatibility spellings, consulted only when the canonical key is absent.
    pub fn aliases(self) -> &'static [&'static str] {
        match self {
            Criterion::Readiness => &["punctuality"],
            _ => &[],
        }
    }

    /// Look up the criterion a weight key refers to, canonical or alias.
    pub fn from_key(key: &str) -> Option<Criterion> {
        Criterion::ALL
            .into_iter()
            .find(|c| c.key() == key || c.aliases().contains(&key))
    }
}

/// Advisory weight of a conflict finding.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

/// Which policy rule produced a finding.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ConflictKind {
    BrandedInIbl,
    FitVehicleInIbl,
    MaintenanceDueInService,
    HighMileageInService,
    OpenJobCardInService,
    UncleanInService,
}

// ---------------------------------------------------------------------------
// Lenient field decoding
// ---------------------------------------------------------------------------

// Fleet exports are inconsistent about flag encoding (true/false vs 1/0) and
// emit null for unknown numbers. These decoders map all of that onto neutral
// values instead of rejecting the whole snapshot.

fn lenient_bool<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Int(i64),
        Float(f64),
    }

    Ok(match Option::<Flag>::deserialize(d)? {
        Some(Flag::Bool(b)) => b,
        Some(Flag::Int(n)) => n != 0,
        Some(Flag::Float(f)) => f != 0.0,
        None => false,
    })
}

fn lenient_f64<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
    Ok(Option::<f64>::deserialize(d)?
        .filter(|v| v.is_finite())
        .unwrap_or(0.0))
}

fn lenient_km<'de, D: Deserializer<'de>>(d: D) -> Result<u64, D::Error> {
    Ok(lenient_opt_km(d)?.unwrap_or(0))
}

fn lenient_opt_km<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u64>, D::Error> {
    Ok(Option::<f64>::deserialize(d)?
        .filter(|v| v.is_finite() && *v >= 0.0)
        .map(|v| v.round() as u64))
}

/// Only a case-insensitive "open" opens the card; null, unknown labels and
/// non-string values read as Closed.
fn lenient_job_card<'de, D: Deserializer<'de>>(d: D) -> Result<JobCardStatus, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Label {
        Text(String),
        Other(IgnoredAny),
    }

    Ok(match Option::<Label>::deserialize(d)? {
        Some(Label::Text(s)) if s.trim().eq_ignore_ascii_case("open") => JobCardStatus::Open,
        _ => JobCardStatus::Closed,
    })
}

// ---------------------------------------------------------------------------
// Input types
// ---------------------------------------------------------------------------

/// State snapshot of one vehicle for one date, as produced by the data source.
///
/// Every field also accepts the snake_case spelling used by the fleet export.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct VehicleRecord {
    #[serde(alias = "train_id")]
    pub id: String,
    /// 0–1 health indicator, higher is healthier.
    #[serde(alias = "fitness_score", deserialize_with = "lenient_f64")]
    pub fitness_score: f64,
    #[serde(alias = "mileage_since_maintenance", deserialize_with = "lenient_km")]
    pub mileage_since_maintenance: u64,
    /// Calendar date string; unparsable values are scored as worst case.
    #[serde(alias = "last_maintenance_date", skip_serializing_if = "Option::is_none")]
    pub last_maintenance_date: Option<String>,
    #[serde(alias = "maintenance_due", deserialize_with = "lenient_bool")]
    pub maintenance_due: bool,
    #[serde(alias = "job_card_status", deserialize_with = "lenient_job_card")]
    pub job_card_status: JobCardStatus,
    /// Free-form label, meaningful only while the job card is open.
    #[serde(alias = "maintenance_type", skip_serializing_if = "Option::is_none")]
    pub maintenance_type: Option<String>,
    #[serde(alias = "needs_cleaning", deserialize_with = "lenient_bool")]
    pub needs_cleaning: bool,
    #[serde(alias = "branding_active", deserialize_with = "lenient_bool")]
    pub branding_active: bool,
    /// Decays toward 0 as the branding contract approaches its end.
    #[serde(alias = "branding_priority", deserialize_with = "lenient_f64")]
    pub branding_priority: f64,
    #[serde(alias = "branding_company", skip_serializing_if = "Option::is_none")]
    pub branding_company: Option<String>,
    /// Pre-computed hint from the data source, e.g. "Maintenance (IBL)".
    #[serde(alias = "recommended_action", skip_serializing_if = "Option::is_none")]
    pub recommended_action: Option<String>,
    // Informational fields carried through from the source; never scored.
    #[serde(
        alias = "total_mileage",
        deserialize_with = "lenient_opt_km",
        skip_serializing_if = "Option::is_none"
    )]
    pub total_mileage: Option<u64>,
    #[serde(alias = "last_cleaning_date", skip_serializing_if = "Option::is_none")]
    pub last_cleaning_date: Option<String>,
    #[serde(alias = "stabling_bay_id", skip_serializing_if = "Option::is_none")]
    pub stabling_bay_id: Option<String>,
}

impl VehicleRecord {
    pub fn new(id: impl Into<String>) -> Self {
        VehicleRecord {
            id: id.into(),
            ..Default::default()
        }
    }

    /// A vehicle that must go to the maintenance bay regardless of its score:
    /// open job card, maintenance due, or a recommended action that points at
    /// maintenance.
    pub fn is_maintenance_forced(&self) -> bool {
        self.job_card_status == JobCardStatus::Open
            || self.maintenance_due
            || self
                .recommended_action
                .as_deref()
                .is_some_and(recommends_maintenance)
    }
}

fn recommends_maintenance(action: &str) -> bool {
    let action = action.to_ascii_lowercase();
    action.contains("maintenance") || action.contains("ibl")
}

/// Relative importance per criterion key. Values need not sum to anything in
/// particular; the scorer normalizes by the total at use time.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct WeightConfig(BTreeMap<String, f64>);

impl WeightConfig {
    pub fn new() -> Self {
        WeightConfig(BTreeMap::new())
    }

    pub fn with(mut self, key: impl Into<String>, weight: f64) -> Self {
        self.0.insert(key.into(), weight);
        self
    }

    /// The value stored under `key`, exactly as supplied.
    pub fn raw(&self, key: &str) -> Option<f64> {
        self.0.get(key).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Effective weight of `criterion`: the canonical key if present, else the
    /// first alias present. Negative or non-finite values count as 0.
    pub fn weight(&self, criterion: Criterion) -> f64 {
        std::iter::once(criterion.key())
            .chain(criterion.aliases().iter().copied())
            .find_map(|k| self.raw(k))
            .filter(|w| w.is_finite() && *w > 0.0)
            .unwrap_or(0.0)
    }

    /// Sum of the effective weights of all recognized criteria.
    pub fn total(&self) -> f64 {
        Criterion::ALL.into_iter().map(|c| self.weight(c)).sum()
    }
}

impl<K: Into<String>> FromIterator<(K, f64)> for WeightConfig {
    fn from_iter<I: IntoIterator<Item = (K, f64)>>(iter: I) -> Self {
        WeightConfig(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

/// How many vehicles the timetable needs on the running roster.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RequirementSet {
    #[serde(alias = "service_trains_required")]
    pub service: u32,
    #[serde(alias = "standby_trains_required")]
    pub standby: u32,
}

impl RequirementSet {
    pub fn new(service: u32, standby: u32) -> Self {
        RequirementSet { service, standby }
    }
}

/// One row of the requirement table published by operations planning.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DailyRequirement {
    pub date: String,
    #[serde(flatten)]
    pub requirements: RequirementSet,
}

// ---------------------------------------------------------------------------
// Derived types
// ---------------------------------------------------------------------------

/// Scalar carried by a diagnostic reason.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ReasonValue {
    Flag(bool),
    Count(u64),
    Number(f64),
}

/// One line of the audit trail attached to a plan entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Reason {
    Metric { metric: String, value: ReasonValue },
    Note { note: String },
}

impl Reason {
    pub fn metric(metric: &str, value: ReasonValue) -> Self {
        Reason::Metric {
            metric: metric.to_string(),
            value,
        }
    }

    pub fn note(note: impl Into<String>) -> Self {
        Reason::Note { note: note.into() }
    }
}

/// A vehicle with its composite score, produced fresh for each optimization.
#[derive(Debug, Clone)]
pub struct ScoredVehicle<'a> {
    pub vehicle: &'a VehicleRecord,
    pub score: f64,
    pub reasons: Vec<Reason>,
}

/// A plan entry together with the record it was built from. Conflict rules
/// read the record through this pairing, never by id lookup.
#[derive(Debug, Clone)]
pub struct Placement<'a> {
    pub vehicle: &'a VehicleRecord,
    pub entry: PlanEntry,
}

/// Placement of one vehicle in the plan.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlanEntry {
    pub vehicle_id: String,
    pub assignment: Assignment,
    /// Composite score rounded to 3 decimals.
    pub score: f64,
    pub reasons: Vec<Reason>,
    /// True when the vehicle was sent to IBL by the maintenance predicate
    /// rather than by rank.
    pub forced: bool,
}

/// An advisory policy finding. Never feeds back into the plan.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConflictFinding {
    pub vehicle_id: String,
    pub kind: ConflictKind,
    pub issue: String,
    pub severity: Severity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignment: Option<Assignment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fitness_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mileage_since_maintenance: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maintenance_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branding_company: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branding_priority: Option<f64>,
}

impl ConflictFinding {
    pub fn new(
        vehicle_id: impl Into<String>,
        kind: ConflictKind,
        issue: impl Into<String>,
        severity: Severity,
    ) -> Self {
        ConflictFinding {
            vehicle_id: vehicle_id.into(),
            kind,
            issue: issue.into(),
            severity,
            assignment: None,
            fitness_score: None,
            mileage_since_maintenance: None,
            maintenance_type: None,
            branding_company: None,
            branding_priority: None,
        }
    }
}

/// Roll-up counts for dashboards.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlanSummary {
    pub total_vehicles: usize,
    pub service_count: usize,
    pub standby_count: usize,
    pub ibl_count: usize,
    pub forced_maintenance_count: usize,
    pub conflicts_found: usize,
    pub high_severity_conflicts: usize,
    pub medium_severity_conflicts: usize,
    pub low_severity_conflicts: usize,
    /// Mean plan score of Service vehicles; 0 when none are in service.
    pub average_service_score: f64,
}

/// Complete output of one single-date optimization.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OptimizationResult {
    /// The date the plan is for (ISO 8601).
    pub date: String,
    /// The fleet snapshot date actually used; differs from `date` when the
    /// snapshot for `date` was missing and the latest one was substituted.
    pub data_date: String,
    pub service_needed: u32,
    pub standby_needed: u32,
    pub plan: Vec<PlanEntry>,
    pub conflicts: Vec<ConflictFinding>,
    pub summary: PlanSummary,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
