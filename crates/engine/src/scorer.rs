use chrono::NaiveDate;

use crate::config::PolicyConfig;
use crate::model::{Criterion, Reason, ReasonValue, ScoredVehicle, VehicleRecord, WeightConfig};

/// Cleaning metric for a vehicle that does not need cleaning.
pub const CLEAN_METRIC: f64 = 0.8;
/// Cleaning metric for a vehicle that needs cleaning.
pub const UNCLEAN_METRIC: f64 = 0.2;

// ---------------------------------------------------------------------------
// Date parsing helpers
// ---------------------------------------------------------------------------

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%d-%m-%Y"];

/// Parse a calendar date. Datetime strings ("2025-09-18T06:00:00Z",
/// "2025-09-18 06:00") are accepted and reduced to their date part.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    let date_part = s.split(|c| c == 'T' || c == ' ').next().unwrap_or(s);
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(date_part, fmt).ok())
}

/// Days from the vehicle's last maintenance to `eval_date`. A missing or
/// unparsable date yields `unknown_age_days`; a date after `eval_date` yields 0.
pub fn maintenance_age_days(
    vehicle: &VehicleRecord,
    eval_date: NaiveDate,
    unknown_age_days: i64,
) -> i64 {
    vehicle
        .last_maintenance_date
        .as_deref()
        .and_then(parse_date)
        .map(|d| (eval_date - d).num_days().max(0))
        .unwrap_or(unknown_age_days)
}

pub(crate) fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

fn clamp01(v: f64) -> f64 {
    if v.is_finite() {
        v.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

// ---------------------------------------------------------------------------
// Metric table
// ---------------------------------------------------------------------------

/// Normalized 0–1 sub-metrics of one vehicle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Metrics {
    pub readiness: f64,
    pub maintenance: f64,
    pub cleaning: f64,
    pub branding: f64,
    pub mileage: f64,
}

type MetricFn = fn(&Metrics) -> f64;

fn readiness(m: &Metrics) -> f64 {
    m.readiness
}

fn maintenance(m: &Metrics) -> f64 {
    m.maintenance
}

fn cleaning(m: &Metrics) -> f64 {
    m.cleaning
}

fn branding(m: &Metrics) -> f64 {
    m.branding
}

fn mileage(m: &Metrics) -> f64 {
    m.mileage
}

/// Which metric each weighted criterion reads. Adding a criterion means adding
/// a row here and a variant to `Criterion`; the scoring loop is unchanged.
const CRITERIA: [(Criterion, MetricFn); 5] = [
    (Criterion::Readiness, readiness),
    (Criterion::Maintenance, maintenance),
    (Criterion::Cleaning, cleaning),
    (Criterion::Branding, branding),
    (Criterion::Mileage, mileage),
];

// ---------------------------------------------------------------------------
// Scoring
// ---------------------------------------------------------------------------

/// Fleet-wide normalization denominators for one date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FleetScale {
    pub max_mileage: u64,
    pub max_maintenance_age_days: i64,
}

impl FleetScale {
    pub fn of(vehicles: &[VehicleRecord], eval_date: NaiveDate, unknown_age_days: i64) -> Self {
        let max_mileage = vehicles
            .iter()
            .map(|v| v.mileage_since_maintenance)
            .max()
            .unwrap_or(0);
        let max_maintenance_age_days = vehicles
            .iter()
            .map(|v| maintenance_age_days(v, eval_date, unknown_age_days))
            .max()
            .unwrap_or(0);
        FleetScale {
            max_mileage,
            max_maintenance_age_days,
        }
    }
}

/// Compute the normalized sub-metrics of `vehicle` against `scale`.
pub fn metrics(vehicle: &VehicleRecord, scale: &FleetScale, age_days: i64) -> Metrics {
    let max_km = if scale.max_mileage == 0 { 1 } else { scale.max_mileage };
    let max_age = if scale.max_maintenance_age_days <= 0 {
        1
    } else {
        scale.max_maintenance_age_days
    };

    let branded = if vehicle.branding_active { 1.0 } else { 0.0 };

    Metrics {
        readiness: clamp01(vehicle.fitness_score),
        maintenance: clamp01(1.0 - age_days.max(0) as f64 / max_age as f64),
        cleaning: if vehicle.needs_cleaning {
            UNCLEAN_METRIC
        } else {
            CLEAN_METRIC
        },
        branding: clamp01((branded + clamp01(vehicle.branding_priority)) / 2.0),
        mileage: clamp01(1.0 - vehicle.mileage_since_maintenance as f64 / max_km as f64),
    }
}

/// Weighted composite of `metrics`, normalized by the sum of recognized
/// weights. An all-zero configuration scores every vehicle 0.
pub fn composite(metrics: &Metrics, weights: &WeightConfig) -> f64 {
    let total = weights.total();
    let denom = if total > 0.0 { total } else { 1.0 };
    CRITERIA
        .iter()
        .map(|(criterion, metric)| weights.weight(*criterion) / denom * metric(metrics))
        .sum()
}

/// Score one vehicle against the fleet scale for `eval_date`.
pub fn score<'a>(
    vehicle: &'a VehicleRecord,
    weights: &WeightConfig,
    scale: &FleetScale,
    eval_date: NaiveDate,
    policy: &PolicyConfig,
) -> ScoredVehicle<'a> {
    let age_days = maintenance_age_days(vehicle, eval_date, policy.unknown_maintenance_age_days);
    let m = metrics(vehicle, scale, age_days);

    let reasons = vec![
        Reason::metric(
            "fitness_score",
            ReasonValue::Number(round_to(vehicle.fitness_score, 3)),
        ),
        Reason::metric(
            "maintenance_age_days",
            ReasonValue::Count(age_days.max(0) as u64),
        ),
        Reason::metric(
            "mileage_since_maintenance",
            ReasonValue::Count(vehicle.mileage_since_maintenance),
        ),
        Reason::metric("mileage_rank", ReasonValue::Number(round_to(m.mileage, 2))),
        Reason::metric("branding_active", ReasonValue::Flag(vehicle.branding_active)),
        Reason::metric(
            "branding_priority",
            ReasonValue::Number(round_to(vehicle.branding_priority, 3)),
        ),
        Reason::metric("needs_cleaning", ReasonValue::Flag(vehicle.needs_cleaning)),
    ];

    ScoredVehicle {
        vehicle,
        score: composite(&m, weights),
        reasons,
    }
}

/// Score every vehicle of a single-date snapshot, preserving input order.
pub fn score_fleet<'a>(
    vehicles: &'a [VehicleRecord],
    weights: &WeightConfig,
    eval_date: NaiveDate,
    policy: &PolicyConfig,
) -> Vec<ScoredVehicle<'a>> {
    let scale = FleetScale::of(vehicles, eval_date, policy.unknown_maintenance_age_days);
    tracing::debug!(
        vehicles = vehicles.len(),
        max_mileage = scale.max_mileage,
        max_maintenance_age_days = scale.max_maintenance_age_days,
        "scoring fleet"
    );
    vehicles
        .iter()
        .map(|v| score(v, weights, &scale, eval_date, policy))
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
