use std::collections::{BTreeMap, HashSet};

use chrono::NaiveDate;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::assigner::place;
use crate::config::PolicyConfig;
use crate::conflicts::detect_conflicts;
use crate::fleet::{resolve_requirements, FleetData, RequirementSource};
use crate::model::{
    Assignment, ConflictFinding, DailyRequirement, OptimizationResult, PlanEntry, PlanSummary,
    RequirementSet, Severity, VehicleRecord, WeightConfig,
};
use crate::scorer::{parse_date, round_to, score_fleet};

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum OptimizeError {
    #[error("No vehicle data available for date {0}")]
    NoData(String),
    #[error("Invalid date '{0}' -- expected YYYY-MM-DD")]
    InvalidDate(String),
    #[error("No dates given for batch optimization")]
    EmptyBatch,
}

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

/// What the collaborator layer supplies to every optimization call.
#[derive(Debug, Clone, Copy)]
pub struct OptimizeInput<'a> {
    pub fleet: &'a FleetData,
    pub weights: &'a WeightConfig,
    /// Explicit quotas; when `None` they come from `daily_requirements` or
    /// the policy default.
    pub requirements: Option<RequirementSet>,
    pub daily_requirements: &'a [DailyRequirement],
    pub policy: &'a PolicyConfig,
}

/// A plan and its findings for one snapshot, before any date bookkeeping.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanOutcome {
    pub plan: Vec<PlanEntry>,
    pub conflicts: Vec<ConflictFinding>,
}

// ---------------------------------------------------------------------------
// Core pipeline
// ---------------------------------------------------------------------------

/// Score, assign and scan one single-date snapshot. Pure: the result depends
/// only on the arguments.
pub fn plan_snapshot(
    vehicles: &[VehicleRecord],
    weights: &WeightConfig,
    requirements: &RequirementSet,
    eval_date: NaiveDate,
    policy: &PolicyConfig,
) -> PlanOutcome {
    let scored = score_fleet(vehicles, weights, eval_date, policy);
    let placed = place(&scored, requirements);
    let conflicts = detect_conflicts(&placed, weights, policy);
    let plan = placed.into_iter().map(|p| p.entry).collect();
    PlanOutcome { plan, conflicts }
}

/// Roll-up counts over a finished plan.
pub fn summarize(plan: &[PlanEntry], conflicts: &[ConflictFinding]) -> PlanSummary {
    let count = |a: Assignment| plan.iter().filter(|e| e.assignment == a).count();
    let severity = |s: Severity| conflicts.iter().filter(|c| c.severity == s).count();

    let service_scores: Vec<f64> = plan
        .iter()
        .filter(|e| e.assignment == Assignment::Service)
        .map(|e| e.score)
        .collect();
    let average_service_score = if service_scores.is_empty() {
        0.0
    } else {
        round_to(
            service_scores.iter().sum::<f64>() / service_scores.len() as f64,
            3,
        )
    };

    PlanSummary {
        total_vehicles: plan.len(),
        service_count: count(Assignment::Service),
        standby_count: count(Assignment::Standby),
        ibl_count: count(Assignment::Ibl),
        forced_maintenance_count: plan.iter().filter(|e| e.forced).count(),
        conflicts_found: conflicts.len(),
        high_severity_conflicts: severity(Severity::High),
        medium_severity_conflicts: severity(Severity::Medium),
        low_severity_conflicts: severity(Severity::Low),
        average_service_score,
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Optimize the fleet for `date` (today's local date when `None`).
pub fn optimize(
    input: &OptimizeInput<'_>,
    date: Option<&str>,
) -> Result<OptimizationResult, OptimizeError> {
    let target = match date {
        Some(s) => parse_date(s).ok_or_else(|| OptimizeError::InvalidDate(s.to_string()))?,
        None => chrono::Local::now().date_naive(),
    };
    optimize_on(input, target)
}

/// Optimize the fleet for a concrete target date.
///
/// 1. Resolves the fleet snapshot (latest available when the date is missing).
/// 2. Resolves the quotas (request, requirement table, policy default).
/// 3. Runs the scoring/assignment/conflict pipeline, evaluating maintenance
///    age against `target`.
pub fn optimize_on(
    input: &OptimizeInput<'_>,
    target: NaiveDate,
) -> Result<OptimizationResult, OptimizeError> {
    let date = target.format("%Y-%m-%d").to_string();

    let snapshot = input
        .fleet
        .snapshot(&date)
        .filter(|s| !s.vehicles.is_empty())
        .ok_or_else(|| OptimizeError::NoData(date.clone()))?;
    if snapshot.fallback {
        tracing::warn!(
            requested = %date,
            using = snapshot.date,
            "no fleet snapshot for requested date, using latest"
        );
    }
    warn_duplicate_ids(snapshot.vehicles, snapshot.date);

    let (requirements, source) = resolve_requirements(
        input.requirements,
        input.daily_requirements,
        &date,
        input.policy.default_requirements,
    );
    match source {
        RequirementSource::Request | RequirementSource::Table => {}
        RequirementSource::TableLatest => {
            tracing::warn!(date = %date, "no requirement row for date, using latest row")
        }
        RequirementSource::PolicyDefault => {
            tracing::warn!(date = %date, "no requirement table, using policy default")
        }
    }

    let outcome = plan_snapshot(
        snapshot.vehicles,
        input.weights,
        &requirements,
        target,
        input.policy,
    );
    let summary = summarize(&outcome.plan, &outcome.conflicts);

    tracing::info!(
        date = %date,
        data_date = snapshot.date,
        vehicles = summary.total_vehicles,
        service = summary.service_count,
        standby = summary.standby_count,
        ibl = summary.ibl_count,
        conflicts = summary.conflicts_found,
        "optimization complete"
    );

    Ok(OptimizationResult {
        date,
        data_date: snapshot.date.to_string(),
        service_needed: requirements.service,
        standby_needed: requirements.standby,
        plan: outcome.plan,
        conflicts: outcome.conflicts,
        summary,
    })
}

fn warn_duplicate_ids(vehicles: &[VehicleRecord], date: &str) {
    let mut seen: HashSet<&str> = HashSet::with_capacity(vehicles.len());
    for v in vehicles {
        if !seen.insert(v.id.as_str()) {
            tracing::warn!(vehicle = %v.id, date, "duplicate vehicle id in snapshot");
        }
    }
}

// ---------------------------------------------------------------------------
// Batch
// ---------------------------------------------------------------------------

/// Result for one date of a batch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum DateOutcome {
    Planned(Box<OptimizationResult>),
    Failed { error: String },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BatchResult {
    /// Per-date outcomes keyed by the requested date string.
    pub results: BTreeMap<String, DateOutcome>,
    pub total_dates: usize,
    pub successful: usize,
    pub failed: usize,
}

/// Run independent single-date optimizations for every date in parallel.
/// Per-date failures are reported in the result rather than aborting the batch.
pub fn optimize_batch(
    input: &OptimizeInput<'_>,
    dates: &[String],
) -> Result<BatchResult, OptimizeError> {
    if dates.is_empty() {
        return Err(OptimizeError::EmptyBatch);
    }

    let outcomes: Vec<(String, DateOutcome)> = dates
        .par_iter()
        .map(|d| {
            let outcome = match optimize(input, Some(d.as_str())) {
                Ok(result) => DateOutcome::Planned(Box::new(result)),
                Err(e) => DateOutcome::Failed {
                    error: e.to_string(),
                },
            };
            (d.clone(), outcome)
        })
        .collect();

    // Counts follow the requested list; a repeated date shares one map slot.
    let failed = outcomes
        .iter()
        .filter(|(_, o)| matches!(o, DateOutcome::Failed { .. }))
        .count();
    let results: BTreeMap<String, DateOutcome> = outcomes.into_iter().collect();
    if results.len() < dates.len() {
        tracing::warn!(
            requested = dates.len(),
            distinct = results.len(),
            "batch contains repeated dates"
        );
    }

    Ok(BatchResult {
        total_dates: dates.len(),
        successful: dates.len() - failed,
        failed,
        results,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
