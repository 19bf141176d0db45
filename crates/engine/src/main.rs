use std::io::{self, Read, Write};

use serde::{Deserialize, Serialize};

use metropal_engine::model::{DailyRequirement, RequirementSet, WeightConfig};
use metropal_engine::{logging, optimizer, validator, FleetData, OptimizeInput, PolicyConfig};

// ---------------------------------------------------------------------------
// Request / Response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(tag = "command", rename_all = "camelCase")]
enum Request {
    Optimize(OptimizeArgs),
    OptimizeBatch(BatchArgs),
    Validate(ValidateArgs),
}

/// Inputs shared by single-date and batch optimization.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlanningInputs {
    /// Date-keyed fleet snapshots.
    #[serde(default)]
    fleet: FleetData,
    /// Falls back to the policy's default weights when omitted.
    weights: Option<WeightConfig>,
    requirements: Option<RequirementSet>,
    #[serde(default)]
    daily_requirements: Vec<DailyRequirement>,
    #[serde(default)]
    policy: PolicyConfig,
}

impl PlanningInputs {
    fn weights(&self) -> &WeightConfig {
        self.weights.as_ref().unwrap_or(&self.policy.default_weights)
    }

    fn input(&self) -> OptimizeInput<'_> {
        OptimizeInput {
            fleet: &self.fleet,
            weights: self.weights(),
            requirements: self.requirements,
            daily_requirements: &self.daily_requirements,
            policy: &self.policy,
        }
    }
}

#[derive(Debug, Deserialize)]
struct OptimizeArgs {
    #[serde(flatten)]
    inputs: PlanningInputs,
    /// Today's local date when omitted.
    date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct BatchArgs {
    #[serde(flatten)]
    inputs: PlanningInputs,
    #[serde(default)]
    dates: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ValidateArgs {
    #[serde(default)]
    fleet: FleetData,
    /// Same fallback as optimization: the policy's default weights.
    weights: Option<WeightConfig>,
    #[serde(default)]
    policy: PolicyConfig,
}

#[derive(Debug, Serialize)]
struct OkResponse<T: Serialize> {
    ok: bool,
    data: T,
}

#[derive(Debug, Serialize)]
struct ErrResponse {
    ok: bool,
    error: String,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn write_ok<T: Serialize>(data: T) {
    let resp = OkResponse { ok: true, data };
    let json = serde_json::to_string(&resp).unwrap_or_else(|e| {
        format!("{{\"ok\":false,\"error\":\"serialization error: {}\"}}", e)
    });
    println!("{}", json);
    let _ = io::stdout().flush();
}

fn write_err(msg: impl std::fmt::Display) -> ! {
    let error = msg.to_string();
    tracing::error!(%error, "request failed");
    let resp = ErrResponse { ok: false, error };
    let json = serde_json::to_string(&resp).unwrap_or_else(|_| {
        "{\"ok\":false,\"error\":\"double serialization error\"}".to_string()
    });
    println!("{}", json);
    let _ = io::stdout().flush();
    std::process::exit(1);
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn main() {
    logging::init();

    let mut input = String::new();
    if let Err(e) = io::stdin().read_to_string(&mut input) {
        write_err(format!("Failed to read stdin: {}", e));
    }

    let request: Request = match serde_json::from_str(&input) {
        Ok(r) => r,
        Err(e) => write_err(format!("Invalid JSON input: {}", e)),
    };

    match request {
        Request::Optimize(args) => {
            match optimizer::optimize(&args.inputs.input(), args.date.as_deref()) {
                Ok(result) => write_ok(result),
                Err(e) => write_err(e),
            }
        }
        Request::OptimizeBatch(args) => {
            match optimizer::optimize_batch(&args.inputs.input(), &args.dates) {
                Ok(batch) => write_ok(batch),
                Err(e) => write_err(e),
            }
        }
        Request::Validate(args) => {
            let weights = args.weights.as_ref().unwrap_or(&args.policy.default_weights);
            let result = validator::validate(&args.fleet, weights);
            write_ok(result);
        }
    }
}
