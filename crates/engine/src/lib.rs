//! Daily fleet induction planning: score every vehicle against weighted
//! criteria, fill the Service and Standby quotas by rank, send the rest and
//! every maintenance-forced vehicle to the inspection bay line, then report
//! policy conflicts in the finished plan.

pub mod assigner;
pub mod config;
pub mod conflicts;
pub mod fleet;
pub mod logging;
pub mod model;
pub mod optimizer;
pub mod scorer;
pub mod validator;

pub use config::PolicyConfig;
pub use fleet::FleetData;
pub use optimizer::{optimize, optimize_batch, OptimizeError, OptimizeInput};
