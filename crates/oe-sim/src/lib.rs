//! Driving loops for ODE integration runs.
//!
//! Provides:
//! - run timing configuration with validation and derived parameters
//! - the run context (committed states plus one metric record per iteration)
//! - metric, callback and step size controller capabilities with builtins
//! - `constant_h_loop` (fixed step) and `dynamic_h_loop` (adaptive step)

pub mod callback;
pub mod config;
pub mod context;
pub mod controller;
pub mod error;
pub mod loops;
pub mod metric;
pub mod observers;
pub mod run;

pub use callback::{Callback, FnCallback, TraceCallback};
pub use config::{
    AdaptiveSchedule, DEFAULT_INITIAL_H, DEFAULT_MAX_STEPS, FixedSchedule, RunConfig,
};
pub use context::StepContext;
pub use controller::{
    Decision, ErrorController, ErrorControllerConfig, FixedController, StepsizeController,
};
pub use error::{SimError, SimResult};
pub use loops::{constant_h_loop, dynamic_h_loop};
pub use metric::{ErrorEstimateNorm, FnMetric, IncrementNorm, Metric};
pub use observers::Observers;
pub use run::{MetricRecord, Run};
