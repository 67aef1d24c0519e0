//! Shared application service layer for odexplorer.
//!
//! Turns YAML run files into configured models, step functions and loops,
//! caches finished runs in a results store and answers queries about them.

pub mod catalog;
pub mod error;
pub mod methods;
pub mod metrics;
pub mod query;
pub mod run_service;
pub mod schema;
pub mod validate;

// Re-export key types for convenience
pub use catalog::{MODELS, ModelInfo, build_model, model_info};
pub use error::{AppError, AppResult};
pub use methods::{
    BuiltMethod, DEFAULT_STARTUP, METHODS, MethodFamily, MethodInfo, build_method, method_info,
};
pub use metrics::{METRIC_NAMES, build_metric};
pub use query::{RunSummary, extract_metric_series, extract_series, get_run_summary};
pub use run_service::{
    ExecutedRun, RunOptions, RunRequest, RunResponse, SOLVER_VERSION, ensure_run, execute,
    export_csv, list_runs, load_run, load_run_file,
};
pub use schema::RunFile;
pub use validate::{collect_violations, validate_run_file};
