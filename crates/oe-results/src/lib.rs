//! oe-results: run persistence.
//!
//! A run directory holds `manifest.json`, `results.jsonl` (one committed state
//! per line) and `metrics.jsonl` (one metric record per iteration).

pub mod columns;
pub mod hash;
pub mod store;
pub mod types;

pub use columns::column_names;
pub use hash::compute_run_id;
pub use store::RunStore;
pub use types::*;

pub type ResultsResult<T> = Result<T, ResultsError>;

#[derive(thiserror::Error, Debug)]
pub enum ResultsError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Run not found: {run_id}")]
    RunNotFound { run_id: String },

    #[error("Malformed line {line} in {file}: {source}")]
    MalformedLine {
        file: &'static str,
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}
