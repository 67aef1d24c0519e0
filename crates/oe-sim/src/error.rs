//! Error types for integration runs.

use oe_core::CoreError;
use oe_step::StepError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SimError {
    #[error("Invalid run configuration: {}", violations.join("; "))]
    InvalidConfig { violations: Vec<String> },

    #[error("Step size controller '{controller}' needs an embedded error estimate but the step produced none")]
    MissingEstimate { controller: String },

    #[error("Step size fell to {h:e} at t = {t}")]
    StepSizeUnderflow { h: f64, t: f64 },

    #[error("Step failed at iteration {iteration} (t = {t}): {source}")]
    Step {
        iteration: usize,
        t: f64,
        #[source]
        source: StepError,
    },

    #[error("Model error: {0}")]
    Model(#[from] CoreError),
}

pub type SimResult<T> = Result<T, SimError>;
