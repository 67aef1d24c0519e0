//! Error types for solver operations.

use oe_core::CoreError;
use thiserror::Error;

/// Errors that can occur during a nonlinear solve.
#[derive(Error, Debug)]
pub enum SolverError {
    #[error("Convergence failed: {what}")]
    ConvergenceFailed { what: String },

    #[error("Numeric error: {what}")]
    Numeric { what: String },

    #[error("Model error: {0}")]
    Model(#[from] CoreError),
}

pub type SolverResult<T> = Result<T, SolverError>;
