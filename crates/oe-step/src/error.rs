//! Error types for step functions.

use oe_core::CoreError;
use oe_solver::SolverError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StepError {
    #[error("Invalid Butcher tableau: {}", violations.join(", "))]
    InvalidTableau { violations: Vec<String> },

    #[error("Invalid multi-step coefficients: {}", violations.join(", "))]
    InvalidCoefficients { violations: Vec<String> },

    #[error("State dimension changed from {expected} to {found} while the history cache is in use")]
    StateDimension { expected: usize, found: usize },

    #[error("Invalid step size: {h}")]
    InvalidStepSize { h: f64 },

    #[error("Model error: {0}")]
    Model(#[from] CoreError),

    #[error("Nonlinear solve failed: {0}")]
    Solver(#[from] SolverError),
}

pub type StepResult<T> = Result<T, StepError>;
