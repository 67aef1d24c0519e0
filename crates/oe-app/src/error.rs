//! Error types for the oe-app service layer.

use std::path::PathBuf;

/// Application error type that wraps errors from the library crates and
/// provides one error interface for the command line front end.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Failed to read run file: {path}")]
    RunFileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse run file {path}: {message}")]
    RunFileParse { path: PathBuf, message: String },

    #[error("Run file validation failed:\n  - {}", violations.join("\n  - "))]
    Validation { violations: Vec<String> },

    #[error("Unknown model: {0}")]
    UnknownModel(String),

    #[error("Unknown method: {0}")]
    UnknownMethod(String),

    #[error("Model error: {0}")]
    Model(String),

    #[error("Step function error: {0}")]
    Step(String),

    #[error("Simulation error: {0}")]
    Simulation(String),

    #[error("Results error: {0}")]
    Results(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for oe-app operations.
pub type AppResult<T> = Result<T, AppError>;

impl From<oe_core::CoreError> for AppError {
    fn from(err: oe_core::CoreError) -> Self {
        AppError::Model(err.to_string())
    }
}

impl From<oe_step::StepError> for AppError {
    fn from(err: oe_step::StepError) -> Self {
        AppError::Step(err.to_string())
    }
}

impl From<oe_sim::SimError> for AppError {
    fn from(err: oe_sim::SimError) -> Self {
        match err {
            oe_sim::SimError::InvalidConfig { violations } => AppError::Validation { violations },
            other => AppError::Simulation(other.to_string()),
        }
    }
}

impl From<oe_results::ResultsError> for AppError {
    fn from(err: oe_results::ResultsError) -> Self {
        AppError::Results(err.to_string())
    }
}
