use thiserror::Error;

pub type CoreResult<T> = Result<T, CoreError>;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Non-finite numeric value for {what}: {value}")]
    NonFinite { what: &'static str, value: f64 },

    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error("Dimension mismatch for {what}: expected {expected}, found {found}")]
    DimensionMismatch {
        what: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("Invalid model definition: {}", violations.join(", "))]
    InvalidModel { violations: Vec<String> },

    #[error("Unknown model: {name}")]
    UnknownModel { name: String },

    #[error("Model evaluation failed: {message}")]
    Evaluation { message: String },
}
