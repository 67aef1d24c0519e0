//! oe-core: stable foundation for odexplorer.
//!
//! Contains:
//! - state (the `(t, y)` pair every step function consumes and produces)
//! - model (the `OdeModel` capability + the configurable `FnModel` adapter)
//! - numeric (Real + tolerances + float helpers)
//! - error (shared error types)

pub mod error;
pub mod model;
pub mod numeric;
pub mod state;

// Re-exports: nice ergonomics for downstream crates
pub use error::{CoreError, CoreResult};
pub use model::{FnModel, ModelArgs, ModelBuilder, ModelRegistry, OdeModel, RhsFn};
pub use nalgebra::DVector;
pub use numeric::*;
pub use state::State;
