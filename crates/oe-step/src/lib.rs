//! Step functions for ODE integration.
//!
//! Provides:
//! - the [`StepFunction`] contract shared by every method
//! - Butcher-tableau driven explicit, implicit and embedded Runge-Kutta methods
//! - forward and backward Euler
//! - explicit and implicit multi-step methods bootstrapped by a single-step
//!   startup method

pub mod error;
pub mod euler;
pub mod multistep;
pub mod rk;
pub mod step;
pub mod tableau;

pub use error::{StepError, StepResult};
pub use euler::{BackwardEuler, ForwardEuler};
pub use multistep::{ExplicitMultiStep, ImplicitMultiStep, MultiStepCoefficients};
pub use rk::{EmbeddedRungeKutta, ExplicitRungeKutta, ImplicitRungeKutta};
pub use step::{SingleStepMethod, StepFunction, StepOutput};
pub use tableau::{ButcherTableau, EmbeddedTableau};
