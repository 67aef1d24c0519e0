//! Nonlinear root solvers for implicit integration steps.
//!
//! Implicit step functions hand a residual `F(x)` and an initial guess to a
//! [`NonlinearSolver`] and receive either a converged solution or an error.
//! Residuals follow the fixed-point convention `F(x) = x - G(x)`, so
//! `x - F(x)` is the natural fixed-point map.

pub mod error;
pub mod fixed_point;
pub mod jacobian;
pub mod newton;

use nalgebra::DVector;

pub use error::{SolverError, SolverResult};
pub use fixed_point::{FixedPointConfig, FixedPointSolver};
pub use jacobian::{JacobianKind, central_difference_jacobian, finite_difference_jacobian};
pub use newton::{NewtonConfig, NewtonSolver, newton_solve};

/// Residual function handed to a solver.
pub type Residual<'a> = dyn Fn(&DVector<f64>) -> SolverResult<DVector<f64>> + 'a;

/// Outcome of a converged solve.
#[derive(Clone, Debug)]
pub struct SolveReport {
    /// Solution vector
    pub x: DVector<f64>,
    /// Final residual norm
    pub residual_norm: f64,
    /// Number of iterations
    pub iterations: usize,
}

/// Pluggable root finder: initial guess in, converged solution or failure out.
pub trait NonlinearSolver: std::fmt::Debug {
    fn solve(&self, x0: DVector<f64>, residual: &Residual<'_>) -> SolverResult<SolveReport>;
}
