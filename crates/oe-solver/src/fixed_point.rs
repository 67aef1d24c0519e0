//! Successive substitution `x <- x - w F(x)`.

use nalgebra::DVector;

use crate::error::{SolverError, SolverResult};
use crate::{NonlinearSolver, Residual, SolveReport};

#[derive(Clone, Debug)]
pub struct FixedPointConfig {
    pub max_iterations: usize,
    pub abs_tol: f64,
    /// Relaxation factor `w` in (0, 1]
    pub relaxation: f64,
}

impl Default for FixedPointConfig {
    fn default() -> Self {
        Self {
            max_iterations: 500,
            abs_tol: 1e-12,
            relaxation: 1.0,
        }
    }
}

/// Fixed-point iteration for residuals in `F(x) = x - G(x)` form.
///
/// Only converges when `G` is a contraction near the root, which for implicit
/// steps means a small enough `h * L`.
#[derive(Clone, Debug, Default)]
pub struct FixedPointSolver {
    pub config: FixedPointConfig,
}

impl FixedPointSolver {
    pub fn new(config: FixedPointConfig) -> Self {
        Self { config }
    }
}

impl NonlinearSolver for FixedPointSolver {
    fn solve(&self, x0: DVector<f64>, residual: &Residual<'_>) -> SolverResult<SolveReport> {
        let mut x = x0;

        for iter in 0..self.config.max_iterations {
            let r = residual(&x)?;
            let r_norm = r.norm();
            if !r_norm.is_finite() {
                return Err(SolverError::Numeric {
                    what: format!("non-finite residual at iteration {iter}"),
                });
            }
            if r_norm <= self.config.abs_tol {
                return Ok(SolveReport {
                    x,
                    residual_norm: r_norm,
                    iterations: iter,
                });
            }
            x -= r * self.config.relaxation;
        }

        let r_norm = residual(&x)?.norm();
        if r_norm <= self.config.abs_tol {
            return Ok(SolveReport {
                x,
                residual_norm: r_norm,
                iterations: self.config.max_iterations,
            });
        }
        Err(SolverError::ConvergenceFailed {
            what: format!(
                "fixed-point iteration stalled after {} iterations, residual = {}",
                self.config.max_iterations, r_norm
            ),
        })
    }
}
