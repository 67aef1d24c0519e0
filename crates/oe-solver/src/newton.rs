//! Damped Newton solver with finite-difference Jacobians.

use crate::error::{SolverError, SolverResult};
use crate::jacobian::JacobianKind;
use crate::{NonlinearSolver, Residual, SolveReport};
use nalgebra::DVector;

/// Newton solver configuration.
#[derive(Clone, Debug)]
pub struct NewtonConfig {
    /// Maximum iterations
    pub max_iterations: usize,
    /// Absolute tolerance for residual norm
    pub abs_tol: f64,
    /// Relative tolerance for residual norm
    pub rel_tol: f64,
    /// Finite difference step (scaled by max(|x_j|, 1))
    pub fd_epsilon: f64,
    /// Differencing scheme for the Jacobian
    pub jacobian: JacobianKind,
    /// Line search backtracking factor
    pub line_search_beta: f64,
    /// Maximum line search iterations
    pub max_line_search_iters: usize,
}

impl Default for NewtonConfig {
    fn default() -> Self {
        Self {
            max_iterations: 50,
            abs_tol: 1e-10,
            rel_tol: 1e-12,
            fd_epsilon: 1e-8,
            jacobian: JacobianKind::Forward,
            line_search_beta: 0.5,
            max_line_search_iters: 20,
        }
    }
}

/// Newton solver with backtracking line search.
pub fn newton_solve<F>(
    x0: DVector<f64>,
    residual_fn: F,
    config: &NewtonConfig,
) -> SolverResult<SolveReport>
where
    F: Fn(&DVector<f64>) -> SolverResult<DVector<f64>>,
{
    let mut x = x0;
    let mut r = residual_fn(&x)?;
    let mut r_norm = r.norm();
    let r0_norm = r_norm;

    let converged = |norm: f64| norm <= config.abs_tol || norm <= config.rel_tol * r0_norm;

    for iter in 0..config.max_iterations {
        if converged(r_norm) {
            return Ok(SolveReport {
                x,
                residual_norm: r_norm,
                iterations: iter,
            });
        }

        let jac = config.jacobian.compute(&x, &residual_fn, config.fd_epsilon)?;

        // Solve J * dx = -r
        let dx = jac.lu().solve(&(-&r)).ok_or_else(|| SolverError::Numeric {
            what: format!("singular Jacobian at iteration {iter}"),
        })?;

        let mut alpha = 1.0;
        let mut x_new = &x + &dx;
        let mut r_new = residual_fn(&x_new)?;
        let mut r_new_norm = r_new.norm();

        for _ in 0..config.max_line_search_iters {
            if r_new_norm.is_finite() && r_new_norm < r_norm {
                break;
            }

            // Backtrack
            alpha *= config.line_search_beta;
            x_new = &x + alpha * &dx;
            r_new = residual_fn(&x_new)?;
            r_new_norm = r_new.norm();
        }

        if !r_new_norm.is_finite() {
            return Err(SolverError::Numeric {
                what: format!("non-finite residual at iteration {iter}"),
            });
        }

        x = x_new;
        r = r_new;
        r_norm = r_new_norm;

        // Check for stagnation
        if alpha < 1e-10 {
            return Err(SolverError::ConvergenceFailed {
                what: format!("line search stagnated at iteration {iter}"),
            });
        }
    }

    if converged(r_norm) {
        return Ok(SolveReport {
            x,
            residual_norm: r_norm,
            iterations: config.max_iterations,
        });
    }

    tracing::debug!(
        residual = r_norm,
        max_iterations = config.max_iterations,
        "newton solve did not converge"
    );
    Err(SolverError::ConvergenceFailed {
        what: format!(
            "maximum iterations {} reached, residual = {}",
            config.max_iterations, r_norm
        ),
    })
}

/// [`NonlinearSolver`] running [`newton_solve`] with a fixed configuration.
#[derive(Clone, Debug, Default)]
pub struct NewtonSolver {
    pub config: NewtonConfig,
}

impl NewtonSolver {
    pub fn new(config: NewtonConfig) -> Self {
        Self { config }
    }
}

impl NonlinearSolver for NewtonSolver {
    fn solve(&self, x0: DVector<f64>, residual: &Residual<'_>) -> SolverResult<SolveReport> {
        newton_solve(x0, residual, &self.config)
    }
}
