//! First order methods.

use nalgebra::DVector;
use oe_core::{OdeModel, State};
use oe_solver::{NewtonSolver, NonlinearSolver};

use crate::error::StepResult;
use crate::step::{SingleStepMethod, StepFunction, StepOutput, check_step_size};

/// Forward Euler (explicit, 1st order, fast for testing).
/// Calls the model once per step.
#[derive(Clone, Debug, Default)]
pub struct ForwardEuler;

impl StepFunction for ForwardEuler {
    fn name(&self) -> &str {
        "euler"
    }

    fn order(&self) -> usize {
        1
    }

    fn forward(&mut self, model: &dyn OdeModel, state: &State, h: f64) -> StepResult<StepOutput> {
        check_step_size(h)?;
        let ydot = model.evaluate(state.t, &state.y)?;
        Ok(State::new(state.t + h, &state.y + ydot * h).into())
    }
}

impl SingleStepMethod for ForwardEuler {}

/// Backward Euler (implicit, 1st order, L-stable).
///
/// Solves `x - y - h f(t + h, x) = 0` seeded with the current value.
#[derive(Debug)]
pub struct BackwardEuler {
    solver: Box<dyn NonlinearSolver>,
}

impl Default for BackwardEuler {
    fn default() -> Self {
        Self::new()
    }
}

impl BackwardEuler {
    pub fn new() -> Self {
        Self::with_solver(Box::new(NewtonSolver::default()))
    }

    pub fn with_solver(solver: Box<dyn NonlinearSolver>) -> Self {
        Self { solver }
    }
}

impl StepFunction for BackwardEuler {
    fn name(&self) -> &str {
        "backward-euler"
    }

    fn order(&self) -> usize {
        1
    }

    fn forward(&mut self, model: &dyn OdeModel, state: &State, h: f64) -> StepResult<StepOutput> {
        check_step_size(h)?;
        let t_new = state.t + h;
        let residual = |x: &DVector<f64>| -> oe_solver::SolverResult<DVector<f64>> {
            let f = model.evaluate(t_new, x)?;
            Ok(x - &state.y - f * h)
        };
        let report = self.solver.solve(state.y.clone(), &residual)?;
        Ok(State::new(t_new, report.x).into())
    }
}

impl SingleStepMethod for BackwardEuler {}
