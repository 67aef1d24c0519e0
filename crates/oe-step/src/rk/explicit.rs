use nalgebra::DVector;
use oe_core::{OdeModel, State};

use super::{combine, fit_stages};
use crate::error::StepResult;
use crate::step::{SingleStepMethod, StepFunction, StepOutput, check_step_size};
use crate::tableau::ButcherTableau;

/// Explicit Runge-Kutta method for any strictly lower triangular tableau.
#[derive(Clone, Debug)]
pub struct ExplicitRungeKutta {
    name: String,
    tableau: ButcherTableau,
    order: usize,
    k: Vec<DVector<f64>>,
}

impl ExplicitRungeKutta {
    pub fn new(name: impl Into<String>, tableau: ButcherTableau, order: usize) -> StepResult<Self> {
        tableau.validate_explicit()?;
        Ok(Self {
            name: name.into(),
            tableau,
            order,
            k: Vec::new(),
        })
    }

    pub fn rk4() -> Self {
        Self::trusted("rk4", ButcherTableau::rk4(), 4)
    }

    pub fn midpoint() -> Self {
        Self::trusted("midpoint", ButcherTableau::midpoint(), 2)
    }

    pub fn heun() -> Self {
        Self::trusted("heun", ButcherTableau::heun(), 2)
    }

    pub fn kutta3() -> Self {
        Self::trusted("kutta3", ButcherTableau::kutta3(), 3)
    }

    pub fn three_eighths() -> Self {
        Self::trusted("rk4-3/8", ButcherTableau::three_eighths(), 4)
    }

    fn trusted(name: &str, tableau: ButcherTableau, order: usize) -> Self {
        Self {
            name: name.to_string(),
            tableau,
            order,
            k: Vec::new(),
        }
    }

    pub fn tableau(&self) -> &ButcherTableau {
        &self.tableau
    }

    /// Fill the stage derivatives `k` for a step of size `h` from `state`.
    pub(crate) fn compute_stages(
        &mut self,
        model: &dyn OdeModel,
        state: &State,
        h: f64,
    ) -> StepResult<()> {
        let stages = self.tableau.num_stages();
        fit_stages(&mut self.k, stages, state.dim());

        self.k[0] = model.evaluate(state.t, &state.y)?;
        for i in 1..stages {
            // only the first i betas of row i are nonzero
            let y_i = combine(&state.y, h, &self.tableau.betas[i][..i], &self.k[..i]);
            self.k[i] = model.evaluate(state.t + h * self.tableau.alphas[i], &y_i)?;
        }
        Ok(())
    }

    pub(crate) fn stages(&self) -> &[DVector<f64>] {
        &self.k
    }
}

impl StepFunction for ExplicitRungeKutta {
    fn name(&self) -> &str {
        &self.name
    }

    fn order(&self) -> usize {
        self.order
    }

    fn forward(&mut self, model: &dyn OdeModel, state: &State, h: f64) -> StepResult<StepOutput> {
        check_step_size(h)?;
        self.compute_stages(model, state, h)?;
        let y_new = combine(&state.y, h, &self.tableau.gammas, &self.k);
        Ok(State::new(state.t + h, y_new).into())
    }
}

impl SingleStepMethod for ExplicitRungeKutta {}
