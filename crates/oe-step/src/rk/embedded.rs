use oe_core::{OdeModel, State};

use super::combine;
use super::explicit::ExplicitRungeKutta;
use crate::error::StepResult;
use crate::step::{SingleStepMethod, StepFunction, StepOutput, check_step_size};
use crate::tableau::EmbeddedTableau;

/// Explicit Runge-Kutta pair sharing one set of stages.
///
/// `forward` returns [`StepOutput::Embedded`]; the difference between the
/// solution and the estimate is the local error indicator adaptive
/// controllers work from.
#[derive(Clone, Debug)]
pub struct EmbeddedRungeKutta {
    inner: ExplicitRungeKutta,
    estimate_gammas: Vec<f64>,
    estimate_order: usize,
}

impl EmbeddedRungeKutta {
    pub fn new(
        name: impl Into<String>,
        tableau: EmbeddedTableau,
        order: usize,
        estimate_order: usize,
    ) -> StepResult<Self> {
        tableau.validate()?;
        Ok(Self {
            inner: ExplicitRungeKutta::new(name, tableau.tableau, order)?,
            estimate_gammas: tableau.estimate_gammas,
            estimate_order,
        })
    }

    pub fn heun_euler() -> StepResult<Self> {
        Self::new("heun-euler", EmbeddedTableau::heun_euler(), 2, 1)
    }

    pub fn bogacki_shampine() -> StepResult<Self> {
        Self::new("bogacki-shampine", EmbeddedTableau::bogacki_shampine(), 3, 2)
    }

    pub fn fehlberg45() -> StepResult<Self> {
        Self::new("rkf45", EmbeddedTableau::fehlberg45(), 5, 4)
    }

    pub fn dormand_prince() -> StepResult<Self> {
        Self::new("dopri5", EmbeddedTableau::dormand_prince(), 5, 4)
    }

    /// Order of the embedded estimate.
    pub fn estimate_order(&self) -> usize {
        self.estimate_order
    }
}

impl StepFunction for EmbeddedRungeKutta {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn order(&self) -> usize {
        self.inner.order()
    }

    fn forward(&mut self, model: &dyn OdeModel, state: &State, h: f64) -> StepResult<StepOutput> {
        check_step_size(h)?;
        self.inner.compute_stages(model, state, h)?;

        let k = self.inner.stages();
        let solution = combine(&state.y, h, &self.inner.tableau().gammas, k);
        let estimate = combine(&state.y, h, &self.estimate_gammas, k);

        let t_new = state.t + h;
        Ok(StepOutput::Embedded {
            solution: State::new(t_new, solution),
            estimate: State::new(t_new, estimate),
        })
    }
}

impl SingleStepMethod for EmbeddedRungeKutta {}
