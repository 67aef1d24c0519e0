use oe_core::{OdeModel, State};

use super::{HistoryCache, MultiStepCoefficients, MultiStepCore};
use crate::error::StepResult;
use crate::rk::combine;
use crate::step::{SingleStepMethod, StepFunction, StepOutput, check_step_size};

/// Explicit multi-step method `y_{n+1} = y_n + h sum_i b_i f_i`.
#[derive(Debug)]
pub struct ExplicitMultiStep {
    core: MultiStepCore,
}

impl ExplicitMultiStep {
    pub fn new(
        startup: Box<dyn SingleStepMethod>,
        coefficients: MultiStepCoefficients,
    ) -> StepResult<Self> {
        coefficients.validate_explicit()?;
        Ok(Self {
            core: MultiStepCore::new(startup, coefficients),
        })
    }

    pub fn cache(&self) -> &HistoryCache {
        self.core.cache()
    }
}

impl StepFunction for ExplicitMultiStep {
    fn name(&self) -> &str {
        &self.core.coefficients().name
    }

    fn order(&self) -> usize {
        self.core.coefficients().order
    }

    fn forward(&mut self, model: &dyn OdeModel, state: &State, h: f64) -> StepResult<StepOutput> {
        check_step_size(h)?;
        if let Some(cached) = self.core.prepare(model, state, h)? {
            return Ok(cached.into());
        }

        let y_new = combine(
            &state.y,
            h,
            self.core.b(),
            self.core.cache().derivatives(),
        );
        let updated = State::new(state.t + h, y_new);
        let dy = model.evaluate(updated.t, &updated.y)?;
        self.core.commit(&updated, Some(dy));

        Ok(updated.into())
    }

    fn reset(&mut self) {
        self.core.reset();
    }

    fn reject(&mut self) {
        self.core.reject();
    }
}
