//! The contract every step function implements.

use std::fmt;

use oe_core::{OdeModel, State};

use crate::error::{StepError, StepResult};

/// Result of one attempted step.
#[derive(Clone, Debug, PartialEq)]
pub enum StepOutput {
    /// A single propagated state.
    Single(State),
    /// Propagated state plus a lower-order estimate of the same step.
    Embedded { solution: State, estimate: State },
}

impl StepOutput {
    /// The state the driver commits when the step is accepted.
    pub fn solution(&self) -> &State {
        match self {
            StepOutput::Single(state) => state,
            StepOutput::Embedded { solution, .. } => solution,
        }
    }

    pub fn estimate(&self) -> Option<&State> {
        match self {
            StepOutput::Single(_) => None,
            StepOutput::Embedded { estimate, .. } => Some(estimate),
        }
    }

    pub fn into_solution(self) -> State {
        match self {
            StepOutput::Single(state) => state,
            StepOutput::Embedded { solution, .. } => solution,
        }
    }

    /// Independent variable reached by the step.
    pub fn t(&self) -> f64 {
        self.solution().t
    }
}

impl From<State> for StepOutput {
    fn from(state: State) -> Self {
        StepOutput::Single(state)
    }
}

/// Trait for step functions.
///
/// `forward` advances `state` by `h`. Implementations may keep internal work
/// buffers or history, so one instance belongs to one run at a time; call
/// [`StepFunction::reset`] before reusing it for an independent run.
pub trait StepFunction: fmt::Debug {
    fn name(&self) -> &str;

    /// Order of accuracy of the propagated solution.
    fn order(&self) -> usize;

    fn forward(&mut self, model: &dyn OdeModel, state: &State, h: f64) -> StepResult<StepOutput>;

    /// Forget any history so the next `forward` starts a fresh run.
    fn reset(&mut self) {}

    /// Undo internal bookkeeping of the most recent `forward`, which the
    /// driver has discarded.
    fn reject(&mut self) {}
}

/// Marker for methods whose step depends on the current state only.
///
/// Multi-step methods take one of these to bootstrap their history.
pub trait SingleStepMethod: StepFunction {}

impl<T: StepFunction + ?Sized> StepFunction for Box<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn order(&self) -> usize {
        (**self).order()
    }

    fn forward(&mut self, model: &dyn OdeModel, state: &State, h: f64) -> StepResult<StepOutput> {
        (**self).forward(model, state, h)
    }

    fn reset(&mut self) {
        (**self).reset()
    }

    fn reject(&mut self) {
        (**self).reject()
    }
}

impl<T: SingleStepMethod + ?Sized> SingleStepMethod for Box<T> {}

pub(crate) fn check_step_size(h: f64) -> StepResult<()> {
    if h.is_finite() {
        Ok(())
    } else {
        Err(StepError::InvalidStepSize { h })
    }
}
