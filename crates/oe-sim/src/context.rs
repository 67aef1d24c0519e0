use oe_core::{OdeModel, State};
use oe_step::StepOutput;

/// Everything metrics, callbacks and step size controllers get to see about
/// one attempted step.
#[derive(Clone, Copy)]
pub struct StepContext<'a> {
    pub iteration: usize,
    /// Step size used for the attempt.
    pub step_size: f64,
    /// Last committed state.
    pub previous: &'a State,
    /// Output of the attempt, not yet committed.
    pub updated: &'a StepOutput,
    pub model: &'a dyn OdeModel,
}

impl<'a> StepContext<'a> {
    pub fn solution(&self) -> &'a State {
        self.updated.solution()
    }
}
