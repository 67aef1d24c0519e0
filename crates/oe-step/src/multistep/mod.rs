//! Multi-step methods and their startup machinery.
//!
//! A k-step method needs k prior states before its formula applies. The
//! [`MultiStepCore`] fills that history on the first `forward` call by running
//! an injected single-step method, then hands out the cached states one per
//! call until the history is exhausted. Only then does the multi-step formula
//! take over.

mod cache;
mod coefficients;
mod explicit;
mod implicit;

pub use cache::HistoryCache;
pub use coefficients::MultiStepCoefficients;
pub use explicit::ExplicitMultiStep;
pub use implicit::ImplicitMultiStep;

use cache::Evicted;
use nalgebra::DVector;
use oe_core::{OdeModel, State};

use crate::error::{StepError, StepResult};
use crate::step::SingleStepMethod;

/// What `reject` has to revert after the latest `forward`.
#[derive(Debug)]
enum Undo {
    /// Startup filled the history; rejecting discards it.
    Startup,
    /// A cached state was handed out.
    Replay { cursor: usize },
    /// The formula shifted the history.
    Shift(Evicted),
}

/// Startup, caching and rejection bookkeeping shared by multi-step methods.
#[derive(Debug)]
pub(crate) struct MultiStepCore {
    startup: Box<dyn SingleStepMethod>,
    coefficients: MultiStepCoefficients,
    /// `a` weights, oldest entry first, padded to the history length.
    a: Vec<f64>,
    /// `b` weights, oldest entry first, padded to the history length.
    b: Vec<f64>,
    cache: HistoryCache,
    undo: Option<Undo>,
}

impl MultiStepCore {
    pub(crate) fn new(
        startup: Box<dyn SingleStepMethod>,
        coefficients: MultiStepCoefficients,
    ) -> Self {
        let (a, b) = coefficients.aligned();
        let cache = HistoryCache::new(coefficients.num_previous());
        Self {
            startup,
            coefficients,
            a,
            b,
            cache,
            undo: None,
        }
    }

    pub(crate) fn coefficients(&self) -> &MultiStepCoefficients {
        &self.coefficients
    }

    pub(crate) fn a(&self) -> &[f64] {
        &self.a
    }

    pub(crate) fn b(&self) -> &[f64] {
        &self.b
    }

    pub(crate) fn cache(&self) -> &HistoryCache {
        &self.cache
    }

    /// Append the state produced by the multi-step formula.
    pub(crate) fn commit(&mut self, state: &State, derivative: Option<DVector<f64>>) {
        let evicted = self.cache.shift(state, derivative);
        if !matches!(self.undo, Some(Undo::Startup)) {
            self.undo = Some(Undo::Shift(evicted));
        }
    }

    /// Run startup if needed and serve cached states.
    ///
    /// Returns `Some(state)` while the startup history is being replayed and
    /// `None` once the caller should apply its multi-step formula.
    pub(crate) fn prepare(
        &mut self,
        model: &dyn OdeModel,
        state: &State,
        h: f64,
    ) -> StepResult<Option<State>> {
        self.undo = None;

        if !self.cache.is_ready() {
            self.perform_startup(model, state, h)?;
            self.undo = Some(Undo::Startup);
        } else if self.cache.dim() != state.dim() {
            return Err(StepError::StateDimension {
                expected: self.cache.dim(),
                found: state.dim(),
            });
        } else {
            self.undo = Some(Undo::Replay {
                cursor: self.cache.cursor(),
            });
        }

        Ok(self.cache.next_cached())
    }

    fn perform_startup(&mut self, model: &dyn OdeModel, state: &State, h: f64) -> StepResult<()> {
        self.cache.reshape(state.dim());

        let dy = model.evaluate(state.t, &state.y)?;
        self.cache.set_slot(0, state, dy);

        let mut current = state.clone();
        for slot in 1..self.cache.len() {
            let next = self.startup.forward(model, &current, h)?.into_solution();
            let dy = model.evaluate(next.t, &next.y)?;
            self.cache.set_slot(slot, &next, dy);
            current = next;
        }

        self.cache.mark_ready();
        tracing::debug!(
            method = %self.coefficients.name,
            startup = self.startup.name(),
            slots = self.cache.len(),
            "multi-step history filled"
        );
        Ok(())
    }

    pub(crate) fn reset(&mut self) {
        self.cache.clear_ready();
        self.undo = None;
        self.startup.reset();
    }

    pub(crate) fn reject(&mut self) {
        match self.undo.take() {
            Some(Undo::Startup) => self.cache.clear_ready(),
            Some(Undo::Replay { cursor }) => self.cache.set_cursor(cursor),
            Some(Undo::Shift(evicted)) => self.cache.unshift(evicted),
            None => {}
        }
    }
}
