//! Side-effect hooks invoked after every attempted step.

use std::fmt;

use crate::context::StepContext;

/// Observer run after the metrics of a step have been recorded.
pub trait Callback {
    fn name(&self) -> &str;

    fn call(&mut self, ctx: &StepContext<'_>);
}

type CallbackFn = Box<dyn FnMut(&StepContext<'_>)>;

/// Callback backed by a closure.
pub struct FnCallback {
    name: String,
    f: CallbackFn,
}

impl FnCallback {
    pub fn new<F>(name: impl Into<String>, f: F) -> Self
    where
        F: FnMut(&StepContext<'_>) + 'static,
    {
        Self {
            name: name.into(),
            f: Box::new(f),
        }
    }
}

impl fmt::Debug for FnCallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnCallback")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl Callback for FnCallback {
    fn name(&self) -> &str {
        &self.name
    }

    fn call(&mut self, ctx: &StepContext<'_>) {
        (self.f)(ctx)
    }
}

/// Logs every step at debug level.
#[derive(Clone, Copy, Debug, Default)]
pub struct TraceCallback;

impl Callback for TraceCallback {
    fn name(&self) -> &str {
        "trace"
    }

    fn call(&mut self, ctx: &StepContext<'_>) {
        let solution = ctx.solution();
        tracing::debug!(
            model = ctx.model.name(),
            iteration = ctx.iteration,
            h = ctx.step_size,
            t = solution.t,
            norm = solution.y.norm(),
            "step"
        );
    }
}
