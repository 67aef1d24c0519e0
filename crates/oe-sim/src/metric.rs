//! Per-step metrics recorded into the run's metric log.

use std::fmt;

use crate::context::StepContext;

/// A named scalar computed from every attempted step.
pub trait Metric {
    /// Key of the metric in every [`crate::MetricRecord`].
    fn name(&self) -> &str;

    fn evaluate(&mut self, ctx: &StepContext<'_>) -> f64;
}

type MetricFn = Box<dyn FnMut(&StepContext<'_>) -> f64>;

/// Metric backed by a closure.
pub struct FnMetric {
    name: String,
    f: MetricFn,
}

impl FnMetric {
    pub fn new<F>(name: impl Into<String>, f: F) -> Self
    where
        F: FnMut(&StepContext<'_>) -> f64 + 'static,
    {
        Self {
            name: name.into(),
            f: Box::new(f),
        }
    }
}

impl fmt::Debug for FnMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnMetric")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl Metric for FnMetric {
    fn name(&self) -> &str {
        &self.name
    }

    fn evaluate(&mut self, ctx: &StepContext<'_>) -> f64 {
        (self.f)(ctx)
    }
}

/// Euclidean norm of `y_new - y_prev`.
#[derive(Clone, Copy, Debug, Default)]
pub struct IncrementNorm;

impl Metric for IncrementNorm {
    fn name(&self) -> &str {
        "increment_norm"
    }

    fn evaluate(&mut self, ctx: &StepContext<'_>) -> f64 {
        (&ctx.solution().y - &ctx.previous.y).norm()
    }
}

/// Euclidean norm of `solution - estimate`; zero for non-embedded steps.
#[derive(Clone, Copy, Debug, Default)]
pub struct ErrorEstimateNorm;

impl Metric for ErrorEstimateNorm {
    fn name(&self) -> &str {
        "error_estimate"
    }

    fn evaluate(&mut self, ctx: &StepContext<'_>) -> f64 {
        ctx.updated
            .estimate()
            .map_or(0.0, |est| (&ctx.solution().y - &est.y).norm())
    }
}
