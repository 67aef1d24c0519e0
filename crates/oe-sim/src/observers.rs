use std::collections::BTreeMap;

use crate::callback::Callback;
use crate::context::StepContext;
use crate::metric::Metric;

/// Metrics and callbacks registered for one run.
#[derive(Default)]
pub struct Observers {
    metrics: Vec<Box<dyn Metric>>,
    callbacks: Vec<Box<dyn Callback>>,
}

impl Observers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_metric(mut self, metric: impl Metric + 'static) -> Self {
        self.metrics.push(Box::new(metric));
        self
    }

    pub fn with_callback(mut self, callback: impl Callback + 'static) -> Self {
        self.callbacks.push(Box::new(callback));
        self
    }

    pub fn push_metric(&mut self, metric: Box<dyn Metric>) {
        self.metrics.push(metric);
    }

    pub fn push_callback(&mut self, callback: Box<dyn Callback>) {
        self.callbacks.push(callback);
    }

    pub fn metric_names(&self) -> Vec<String> {
        self.metrics.iter().map(|m| m.name().to_string()).collect()
    }

    pub fn callback_names(&self) -> Vec<String> {
        self.callbacks.iter().map(|c| c.name().to_string()).collect()
    }

    pub(crate) fn evaluate_metrics(&mut self, ctx: &StepContext<'_>) -> BTreeMap<String, f64> {
        self.metrics
            .iter_mut()
            .map(|m| {
                let value = m.evaluate(ctx);
                (m.name().to_string(), value)
            })
            .collect()
    }

    pub(crate) fn dispatch(&mut self, ctx: &StepContext<'_>) {
        for callback in &mut self.callbacks {
            callback.call(ctx);
        }
    }
}

impl std::fmt::Debug for Observers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Observers")
            .field("metrics", &self.metric_names())
            .field("callbacks", &self.callback_names())
            .finish()
    }
}
