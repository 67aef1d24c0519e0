//! Metrics a run file can request by name.

use oe_sim::{ErrorEstimateNorm, FnMetric, IncrementNorm, Metric, StepContext};

use crate::error::{AppError, AppResult};

pub const METRIC_NAMES: &[&str] = &["increment_norm", "error_estimate", "time", "step_size"];

pub fn build_metric(name: &str) -> AppResult<Box<dyn Metric>> {
    let metric: Box<dyn Metric> = match name {
        "increment_norm" => Box::new(IncrementNorm),
        "error_estimate" => Box::new(ErrorEstimateNorm),
        // t reached by the attempted step
        "time" => Box::new(FnMetric::new("time", |ctx: &StepContext<'_>| {
            ctx.solution().t
        })),
        "step_size" => Box::new(FnMetric::new("step_size", |ctx: &StepContext<'_>| {
            ctx.step_size
        })),
        other => {
            return Err(AppError::Validation {
                violations: vec![format!("unknown metric '{other}'")],
            });
        }
    };
    Ok(metric)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_names_match_metric_names() {
        for name in METRIC_NAMES {
            assert_eq!(build_metric(name).unwrap().name(), *name);
        }
        assert!(build_metric("energy").is_err());
    }
}
