//! Step size controllers for the adaptive loop.

use oe_core::Real;

use crate::context::StepContext;
use crate::error::{SimError, SimResult};

/// Verdict on one attempted step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Decision {
    pub accepted: bool,
    /// Step size for the next attempt, before clamping to the run's end.
    pub next_h: Real,
}

/// Decides whether an attempted step is kept and how large the next one is.
pub trait StepsizeController {
    fn name(&self) -> &str;

    fn control(&mut self, ctx: &StepContext<'_>) -> SimResult<Decision>;
}

/// Accepts every step and never changes `h`.
#[derive(Clone, Copy, Debug, Default)]
pub struct FixedController;

impl StepsizeController for FixedController {
    fn name(&self) -> &str {
        "fixed"
    }

    fn control(&mut self, ctx: &StepContext<'_>) -> SimResult<Decision> {
        Ok(Decision {
            accepted: true,
            next_h: ctx.step_size,
        })
    }
}

/// Tuning of [`ErrorController`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ErrorControllerConfig {
    pub atol: Real,
    pub rtol: Real,
    pub safety: Real,
    pub min_factor: Real,
    pub max_factor: Real,
    /// Steps smaller than this abort the run instead of retrying.
    pub min_h: Real,
}

impl Default for ErrorControllerConfig {
    fn default() -> Self {
        Self {
            atol: 1e-6,
            rtol: 1e-3,
            safety: 0.9,
            min_factor: 0.2,
            max_factor: 5.0,
            min_h: 1e-12,
        }
    }
}

/// Standard controller for embedded Runge-Kutta pairs.
///
/// The error norm is the RMS of `(solution - estimate) / (atol + rtol * |y|)`
/// with `|y|` the larger of the previous and new magnitudes per component. A
/// step is accepted when the norm is at most one. The next step size is
/// `h * clamp(safety * err^(-1 / (q + 1)), min_factor, max_factor)` where `q`
/// is the order of the lower-order estimate.
#[derive(Clone, Debug)]
pub struct ErrorController {
    pub config: ErrorControllerConfig,
    estimate_order: usize,
}

impl ErrorController {
    pub fn new(config: ErrorControllerConfig, estimate_order: usize) -> Self {
        Self {
            config,
            estimate_order,
        }
    }

    /// Weighted RMS error of an embedded step, `None` for single outputs.
    pub fn error_norm(&self, ctx: &StepContext<'_>) -> Option<Real> {
        let estimate = ctx.updated.estimate()?;
        let solution = ctx.solution();
        let n = solution.y.len().max(1) as Real;
        let sum: Real = solution
            .y
            .iter()
            .zip(estimate.y.iter())
            .zip(ctx.previous.y.iter())
            .map(|((y, e), p)| {
                let scale = self.config.atol + self.config.rtol * y.abs().max(p.abs());
                ((y - e) / scale).powi(2)
            })
            .sum();
        Some((sum / n).sqrt())
    }

    fn factor(&self, err: Real) -> Real {
        let c = &self.config;
        if err == 0.0 {
            return c.max_factor;
        }
        let exponent = -1.0 / (self.estimate_order as Real + 1.0);
        (c.safety * err.powf(exponent)).clamp(c.min_factor, c.max_factor)
    }
}

impl StepsizeController for ErrorController {
    fn name(&self) -> &str {
        "error"
    }

    fn control(&mut self, ctx: &StepContext<'_>) -> SimResult<Decision> {
        let err = self
            .error_norm(ctx)
            .ok_or_else(|| SimError::MissingEstimate {
                controller: self.name().to_string(),
            })?;

        let accepted = err <= 1.0;
        let next_h = if err.is_finite() {
            ctx.step_size * self.factor(err)
        } else {
            ctx.step_size * self.config.min_factor
        };

        if !accepted {
            tracing::debug!(
                iteration = ctx.iteration,
                err,
                h = ctx.step_size,
                next_h,
                "step rejected"
            );
            if next_h < self.config.min_h {
                return Err(SimError::StepSizeUnderflow {
                    h: next_h,
                    t: ctx.previous.t,
                });
            }
        }

        Ok(Decision { accepted, next_h })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oe_core::{FnModel, State};
    use oe_step::StepOutput;

    fn model() -> FnModel {
        FnModel::builder()
            .rhs(|_t, y, _args| y.clone())
            .variables(["y"])
            .build()
            .unwrap()
    }

    fn embedded(solution: f64, estimate: f64) -> StepOutput {
        StepOutput::Embedded {
            solution: State::scalar(0.1, solution),
            estimate: State::scalar(0.1, estimate),
        }
    }

    #[test]
    fn small_error_accepts_and_grows() {
        let model = model();
        let previous = State::scalar(0.0, 1.0);
        let out = embedded(1.0, 1.0 + 1e-9);
        let ctx = StepContext {
            iteration: 0,
            step_size: 0.1,
            previous: &previous,
            updated: &out,
            model: &model,
        };
        let decision = ErrorController::new(ErrorControllerConfig::default(), 4)
            .control(&ctx)
            .unwrap();
        assert!(decision.accepted);
        assert!(decision.next_h > 0.1);
        assert!(decision.next_h <= 0.5 + 1e-15);
    }

    #[test]
    fn large_error_rejects_and_shrinks() {
        let model = model();
        let previous = State::scalar(0.0, 1.0);
        let out = embedded(1.0, 1.1);
        let ctx = StepContext {
            iteration: 0,
            step_size: 0.1,
            previous: &previous,
            updated: &out,
            model: &model,
        };
        let decision = ErrorController::new(ErrorControllerConfig::default(), 1)
            .control(&ctx)
            .unwrap();
        assert!(!decision.accepted);
        assert!((decision.next_h - 0.02).abs() < 1e-15);
    }

    #[test]
    fn single_output_is_an_error() {
        let model = model();
        let previous = State::scalar(0.0, 1.0);
        let out = StepOutput::Single(State::scalar(0.1, 1.1));
        let ctx = StepContext {
            iteration: 0,
            step_size: 0.1,
            previous: &previous,
            updated: &out,
            model: &model,
        };
        let err = ErrorController::new(ErrorControllerConfig::default(), 1)
            .control(&ctx)
            .unwrap_err();
        assert!(matches!(err, SimError::MissingEstimate { .. }));
    }

    #[test]
    fn tiny_steps_abort() {
        let model = model();
        let previous = State::scalar(0.0, 1.0);
        let out = embedded(1.0, 2.0);
        let ctx = StepContext {
            iteration: 7,
            step_size: 1e-12,
            previous: &previous,
            updated: &out,
            model: &model,
        };
        let err = ErrorController::new(ErrorControllerConfig::default(), 1)
            .control(&ctx)
            .unwrap_err();
        assert!(matches!(err, SimError::StepSizeUnderflow { .. }));
    }
}
