//! Run timing configuration and its validation.

use oe_core::{Real, snapped_floor, supplied, supplied_bound};
use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};

/// Initial step size of the adaptive loop when none is configured.
pub const DEFAULT_INITIAL_H: Real = 0.01;

/// Iteration budget of the adaptive loop when none is configured.
pub const DEFAULT_MAX_STEPS: usize = 10_000;

/// Timing parameters of one run as written by the user.
///
/// The fixed-step loop needs exactly two of `end`, `step_size` and
/// `num_steps`. The adaptive loop reads `num_steps` as its iteration budget and
/// `step_size` as the initial step. A zero step size and non-finite values
/// count as missing; `end = 0` is an ordinary bound.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    pub start: Real,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<Real>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step_size: Option<Real>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_steps: Option<usize>,
}

/// Fully resolved fixed-step timing.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FixedSchedule {
    pub start: Real,
    pub end: Real,
    pub step_size: Real,
    pub num_steps: usize,
}

/// Fully resolved adaptive timing.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AdaptiveSchedule {
    pub start: Real,
    pub end: Real,
    pub initial_h: Real,
    pub max_steps: usize,
}

impl RunConfig {
    pub fn new(start: Real) -> Self {
        Self {
            start,
            ..Self::default()
        }
    }

    pub fn with_end(mut self, end: Real) -> Self {
        self.end = Some(end);
        self
    }

    pub fn with_step_size(mut self, h: Real) -> Self {
        self.step_size = Some(h);
        self
    }

    pub fn with_num_steps(mut self, n: usize) -> Self {
        self.num_steps = Some(n);
        self
    }

    fn supplied_steps(&self) -> Option<usize> {
        self.num_steps.filter(|n| *n > 0)
    }

    fn common_violations(&self, end: Option<Real>, h: Option<Real>) -> Vec<String> {
        let mut violations = Vec::new();
        if !self.start.is_finite() {
            violations.push(format!("start must be a finite number (got {})", self.start));
        }
        if let Some(end) = end {
            if self.start > end {
                violations.push(format!(
                    "the upper integration bound ({end}) has to be larger than the start ({})",
                    self.start
                ));
            }
        }
        if let Some(h) = h {
            if h < 0.0 {
                violations.push(format!("step_size must be positive (got {h})"));
            }
        }
        violations
    }

    /// Derive the missing timing parameter for the fixed-step loop.
    pub fn resolve_fixed(&self) -> SimResult<FixedSchedule> {
        let end = supplied_bound(self.end);
        let h = supplied(self.step_size);
        let n = self.supplied_steps();

        let mut violations = self.common_violations(end, h);
        let given = [end.is_some(), h.is_some(), n.is_some()]
            .iter()
            .filter(|g| **g)
            .count();
        if given != 2 {
            violations.push(format!(
                "exactly two of end, step_size and num_steps must be given (got {given})"
            ));
        }
        if !violations.is_empty() {
            return Err(SimError::InvalidConfig { violations });
        }

        let start = self.start;
        let schedule = match (end, h, n) {
            (None, Some(h), Some(n)) => FixedSchedule {
                start,
                end: start + h * n as Real,
                step_size: h,
                num_steps: n,
            },
            (Some(end), None, Some(n)) => {
                tracing::warn!(
                    start,
                    end,
                    num_steps = n,
                    "no step size supplied; deriving it from start, end and num_steps \
                     may cost accuracy"
                );
                FixedSchedule {
                    start,
                    end,
                    step_size: (end - start) / n as Real,
                    num_steps: n,
                }
            }
            (Some(end), Some(h), None) => FixedSchedule {
                start,
                end,
                step_size: h,
                num_steps: snapped_floor((end - start) / h) as usize,
            },
            _ => {
                return Err(SimError::InvalidConfig {
                    violations: vec!["run timing is underdetermined".to_string()],
                });
            }
        };
        Ok(schedule)
    }

    /// Fill in adaptive-loop defaults, warning about each fallback.
    pub fn resolve_adaptive(&self) -> SimResult<AdaptiveSchedule> {
        let end = supplied_bound(self.end);
        let h = supplied(self.step_size);

        let mut violations = self.common_violations(end, h);
        if end.is_none() {
            violations.push("the adaptive loop needs an end value".to_string());
        }
        let end = match end {
            Some(end) if violations.is_empty() => end,
            _ => return Err(SimError::InvalidConfig { violations }),
        };

        let initial_h = h.unwrap_or_else(|| {
            tracing::warn!(
                initial_h = DEFAULT_INITIAL_H,
                "no initial step size supplied, falling back to the builtin default"
            );
            DEFAULT_INITIAL_H
        });
        let max_steps = self.supplied_steps().unwrap_or_else(|| {
            tracing::warn!(
                max_steps = DEFAULT_MAX_STEPS,
                "no maximum step count supplied, falling back to the builtin default"
            );
            DEFAULT_MAX_STEPS
        });

        Ok(AdaptiveSchedule {
            start: self.start,
            end,
            initial_h,
            max_steps,
        })
    }
}
