use crate::error::{StepError, StepResult};

/// Linear combination weights of a multi-step formula.
///
/// Classical tables are usually written newest entry first; with `reverse`
/// set they are flipped so that index 0 lines up with the oldest cached
/// value. When `a` and `b` differ in length the shorter one is aligned to the
/// newest end of the history.
#[derive(Clone, Debug, PartialEq)]
pub struct MultiStepCoefficients {
    pub name: String,
    pub a: Vec<f64>,
    pub b: Vec<f64>,
    pub order: usize,
    pub reverse: bool,
}

impl MultiStepCoefficients {
    pub fn new(name: impl Into<String>, a: Vec<f64>, b: Vec<f64>, order: usize, reverse: bool) -> Self {
        Self {
            name: name.into(),
            a,
            b,
            order,
            reverse,
        }
    }

    /// Length of the history the formula consumes.
    pub fn num_previous(&self) -> usize {
        self.a.len().max(self.b.len())
    }

    /// `(a, b)` oldest first, zero padded to [`Self::num_previous`].
    pub fn aligned(&self) -> (Vec<f64>, Vec<f64>) {
        let n = self.num_previous();
        let align = |coeffs: &[f64]| {
            let mut ordered = coeffs.to_vec();
            if self.reverse {
                ordered.reverse();
            }
            let mut padded = vec![0.0; n - ordered.len()];
            padded.extend(ordered);
            padded
        };
        (align(&self.a), align(&self.b))
    }

    fn common_violations(&self) -> Vec<String> {
        let mut violations = Vec::new();
        if self.num_previous() == 0 {
            violations.push("at least one coefficient is required".to_string());
        }
        if !self.a.iter().chain(&self.b).all(|c| c.is_finite()) {
            violations.push("all coefficients must be finite".to_string());
        }
        violations
    }

    pub fn validate_explicit(&self) -> StepResult<()> {
        let mut violations = self.common_violations();
        if self.b.is_empty() {
            violations.push("an explicit multi-step method needs derivative weights (b)".to_string());
        }
        into_result(violations)
    }

    pub fn validate_implicit(&self) -> StepResult<()> {
        let mut violations = self.common_violations();
        let (_, b) = self.aligned();
        if b.last().is_none_or(|w| *w == 0.0) {
            violations.push(
                "an implicit multi-step method needs a nonzero weight on the new derivative"
                    .to_string(),
            );
        }
        into_result(violations)
    }

    /// `y_{n+1} = y_n + h (3/2 f_n - 1/2 f_{n-1})`
    pub fn adams_bashforth2() -> Self {
        Self::new("ab2", vec![-1.0], vec![1.5, -0.5], 2, true)
    }

    pub fn adams_bashforth3() -> Self {
        Self::new(
            "ab3",
            vec![-1.0],
            vec![23.0 / 12.0, -16.0 / 12.0, 5.0 / 12.0],
            3,
            true,
        )
    }

    pub fn adams_bashforth4() -> Self {
        Self::new(
            "ab4",
            vec![-1.0],
            vec![55.0 / 24.0, -59.0 / 24.0, 37.0 / 24.0, -9.0 / 24.0],
            4,
            true,
        )
    }

    /// Backward Euler written as a one-step BDF.
    pub fn bdf1() -> Self {
        Self::new("bdf1", vec![-1.0], vec![1.0], 1, true)
    }

    /// `y_{n+1} - 4/3 y_n + 1/3 y_{n-1} = 2/3 h f_{n+1}`
    pub fn bdf2() -> Self {
        Self::new("bdf2", vec![-4.0 / 3.0, 1.0 / 3.0], vec![2.0 / 3.0], 2, true)
    }

    pub fn bdf3() -> Self {
        Self::new(
            "bdf3",
            vec![-18.0 / 11.0, 9.0 / 11.0, -2.0 / 11.0],
            vec![6.0 / 11.0],
            3,
            true,
        )
    }
}

fn into_result(violations: Vec<String>) -> StepResult<()> {
    if violations.is_empty() {
        Ok(())
    } else {
        Err(StepError::InvalidCoefficients { violations })
    }
}
