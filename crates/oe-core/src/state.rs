//! The `(t, y)` pair describing an ODE system at one instant.

use nalgebra::DVector;

use crate::Real;

/// State of an ODE system: independent variable `t` and value `y`.
///
/// Scalar ODEs are states of dimension 1. The dimension is fixed for the
/// lifetime of a run.
#[derive(Clone, Debug, PartialEq)]
pub struct State {
    pub t: Real,
    pub y: DVector<Real>,
}

impl State {
    pub fn new(t: Real, y: DVector<Real>) -> Self {
        Self { t, y }
    }

    /// Build a one-dimensional state.
    pub fn scalar(t: Real, y: Real) -> Self {
        Self {
            t,
            y: DVector::from_element(1, y),
        }
    }

    pub fn from_slice(t: Real, y: &[Real]) -> Self {
        Self {
            t,
            y: DVector::from_column_slice(y),
        }
    }

    pub fn dim(&self) -> usize {
        self.y.len()
    }

    pub fn is_scalar(&self) -> bool {
        self.y.len() == 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn scalar_state_has_dimension_one() {
        let s = State::scalar(0.5, 2.0);
        assert_eq!(s.dim(), 1);
        assert!(s.is_scalar());
        assert_eq!(s.y[0], 2.0);
    }

    proptest! {
        #[test]
        fn from_slice_preserves_components(values in prop::collection::vec(-1e6f64..1e6, 1..8)) {
            let s = State::from_slice(1.0, &values);
            prop_assert_eq!(s.dim(), values.len());
            for (i, v) in values.iter().enumerate() {
                prop_assert_eq!(s.y[i], *v);
            }
        }
    }
}
