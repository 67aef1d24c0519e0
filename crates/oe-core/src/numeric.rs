use nalgebra::DVector;

use crate::CoreError;

/// Floating point type used throughout system
pub type Real = f64;

/// One tolerance for everything
#[derive(Clone, Copy, Debug)]
pub struct Tolerances {
    pub abs: Real,
    pub rel: Real,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            abs: 1e-12,
            rel: 1e-9,
        }
    }
}

pub fn nearly_equal(a: Real, b: Real, tol: Tolerances) -> bool {
    let diff = (a - b).abs();
    if diff <= tol.abs {
        return true;
    }
    diff <= tol.rel * a.abs().max(b.abs())
}

pub fn ensure_finite(v: Real, what: &'static str) -> Result<Real, CoreError> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(CoreError::NonFinite { what, value: v })
    }
}

/// Check every component of a vector, reporting the first offending value.
pub fn ensure_finite_vector(v: &DVector<Real>, what: &'static str) -> Result<(), CoreError> {
    match v.iter().find(|x| !x.is_finite()) {
        Some(bad) => Err(CoreError::NonFinite { what, value: *bad }),
        None => Ok(()),
    }
}

/// Treat zero and non-finite step sizes as "not supplied".
///
/// A step of `0` never advances the run, so the loops read it as a missing
/// entry and derive or default the step instead.
pub fn supplied(v: Option<Real>) -> Option<Real> {
    v.filter(|x| x.is_finite() && *x != 0.0)
}

/// Treat non-finite bounds as "not supplied". Zero is a valid bound.
pub fn supplied_bound(v: Option<Real>) -> Option<Real> {
    v.filter(|x| x.is_finite())
}

/// `floor(x)` that snaps values within a relative `1e-9` of the next integer.
///
/// `(0.3 - 0.0) / 0.1` evaluates to `2.9999999999999996`; a plain floor would
/// silently drop the last step.
pub fn snapped_floor(x: Real) -> Real {
    let rounded = x.round();
    if (x - rounded).abs() <= 1e-9 * rounded.abs().max(1.0) {
        rounded
    } else {
        x.floor()
    }
}
