//! Runge-Kutta methods driven by a Butcher tableau.

mod embedded;
mod explicit;
mod implicit;

use nalgebra::DVector;

pub use embedded::EmbeddedRungeKutta;
pub use explicit::ExplicitRungeKutta;
pub use implicit::ImplicitRungeKutta;

/// `base + h * sum_j weights[j] * terms[j]`, skipping zero weights.
pub(crate) fn combine(
    base: &DVector<f64>,
    h: f64,
    weights: &[f64],
    terms: &[DVector<f64>],
) -> DVector<f64> {
    let mut out = base.clone();
    for (w, term) in weights.iter().zip(terms) {
        if *w != 0.0 {
            out.axpy(h * w, term, 1.0);
        }
    }
    out
}

/// Reuse `stages` if it already holds `num_stages` vectors of length `dim`.
pub(crate) fn fit_stages(stages: &mut Vec<DVector<f64>>, num_stages: usize, dim: usize) {
    let fits = stages.len() == num_stages && stages.iter().all(|k| k.len() == dim);
    if !fits {
        *stages = vec![DVector::zeros(dim); num_stages];
    }
}
