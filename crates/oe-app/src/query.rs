//! Query helpers for extracting data from loaded runs.

use oe_results::{MetricRecord, ResultRecord, RunManifest};

use crate::error::{AppError, AppResult};

/// Summary of a run's range and step statistics.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub range: (f64, f64),
    pub record_count: usize,
    pub accepted: usize,
    pub rejected: usize,
    pub min_step: f64,
    pub max_step: f64,
}

/// Get run summary from stored records.
pub fn get_run_summary(
    results: &[ResultRecord],
    metrics: &[MetricRecord],
) -> AppResult<RunSummary> {
    let (first, last) = match (results.first(), results.last()) {
        (Some(first), Some(last)) => (first, last),
        _ => return Err(AppError::Results("no records in run".to_string())),
    };

    // spacing between committed states
    let (min_step, max_step) = results
        .windows(2)
        .map(|w| w[1].t - w[0].t)
        .fold((f64::INFINITY, 0.0f64), |(lo, hi), h| (lo.min(h), hi.max(h)));

    let (accepted, rejected) = metrics
        .last()
        .map_or((results.len(), 0), |m| (m.n_accept, m.n_reject));

    Ok(RunSummary {
        range: (first.t, last.t),
        record_count: results.len(),
        accepted,
        rejected,
        min_step: if min_step.is_finite() { min_step } else { 0.0 },
        max_step,
    })
}

/// Time series of one state component, looked up by column name.
pub fn extract_series(
    manifest: &RunManifest,
    results: &[ResultRecord],
    column: &str,
) -> AppResult<Vec<(f64, f64)>> {
    let index = manifest
        .column_names
        .iter()
        .position(|c| c == column)
        .ok_or_else(|| AppError::Results(format!("unknown column '{column}'")))?;

    results
        .iter()
        .map(|r| {
            r.y.get(index).map(|v| (r.t, *v)).ok_or_else(|| {
                AppError::Results(format!("record at t = {} has no column {index}", r.t))
            })
        })
        .collect()
}

/// Time series of one metric over every attempted step.
pub fn extract_metric_series(
    metrics: &[MetricRecord],
    name: &str,
) -> AppResult<Vec<(usize, f64)>> {
    metrics
        .iter()
        .map(|m| {
            m.get(name)
                .map(|v| (m.iteration, v))
                .ok_or_else(|| AppError::Results(format!("unknown metric '{name}'")))
        })
        .collect()
}
