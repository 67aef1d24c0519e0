//! Run context: configuration plus the append-only result and metric logs.

use std::collections::BTreeMap;

use oe_core::State;
use serde::{Deserialize, Serialize};

use crate::config::RunConfig;

/// Per-iteration metric values plus the loop's own bookkeeping.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricRecord {
    pub iteration: usize,
    /// Step size the next attempt will use.
    pub step_size: f64,
    pub n_accept: usize,
    pub n_reject: usize,
    /// Metric name to value, one entry per registered metric.
    pub values: BTreeMap<String, f64>,
}

impl MetricRecord {
    pub fn get(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied()
    }
}

/// One integration run. Only the loops append to it.
#[derive(Clone, Debug, PartialEq)]
pub struct Run {
    pub config: RunConfig,
    /// Committed states in order; the initial state is not included.
    pub results: Vec<State>,
    pub metrics: Vec<MetricRecord>,
}

impl Run {
    pub fn new(config: RunConfig) -> Self {
        Self {
            config,
            results: Vec::new(),
            metrics: Vec::new(),
        }
    }

    pub fn final_state(&self) -> Option<&State> {
        self.results.last()
    }

    pub fn n_accept(&self) -> usize {
        self.metrics.last().map_or(0, |m| m.n_accept)
    }

    pub fn n_reject(&self) -> usize {
        self.metrics.last().map_or(0, |m| m.n_reject)
    }
}
