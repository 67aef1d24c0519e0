//! Persisted run data types.

use oe_core::State;
use oe_sim::RunConfig;
use serde::{Deserialize, Serialize};

pub use oe_sim::MetricRecord;

pub type RunId = String;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunManifest {
    pub run_id: RunId,
    pub model: String,
    pub method: String,
    pub loop_kind: LoopKind,
    /// RFC 3339, UTC.
    pub timestamp: String,
    pub solver_version: String,
    pub indep_name: String,
    pub variable_names: Vec<String>,
    /// One name per state component.
    pub column_names: Vec<String>,
    #[serde(default)]
    pub metric_names: Vec<String>,
    #[serde(default)]
    pub callback_names: Vec<String>,
    pub config: RunConfig,
    pub n_results: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum LoopKind {
    Fixed,
    Adaptive { controller: String },
}

/// One committed state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
    pub t: f64,
    pub y: Vec<f64>,
}

impl From<&State> for ResultRecord {
    fn from(state: &State) -> Self {
        Self {
            t: state.t,
            y: state.y.iter().copied().collect(),
        }
    }
}

impl From<&ResultRecord> for State {
    fn from(record: &ResultRecord) -> Self {
        State::from_slice(record.t, &record.y)
    }
}

/// Current time in the format stored in manifests.
pub fn timestamp_now() -> String {
    chrono::Utc::now().to_rfc3339()
}
