//! Run file schema.
//!
//! ```yaml
//! name: decay
//! model:
//!   builtin: exponential
//!   args: { lambda: -0.5 }
//!   initial: [1.0]
//! method:
//!   name: ab3
//!   startup: rk4
//! integration:
//!   kind: fixed
//!   start: 0.0
//!   end: 10.0
//!   num_steps: 100
//! metrics: [increment_norm]
//! ```

use std::collections::BTreeMap;

use oe_sim::{ErrorControllerConfig, RunConfig};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub model: ModelDef,
    pub method: MethodDef,
    pub integration: IntegrationDef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub controller: Option<ControllerDef>,
    #[serde(default)]
    pub metrics: Vec<String>,
    /// Log every step at debug level.
    #[serde(default)]
    pub trace: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelDef {
    /// Key in the builtin model catalog.
    pub builtin: String,
    /// Overrides of the model's declared arguments, by name.
    #[serde(default)]
    pub args: BTreeMap<String, f64>,
    pub initial: Vec<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MethodDef {
    pub name: String,
    /// Single-step method filling the history of a multi-step method.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub startup: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub solver: Option<SolverDef>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SolverKind {
    #[default]
    Newton,
    FixedPoint,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct SolverDef {
    #[serde(default)]
    pub kind: SolverKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_iterations: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tolerance: Option<f64>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LoopKindDef {
    Fixed,
    Adaptive,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IntegrationDef {
    pub kind: LoopKindDef,
    pub start: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step_size: Option<f64>,
    /// Step count of a fixed run, iteration budget of an adaptive one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_steps: Option<usize>,
}

impl IntegrationDef {
    pub fn run_config(&self) -> RunConfig {
        RunConfig {
            start: self.start,
            end: self.end,
            step_size: self.step_size,
            num_steps: self.num_steps,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ControllerKind {
    #[default]
    Error,
    Fixed,
}

/// Step size control of an adaptive run. Missing values use the defaults of
/// [`ErrorControllerConfig`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ControllerDef {
    #[serde(default)]
    pub kind: ControllerKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub atol: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rtol: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub safety: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_factor: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_factor: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_h: Option<f64>,
}

impl ControllerDef {
    pub fn error_config(&self) -> ErrorControllerConfig {
        let defaults = ErrorControllerConfig::default();
        ErrorControllerConfig {
            atol: self.atol.unwrap_or(defaults.atol),
            rtol: self.rtol.unwrap_or(defaults.rtol),
            safety: self.safety.unwrap_or(defaults.safety),
            min_factor: self.min_factor.unwrap_or(defaults.min_factor),
            max_factor: self.max_factor.unwrap_or(defaults.max_factor),
            min_h: self.min_h.unwrap_or(defaults.min_h),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_minimal_file() {
        let yaml = r#"
model:
  builtin: harmonic
  initial: [1, 0]
method:
  name: rk4
integration:
  kind: fixed
  start: 0
  end: 6.28
  num_steps: 100
"#;
        let run: RunFile = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(run.model.initial, vec![1.0, 0.0]);
        assert_eq!(run.integration.kind, LoopKindDef::Fixed);
        assert!(run.metrics.is_empty());
        assert!(!run.trace);
        assert_eq!(
            run.integration.run_config(),
            RunConfig::new(0.0).with_end(6.28).with_num_steps(100)
        );
    }

    #[test]
    fn controller_defaults_fill_gaps() {
        let def: ControllerDef = serde_yaml::from_str("rtol: 1.0e-6").unwrap();
        let config = def.error_config();
        assert_eq!(def.kind, ControllerKind::Error);
        assert_eq!(config.rtol, 1e-6);
        assert_eq!(config.atol, ErrorControllerConfig::default().atol);
    }

    #[test]
    fn solver_kind_is_snake_case() {
        let def: SolverDef = serde_yaml::from_str("kind: fixed_point\nmax_iterations: 20").unwrap();
        assert_eq!(def.kind, SolverKind::FixedPoint);
        assert_eq!(def.max_iterations, Some(20));
    }
}
