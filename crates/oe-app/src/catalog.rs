//! Builtin model catalog.

use std::collections::BTreeMap;

use nalgebra::DVector;
use oe_core::{FnModel, ModelArgs, ModelRegistry};

use crate::error::{AppError, AppResult};

/// Description of a catalog entry.
#[derive(Debug, Clone, Copy)]
pub struct ModelInfo {
    pub name: &'static str,
    pub equation: &'static str,
    pub variables: &'static [&'static str],
    /// Declared arguments with defaults, in the order the right-hand side
    /// receives them.
    pub args: &'static [(&'static str, f64)],
}

impl ModelInfo {
    pub fn dim(&self) -> usize {
        self.variables.len()
    }
}

pub const MODELS: &[ModelInfo] = &[
    ModelInfo {
        name: "exponential",
        equation: "y' = lambda y",
        variables: &["y"],
        args: &[("lambda", 1.0)],
    },
    ModelInfo {
        name: "logistic",
        equation: "y' = r y (1 - y / k)",
        variables: &["y"],
        args: &[("r", 1.0), ("k", 1.0)],
    },
    ModelInfo {
        name: "harmonic",
        equation: "x' = v, v' = -omega^2 x",
        variables: &["x", "v"],
        args: &[("omega", 1.0)],
    },
    ModelInfo {
        name: "damped",
        equation: "x' = v, v' = -omega^2 x - 2 zeta omega v",
        variables: &["x", "v"],
        args: &[("omega", 1.0), ("zeta", 0.1)],
    },
    ModelInfo {
        name: "lotka-volterra",
        equation: "x' = a x - b x y, y' = d x y - c y",
        variables: &["prey", "predator"],
        args: &[("a", 1.5), ("b", 1.0), ("c", 3.0), ("d", 1.0)],
    },
    ModelInfo {
        name: "van-der-pol",
        equation: "x' = v, v' = mu (1 - x^2) v - x",
        variables: &["x", "v"],
        args: &[("mu", 1.0)],
    },
];

pub fn model_info(name: &str) -> Option<&'static ModelInfo> {
    MODELS.iter().find(|m| m.name == name)
}

/// Registry holding the right-hand side of every catalog model.
pub fn registry() -> ModelRegistry {
    let mut registry = ModelRegistry::new();
    registry.register("exponential", |_t, y: &DVector<f64>, a: &[f64]| y * a[0]);
    registry.register("logistic", |_t, y: &DVector<f64>, a: &[f64]| {
        y.map(|v| a[0] * v * (1.0 - v / a[1]))
    });
    registry.register("harmonic", |_t, y: &DVector<f64>, a: &[f64]| {
        DVector::from_vec(vec![y[1], -a[0] * a[0] * y[0]])
    });
    registry.register("damped", |_t, y: &DVector<f64>, a: &[f64]| {
        let (omega, zeta) = (a[0], a[1]);
        DVector::from_vec(vec![y[1], -omega * omega * y[0] - 2.0 * zeta * omega * y[1]])
    });
    registry.register("lotka-volterra", |_t, y: &DVector<f64>, a: &[f64]| {
        let (prey, predator) = (y[0], y[1]);
        DVector::from_vec(vec![
            a[0] * prey - a[1] * prey * predator,
            a[3] * prey * predator - a[2] * predator,
        ])
    });
    registry.register("van-der-pol", |_t, y: &DVector<f64>, a: &[f64]| {
        DVector::from_vec(vec![y[1], a[0] * (1.0 - y[0] * y[0]) * y[1] - y[0]])
    });
    registry
}

/// Names in `overrides` that the model does not declare.
pub fn unknown_args(info: &ModelInfo, overrides: &BTreeMap<String, f64>) -> Vec<String> {
    overrides
        .keys()
        .filter(|name| !info.args.iter().any(|(declared, _)| *declared == name.as_str()))
        .cloned()
        .collect()
}

/// Build a catalog model with its default arguments replaced by `overrides`.
pub fn build_model(name: &str, overrides: &BTreeMap<String, f64>) -> AppResult<FnModel> {
    let info = model_info(name).ok_or_else(|| AppError::UnknownModel(name.to_string()))?;

    let unknown = unknown_args(info, overrides);
    if !unknown.is_empty() {
        return Err(AppError::Validation {
            violations: unknown
                .into_iter()
                .map(|arg| format!("model '{name}' has no argument '{arg}'"))
                .collect(),
        });
    }

    let args: ModelArgs = info.args.iter().map(|(n, v)| (*n, *v)).collect();
    let mut model = FnModel::builder()
        .name(info.name)
        .registry_entry(&registry(), info.name)
        .args(args)
        .variables(info.variables.iter().copied())
        .build()?;
    model.update_args(overrides.iter().map(|(n, v)| (n.as_str(), *v)));
    Ok(model)
}
