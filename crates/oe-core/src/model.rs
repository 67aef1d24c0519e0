//! The `OdeModel` capability and the configurable `FnModel` adapter.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use nalgebra::DVector;

use crate::error::{CoreError, CoreResult};
use crate::Real;

/// Right-hand side `f(t, y, args)`. Extra arguments arrive positionally, in
/// the order the model declared them.
pub type RhsFn = Arc<dyn Fn(Real, &DVector<Real>, &[Real]) -> DVector<Real> + Send + Sync>;

/// Trait for ODE systems `y' = f(t, y)`.
///
/// Step functions only ever call [`OdeModel::evaluate`]; the remaining methods
/// describe the model for result persistence and logging.
pub trait OdeModel {
    /// Number of state components.
    fn dim(&self) -> usize;

    /// Compute the derivative `dy/dt = f(t, y)`.
    fn evaluate(&self, t: Real, y: &DVector<Real>) -> CoreResult<DVector<Real>>;

    fn name(&self) -> &str {
        "model"
    }

    fn variable_names(&self) -> &[String] {
        &[]
    }

    fn indep_name(&self) -> &str {
        "time"
    }
}

/// Ordered named extra arguments of a model.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ModelArgs {
    names: Vec<String>,
    values: Vec<Real>,
}

impl ModelArgs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `name` to `value`, appending the name if it was not declared yet.
    pub fn set(&mut self, name: impl Into<String>, value: Real) {
        let name = name.into();
        match self.names.iter().position(|n| *n == name) {
            Some(idx) => self.values[idx] = value,
            None => {
                self.names.push(name);
                self.values.push(value);
            }
        }
    }

    pub fn with(mut self, name: impl Into<String>, value: Real) -> Self {
        self.set(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<Real> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|idx| self.values[idx])
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Values in declaration order.
    pub fn values(&self) -> &[Real] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, Real)> for ModelArgs {
    fn from_iter<I: IntoIterator<Item = (S, Real)>>(iter: I) -> Self {
        let mut args = ModelArgs::new();
        for (name, value) in iter {
            args.set(name, value);
        }
        args
    }
}

/// Named right-hand sides that models can be resolved from by key.
#[derive(Clone, Default)]
pub struct ModelRegistry {
    entries: BTreeMap<String, RhsFn>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&mut self, key: impl Into<String>, rhs: F)
    where
        F: Fn(Real, &DVector<Real>, &[Real]) -> DVector<Real> + Send + Sync + 'static,
    {
        self.entries.insert(key.into(), Arc::new(rhs));
    }

    pub fn get(&self, key: &str) -> Option<RhsFn> {
        self.entries.get(key).cloned()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

impl fmt::Debug for ModelRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.entries.keys()).finish()
    }
}

/// Builder for [`FnModel`].
///
/// A right-hand side comes from exactly one of [`ModelBuilder::rhs`] or
/// [`ModelBuilder::registry_entry`].
#[derive(Default)]
pub struct ModelBuilder {
    name: Option<String>,
    rhs: Option<RhsFn>,
    registry_key: Option<String>,
    registry_rhs: Option<RhsFn>,
    args: ModelArgs,
    variable_names: Vec<String>,
    indep_name: Option<String>,
}

impl ModelBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn rhs<F>(mut self, rhs: F) -> Self
    where
        F: Fn(Real, &DVector<Real>, &[Real]) -> DVector<Real> + Send + Sync + 'static,
    {
        self.rhs = Some(Arc::new(rhs));
        self
    }

    pub fn registry_entry(mut self, registry: &ModelRegistry, key: impl Into<String>) -> Self {
        let key = key.into();
        self.registry_rhs = registry.get(&key);
        self.registry_key = Some(key);
        self
    }

    pub fn arg(mut self, name: impl Into<String>, value: Real) -> Self {
        self.args.set(name, value);
        self
    }

    pub fn args(mut self, args: ModelArgs) -> Self {
        self.args = args;
        self
    }

    pub fn variables<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.variable_names = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn indep_name(mut self, name: impl Into<String>) -> Self {
        self.indep_name = Some(name.into());
        self
    }

    /// Validate the definition, reporting every problem at once.
    pub fn build(self) -> CoreResult<FnModel> {
        let mut violations = Vec::new();

        if self.rhs.is_none() && self.registry_key.is_none() {
            violations.push(
                "missing right-hand side: supply either a closure or a registry entry".to_string(),
            );
        }
        if self.rhs.is_some() && self.registry_key.is_some() {
            violations.push(
                "a closure and a registry entry are mutually exclusive; supply only one"
                    .to_string(),
            );
        }
        if self.variable_names.is_empty() {
            violations.push("at least one variable name is required".to_string());
        }

        if !violations.is_empty() {
            return Err(CoreError::InvalidModel { violations });
        }

        let rhs = match (self.rhs, self.registry_key, self.registry_rhs) {
            (Some(rhs), _, _) | (None, _, Some(rhs)) => rhs,
            (None, key, None) => {
                return Err(CoreError::UnknownModel {
                    name: key.unwrap_or_default(),
                });
            }
        };

        Ok(FnModel {
            name: self.name.unwrap_or_else(|| "model".to_string()),
            rhs,
            args: self.args,
            variable_names: self.variable_names,
            indep_name: self.indep_name.unwrap_or_else(|| "time".to_string()),
        })
    }
}

/// Model backed by a right-hand-side function plus ordered extra arguments.
#[derive(Clone)]
pub struct FnModel {
    name: String,
    rhs: RhsFn,
    args: ModelArgs,
    variable_names: Vec<String>,
    indep_name: String,
}

impl FnModel {
    pub fn builder() -> ModelBuilder {
        ModelBuilder::new()
    }

    pub fn args(&self) -> &ModelArgs {
        &self.args
    }

    /// Override argument values by name; unknown names are appended.
    pub fn update_args<I, S>(&mut self, updates: I)
    where
        I: IntoIterator<Item = (S, Real)>,
        S: Into<String>,
    {
        for (name, value) in updates {
            self.args.set(name, value);
        }
    }
}

impl fmt::Debug for FnModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnModel")
            .field("name", &self.name)
            .field("args", &self.args)
            .field("variable_names", &self.variable_names)
            .field("indep_name", &self.indep_name)
            .finish_non_exhaustive()
    }
}

impl OdeModel for FnModel {
    fn dim(&self) -> usize {
        self.variable_names.len()
    }

    fn evaluate(&self, t: Real, y: &DVector<Real>) -> CoreResult<DVector<Real>> {
        if y.len() != self.variable_names.len() {
            return Err(CoreError::DimensionMismatch {
                what: "model input",
                expected: self.variable_names.len(),
                found: y.len(),
            });
        }

        let dy = (self.rhs)(t, y, self.args.values());

        if dy.len() != y.len() {
            return Err(CoreError::DimensionMismatch {
                what: "model output",
                expected: y.len(),
                found: dy.len(),
            });
        }
        Ok(dy)
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn variable_names(&self) -> &[String] {
        &self.variable_names
    }

    fn indep_name(&self) -> &str {
        &self.indep_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decay(_t: Real, y: &DVector<Real>, args: &[Real]) -> DVector<Real> {
        y * (-args[0])
    }

    #[test]
    fn closure_model_evaluates_with_args() {
        let model = FnModel::builder()
            .rhs(decay)
            .arg("k", 2.0)
            .variables(["y"])
            .build()
            .unwrap();

        let dy = model.evaluate(0.0, &DVector::from_element(1, 3.0)).unwrap();
        assert_eq!(dy[0], -6.0);
        assert_eq!(model.indep_name(), "time");
    }

    #[test]
    fn args_are_passed_in_declaration_order() {
        let model = FnModel::builder()
            .rhs(|_t, _y, args: &[Real]| DVector::from_vec(vec![args[0] - args[1]]))
            .arg("a", 10.0)
            .arg("b", 4.0)
            .variables(["y"])
            .build()
            .unwrap();

        let dy = model.evaluate(0.0, &DVector::from_element(1, 0.0)).unwrap();
        assert_eq!(dy[0], 6.0);
    }

    #[test]
    fn update_args_overrides_by_name() {
        let mut model = FnModel::builder()
            .rhs(decay)
            .arg("k", 1.0)
            .variables(["y"])
            .build()
            .unwrap();
        model.update_args([("k", 0.5)]);

        assert_eq!(model.args().get("k"), Some(0.5));
        assert_eq!(model.args().len(), 1);
    }

    #[test]
    fn registry_and_closure_are_mutually_exclusive() {
        let mut registry = ModelRegistry::new();
        registry.register("decay", decay);

        let err = FnModel::builder()
            .rhs(decay)
            .registry_entry(&registry, "decay")
            .variables(["y"])
            .build()
            .unwrap_err();
        assert!(format!("{err}").contains("mutually exclusive"));
    }

    #[test]
    fn missing_definition_reports_every_violation() {
        let err = FnModel::builder().build().unwrap_err();
        match err {
            CoreError::InvalidModel { violations } => assert_eq!(violations.len(), 2),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn unknown_registry_key_is_rejected() {
        let registry = ModelRegistry::new();
        let err = FnModel::builder()
            .registry_entry(&registry, "nope")
            .variables(["y"])
            .build()
            .unwrap_err();
        assert!(matches!(err, CoreError::UnknownModel { .. }));
    }

    #[test]
    fn dimension_mismatch_is_detected() {
        let model = FnModel::builder()
            .rhs(decay)
            .arg("k", 1.0)
            .variables(["x", "v"])
            .build()
            .unwrap();

        let err = model
            .evaluate(0.0, &DVector::from_element(3, 1.0))
            .unwrap_err();
        assert!(matches!(
            err,
            CoreError::DimensionMismatch {
                expected: 2,
                found: 3,
                ..
            }
        ));
    }
}
