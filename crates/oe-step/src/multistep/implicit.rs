use nalgebra::DVector;
use oe_core::{OdeModel, State};
use oe_solver::{NewtonSolver, NonlinearSolver, SolverResult};

use super::{HistoryCache, MultiStepCoefficients, MultiStepCore};
use crate::error::StepResult;
use crate::rk::combine;
use crate::step::{SingleStepMethod, StepFunction, StepOutput, check_step_size};

/// Implicit multi-step method in BDF form.
///
/// Solves `x + sum_i a_i y_i - h b_k f(t + h, x) = 0` where `b_k` is the
/// weight on the new derivative. Other `b` entries are ignored.
#[derive(Debug)]
pub struct ImplicitMultiStep {
    core: MultiStepCore,
    solver: Box<dyn NonlinearSolver>,
}

impl ImplicitMultiStep {
    pub fn new(
        startup: Box<dyn SingleStepMethod>,
        coefficients: MultiStepCoefficients,
    ) -> StepResult<Self> {
        Self::with_solver(startup, coefficients, Box::new(NewtonSolver::default()))
    }

    pub fn with_solver(
        startup: Box<dyn SingleStepMethod>,
        coefficients: MultiStepCoefficients,
        solver: Box<dyn NonlinearSolver>,
    ) -> StepResult<Self> {
        coefficients.validate_implicit()?;
        Ok(Self {
            core: MultiStepCore::new(startup, coefficients),
            solver,
        })
    }

    pub fn set_solver(&mut self, solver: Box<dyn NonlinearSolver>) {
        self.solver = solver;
    }

    pub fn cache(&self) -> &HistoryCache {
        self.core.cache()
    }
}

impl StepFunction for ImplicitMultiStep {
    fn name(&self) -> &str {
        &self.core.coefficients().name
    }

    fn order(&self) -> usize {
        self.core.coefficients().order
    }

    fn forward(&mut self, model: &dyn OdeModel, state: &State, h: f64) -> StepResult<StepOutput> {
        check_step_size(h)?;
        if let Some(cached) = self.core.prepare(model, state, h)? {
            return Ok(cached.into());
        }

        let history = combine(
            &DVector::zeros(state.dim()),
            1.0,
            self.core.a(),
            self.core.cache().states(),
        );
        let weight = h * self.core.b().last().copied().unwrap_or_default();
        let t_new = state.t + h;

        let residual = |x: &DVector<f64>| -> SolverResult<DVector<f64>> {
            let f = model.evaluate(t_new, x)?;
            Ok(x + &history - f * weight)
        };
        let report = self.solver.solve(state.y.clone(), &residual)?;
        tracing::trace!(
            method = self.name(),
            iterations = report.iterations,
            residual = report.residual_norm,
            "implicit multi-step solve"
        );

        let updated = State::new(t_new, report.x);
        self.core.commit(&updated, None);
        Ok(updated.into())
    }

    fn reset(&mut self) {
        self.core.reset();
    }

    fn reject(&mut self) {
        self.core.reject();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BackwardEuler, ExplicitRungeKutta};
    use oe_core::FnModel;
    use oe_solver::{FixedPointConfig, FixedPointSolver};

    fn decay(lambda: f64) -> FnModel {
        FnModel::builder()
            .rhs(|_t, y, args| y * (-args[0]))
            .arg("lambda", lambda)
            .variables(["y"])
            .build()
            .unwrap()
    }

    fn bdf(coefficients: MultiStepCoefficients) -> ImplicitMultiStep {
        ImplicitMultiStep::new(Box::new(ExplicitRungeKutta::rk4()), coefficients).unwrap()
    }

    #[test]
    fn bdf2_converges_on_decay() {
        let model = decay(1.0);
        let mut method = bdf(MultiStepCoefficients::bdf2());
        let mut state = State::scalar(0.0, 1.0);
        for _ in 0..100 {
            state = method.forward(&model, &state, 0.01).unwrap().into_solution();
        }
        assert!((state.t - 1.0).abs() < 1e-9);
        assert!((state.y[0] - (-1.0f64).exp()).abs() < 1e-4);
    }

    #[test]
    fn bdf1_matches_backward_euler() {
        let model = decay(4.0);
        let mut bdf1 = bdf(MultiStepCoefficients::bdf1());
        let mut euler = BackwardEuler::new();
        let mut a = State::scalar(0.0, 1.0);
        let mut b = a.clone();
        for _ in 0..10 {
            a = bdf1.forward(&model, &a, 0.1).unwrap().into_solution();
            b = euler.forward(&model, &b, 0.1).unwrap().into_solution();
            assert!((a.y[0] - b.y[0]).abs() < 1e-10);
        }
    }

    #[test]
    fn bdf2_is_stable_on_stiff_decay() {
        let model = decay(1000.0);
        let mut method =
            ImplicitMultiStep::new(Box::new(BackwardEuler::new()), MultiStepCoefficients::bdf2())
                .unwrap();
        let mut state = State::scalar(0.0, 1.0);
        for _ in 0..20 {
            state = method.forward(&model, &state, 0.1).unwrap().into_solution();
        }
        assert!(state.y[0].abs() < 1e-3);
    }

    #[test]
    fn derivative_history_is_left_alone() {
        let model = decay(1.0);
        let mut method = bdf(MultiStepCoefficients::bdf2());
        let mut state = State::scalar(0.0, 1.0);
        state = method.forward(&model, &state, 0.1).unwrap().into_solution();
        let derivatives = method.cache().derivatives().to_vec();

        method.forward(&model, &state, 0.1).unwrap();
        assert_eq!(method.cache().derivatives(), derivatives.as_slice());
        assert!((method.cache().times()[1] - 0.2).abs() < 1e-12);
    }

    #[test]
    fn reject_then_retry_reproduces_the_step() {
        let model = decay(2.0);
        let mut method = bdf(MultiStepCoefficients::bdf3());
        let mut state = State::scalar(0.0, 1.0);
        for _ in 0..4 {
            state = method.forward(&model, &state, 0.05).unwrap().into_solution();
        }

        let first = method.forward(&model, &state, 0.05).unwrap();
        method.reject();
        let second = method.forward(&model, &state, 0.05).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn accepts_a_fixed_point_solver() {
        let model = decay(1.0);
        let solver = FixedPointSolver::new(FixedPointConfig::default());
        let mut method = ImplicitMultiStep::with_solver(
            Box::new(ExplicitRungeKutta::rk4()),
            MultiStepCoefficients::bdf2(),
            Box::new(solver),
        )
        .unwrap();
        let mut reference = bdf(MultiStepCoefficients::bdf2());

        let mut a = State::scalar(0.0, 1.0);
        let mut b = a.clone();
        for _ in 0..5 {
            a = method.forward(&model, &a, 0.05).unwrap().into_solution();
            b = reference.forward(&model, &b, 0.05).unwrap().into_solution();
        }
        assert!((a.y[0] - b.y[0]).abs() < 1e-9);
    }

    #[test]
    fn explicit_tables_are_rejected() {
        let coeffs = MultiStepCoefficients::new("no-implicit-weight", vec![-1.0], vec![1.0, 0.0], 1, false);
        assert!(ImplicitMultiStep::new(Box::new(BackwardEuler::new()), coeffs).is_err());
    }
}
