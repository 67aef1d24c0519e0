use nalgebra::DVector;
use oe_core::{OdeModel, State};
use oe_solver::{NewtonSolver, NonlinearSolver, SolverResult};

use super::{combine, fit_stages};
use crate::error::StepResult;
use crate::step::{SingleStepMethod, StepFunction, StepOutput, check_step_size};
use crate::tableau::ButcherTableau;

/// Fully implicit Runge-Kutta method.
///
/// Each step solves for all stage derivatives at once. The stacked residual
/// over `x = [k_0, ..., k_{s-1}]` is `x_i - f(t + h a_i, y + h sum_j b_ij x_j)`;
/// the previous step's stages seed the solver.
#[derive(Debug)]
pub struct ImplicitRungeKutta {
    name: String,
    tableau: ButcherTableau,
    order: usize,
    k: Vec<DVector<f64>>,
    solver: Box<dyn NonlinearSolver>,
}

impl ImplicitRungeKutta {
    pub fn new(name: impl Into<String>, tableau: ButcherTableau, order: usize) -> StepResult<Self> {
        Self::with_solver(name, tableau, order, Box::new(NewtonSolver::default()))
    }

    pub fn with_solver(
        name: impl Into<String>,
        tableau: ButcherTableau,
        order: usize,
        solver: Box<dyn NonlinearSolver>,
    ) -> StepResult<Self> {
        tableau.validate_implicit()?;
        Ok(Self {
            name: name.into(),
            tableau,
            order,
            k: Vec::new(),
            solver,
        })
    }

    pub fn gauss_legendre4() -> Self {
        Self::trusted("gauss-legendre-4", ButcherTableau::gauss_legendre4(), 4)
    }

    pub fn radau_iia3() -> Self {
        Self::trusted("radau-iia-3", ButcherTableau::radau_iia3(), 3)
    }

    pub fn lobatto_iiic2() -> Self {
        Self::trusted("lobatto-iiic-2", ButcherTableau::lobatto_iiic2(), 2)
    }

    fn trusted(name: &str, tableau: ButcherTableau, order: usize) -> Self {
        Self {
            name: name.to_string(),
            tableau,
            order,
            k: Vec::new(),
            solver: Box::new(NewtonSolver::default()),
        }
    }

    pub fn set_solver(&mut self, solver: Box<dyn NonlinearSolver>) {
        self.solver = solver;
    }

    fn stacked_residual(
        &self,
        model: &dyn OdeModel,
        state: &State,
        h: f64,
        x: &DVector<f64>,
    ) -> SolverResult<DVector<f64>> {
        let stages = self.tableau.num_stages();
        let dim = state.dim();
        let mut out = DVector::zeros(stages * dim);

        for i in 0..stages {
            let mut y_i = state.y.clone();
            for (j, b) in self.tableau.betas[i].iter().enumerate() {
                if *b != 0.0 {
                    y_i.axpy(h * b, &x.rows(j * dim, dim), 1.0);
                }
            }
            let f_i = model.evaluate(state.t + h * self.tableau.alphas[i], &y_i)?;
            out.rows_mut(i * dim, dim)
                .copy_from(&(x.rows(i * dim, dim) - f_i));
        }
        Ok(out)
    }
}

impl StepFunction for ImplicitRungeKutta {
    fn name(&self) -> &str {
        &self.name
    }

    fn order(&self) -> usize {
        self.order
    }

    fn forward(&mut self, model: &dyn OdeModel, state: &State, h: f64) -> StepResult<StepOutput> {
        check_step_size(h)?;
        let stages = self.tableau.num_stages();
        let dim = state.dim();
        fit_stages(&mut self.k, stages, dim);

        let mut x0 = DVector::zeros(stages * dim);
        for (i, k) in self.k.iter().enumerate() {
            x0.rows_mut(i * dim, dim).copy_from(k);
        }

        let residual = |x: &DVector<f64>| self.stacked_residual(model, state, h, x);
        let report = self.solver.solve(x0, &residual)?;
        tracing::trace!(
            method = %self.name,
            iterations = report.iterations,
            residual = report.residual_norm,
            "implicit stages solved"
        );

        for (i, k) in self.k.iter_mut().enumerate() {
            k.copy_from(&report.x.rows(i * dim, dim));
        }

        let y_new = combine(&state.y, h, &self.tableau.gammas, &self.k);
        Ok(State::new(state.t + h, y_new).into())
    }
}

impl SingleStepMethod for ImplicitRungeKutta {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StepError;
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

    #[test]
    fn gauss_legendre_tracks_decay() {
        let model = decay(1.0);
        let mut method = ImplicitRungeKutta::gauss_legendre4();
        let mut state = State::scalar(0.0, 1.0);
        for _ in 0..10 {
            state = method.forward(&model, &state, 0.1).unwrap().into_solution();
        }
        assert!((state.y[0] - (-1.0f64).exp()).abs() < 1e-7);
    }

    #[test]
    fn radau_is_stable_on_stiff_decay() {
        let model = decay(1000.0);
        let mut method = ImplicitRungeKutta::radau_iia3();
        let mut state = State::scalar(0.0, 1.0);
        for _ in 0..20 {
            state = method.forward(&model, &state, 0.1).unwrap().into_solution();
        }
        assert!(state.y[0].abs() < 1e-6);
    }

    #[test]
    fn zero_step_returns_same_state() {
        let model = decay(2.0);
        let mut method = ImplicitRungeKutta::lobatto_iiic2();
        let state = State::from_slice(1.0, &[0.5]);
        let out = method.forward(&model, &state, 0.0).unwrap();
        assert_eq!(out.into_solution(), state);
    }

    #[test]
    fn harmonic_oscillator_with_vector_state() {
        let model = FnModel::builder()
            .rhs(|_t, y, _args| DVector::from_vec(vec![y[1], -y[0]]))
            .variables(["x", "v"])
            .build()
            .unwrap();
        let mut method = ImplicitRungeKutta::gauss_legendre4();
        let mut state = State::from_slice(0.0, &[1.0, 0.0]);
        let h = std::f64::consts::PI / 50.0;
        for _ in 0..100 {
            state = method.forward(&model, &state, h).unwrap().into_solution();
        }
        // one full period, Gauss methods conserve the quadratic invariant
        assert!((state.y[0] - 1.0).abs() < 1e-6);
        assert!(state.y[1].abs() < 1e-6);
        let energy = state.y[0].powi(2) + state.y[1].powi(2);
        assert!((energy - 1.0).abs() < 1e-8);
    }

    #[test]
    fn fixed_point_solver_can_be_plugged_in() {
        let model = decay(1.0);
        let solver = FixedPointSolver::new(FixedPointConfig::default());
        let mut method = ImplicitRungeKutta::with_solver(
            "gl4-fp",
            ButcherTableau::gauss_legendre4(),
            4,
            Box::new(solver),
        )
        .unwrap();
        let out = method.forward(&model, &State::scalar(0.0, 1.0), 0.05).unwrap();
        assert!((out.solution().y[0] - (-0.05f64).exp()).abs() < 1e-9);
    }

    #[test]
    fn non_convergence_surfaces_as_solver_error() {
        // stiff problem + fixed-point iteration cannot contract
        let model = decay(1000.0);
        let solver = FixedPointSolver::new(FixedPointConfig {
            max_iterations: 10,
            ..FixedPointConfig::default()
        });
        let mut method = ImplicitRungeKutta::with_solver(
            "radau-fp",
            ButcherTableau::radau_iia3(),
            3,
            Box::new(solver),
        )
        .unwrap();
        let err = method
            .forward(&model, &State::scalar(0.0, 1.0), 0.1)
            .unwrap_err();
        assert!(matches!(err, StepError::Solver(_)));
    }

    #[test]
    fn single_stage_tableau_is_rejected() {
        let err = ImplicitRungeKutta::new("be", ButcherTableau::new(vec![1.0], vec![vec![1.0]], vec![1.0]), 1)
            .unwrap_err();
        assert!(matches!(err, StepError::InvalidTableau { .. }));
    }
}
