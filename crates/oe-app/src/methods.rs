//! Step function catalog and factory.

use oe_solver::{FixedPointConfig, FixedPointSolver, NewtonConfig, NewtonSolver, NonlinearSolver};
use oe_step::{
    BackwardEuler, EmbeddedRungeKutta, ExplicitMultiStep, ExplicitRungeKutta, ForwardEuler,
    ImplicitMultiStep, ImplicitRungeKutta, MultiStepCoefficients, SingleStepMethod, StepFunction,
};

use crate::error::{AppError, AppResult};
use crate::schema::{MethodDef, SolverDef, SolverKind};

/// Startup method of a multi-step method when the run file names none.
pub const DEFAULT_STARTUP: &str = "rk4";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodFamily {
    SingleStep,
    /// Single-step pair with an embedded error estimate.
    Embedded,
    MultiStep,
}

#[derive(Debug, Clone, Copy)]
pub struct MethodInfo {
    pub name: &'static str,
    pub family: MethodFamily,
    pub order: usize,
    pub implicit: bool,
}

impl MethodInfo {
    pub fn is_single_step(&self) -> bool {
        self.family != MethodFamily::MultiStep
    }

    pub fn has_estimate(&self) -> bool {
        self.family == MethodFamily::Embedded
    }
}

const fn info(
    name: &'static str,
    family: MethodFamily,
    order: usize,
    implicit: bool,
) -> MethodInfo {
    MethodInfo {
        name,
        family,
        order,
        implicit,
    }
}

pub const METHODS: &[MethodInfo] = &[
    info("euler", MethodFamily::SingleStep, 1, false),
    info("backward-euler", MethodFamily::SingleStep, 1, true),
    info("midpoint", MethodFamily::SingleStep, 2, false),
    info("heun", MethodFamily::SingleStep, 2, false),
    info("kutta3", MethodFamily::SingleStep, 3, false),
    info("rk4", MethodFamily::SingleStep, 4, false),
    info("three-eighths", MethodFamily::SingleStep, 4, false),
    info("gauss-legendre-4", MethodFamily::SingleStep, 4, true),
    info("radau-iia-3", MethodFamily::SingleStep, 3, true),
    info("lobatto-iiic-2", MethodFamily::SingleStep, 2, true),
    info("heun-euler", MethodFamily::Embedded, 2, false),
    info("bogacki-shampine", MethodFamily::Embedded, 3, false),
    info("rkf45", MethodFamily::Embedded, 5, false),
    info("dopri5", MethodFamily::Embedded, 5, false),
    info("ab2", MethodFamily::MultiStep, 2, false),
    info("ab3", MethodFamily::MultiStep, 3, false),
    info("ab4", MethodFamily::MultiStep, 4, false),
    info("bdf1", MethodFamily::MultiStep, 1, true),
    info("bdf2", MethodFamily::MultiStep, 2, true),
    info("bdf3", MethodFamily::MultiStep, 3, true),
];

pub fn method_info(name: &str) -> Option<&'static MethodInfo> {
    METHODS.iter().find(|m| m.name == name)
}

/// A ready-to-run step function.
#[derive(Debug)]
pub struct BuiltMethod {
    pub step: Box<dyn StepFunction>,
    /// Order of the embedded estimate, for embedded pairs only.
    pub estimate_order: Option<usize>,
}

pub fn build_solver(def: Option<&SolverDef>) -> Box<dyn NonlinearSolver> {
    let def = def.cloned().unwrap_or_default();
    match def.kind {
        SolverKind::Newton => {
            let mut config = NewtonConfig::default();
            if let Some(n) = def.max_iterations {
                config.max_iterations = n;
            }
            if let Some(tol) = def.tolerance {
                config.abs_tol = tol;
            }
            Box::new(NewtonSolver::new(config))
        }
        SolverKind::FixedPoint => {
            let mut config = FixedPointConfig::default();
            if let Some(n) = def.max_iterations {
                config.max_iterations = n;
            }
            if let Some(tol) = def.tolerance {
                config.abs_tol = tol;
            }
            Box::new(FixedPointSolver::new(config))
        }
    }
}

/// Build a single-step method by name. Implicit methods get their own
/// solver from `solver`.
pub fn build_single_step(
    name: &str,
    solver: Option<&SolverDef>,
) -> AppResult<Box<dyn SingleStepMethod>> {
    let method: Box<dyn SingleStepMethod> = match name {
        "euler" => Box::new(ForwardEuler),
        "backward-euler" => Box::new(BackwardEuler::with_solver(build_solver(solver))),
        "midpoint" => Box::new(ExplicitRungeKutta::midpoint()),
        "heun" => Box::new(ExplicitRungeKutta::heun()),
        "kutta3" => Box::new(ExplicitRungeKutta::kutta3()),
        "rk4" => Box::new(ExplicitRungeKutta::rk4()),
        "three-eighths" => Box::new(ExplicitRungeKutta::three_eighths()),
        "gauss-legendre-4" => implicit_rk(ImplicitRungeKutta::gauss_legendre4(), solver),
        "radau-iia-3" => implicit_rk(ImplicitRungeKutta::radau_iia3(), solver),
        "lobatto-iiic-2" => implicit_rk(ImplicitRungeKutta::lobatto_iiic2(), solver),
        "heun-euler" => Box::new(EmbeddedRungeKutta::heun_euler()?),
        "bogacki-shampine" => Box::new(EmbeddedRungeKutta::bogacki_shampine()?),
        "rkf45" => Box::new(EmbeddedRungeKutta::fehlberg45()?),
        "dopri5" => Box::new(EmbeddedRungeKutta::dormand_prince()?),
        other => return Err(AppError::UnknownMethod(other.to_string())),
    };
    Ok(method)
}

fn implicit_rk(
    mut method: ImplicitRungeKutta,
    solver: Option<&SolverDef>,
) -> Box<dyn SingleStepMethod> {
    method.set_solver(build_solver(solver));
    Box::new(method)
}

fn coefficients(name: &str) -> Option<MultiStepCoefficients> {
    match name {
        "ab2" => Some(MultiStepCoefficients::adams_bashforth2()),
        "ab3" => Some(MultiStepCoefficients::adams_bashforth3()),
        "ab4" => Some(MultiStepCoefficients::adams_bashforth4()),
        "bdf1" => Some(MultiStepCoefficients::bdf1()),
        "bdf2" => Some(MultiStepCoefficients::bdf2()),
        "bdf3" => Some(MultiStepCoefficients::bdf3()),
        _ => None,
    }
}

/// Build the step function a run file asks for.
pub fn build_method(def: &MethodDef) -> AppResult<BuiltMethod> {
    let info = method_info(&def.name).ok_or_else(|| AppError::UnknownMethod(def.name.clone()))?;
    let solver = def.solver.as_ref();

    if info.is_single_step() {
        let estimate_order = match info.family {
            MethodFamily::Embedded => Some(info.order - 1),
            _ => None,
        };
        let step: Box<dyn StepFunction> = Box::new(build_single_step(info.name, solver)?);
        return Ok(BuiltMethod {
            step,
            estimate_order,
        });
    }

    let startup_name = def.startup.as_deref().unwrap_or(DEFAULT_STARTUP);
    let startup_info =
        method_info(startup_name).ok_or_else(|| AppError::UnknownMethod(startup_name.to_string()))?;
    if !startup_info.is_single_step() {
        return Err(AppError::Validation {
            violations: vec![format!(
                "startup method '{startup_name}' of '{}' must be a single-step method",
                info.name
            )],
        });
    }
    let startup = build_single_step(startup_name, solver)?;
    let coefficients =
        coefficients(info.name).ok_or_else(|| AppError::UnknownMethod(info.name.to_string()))?;

    let step: Box<dyn StepFunction> = if info.implicit {
        Box::new(ImplicitMultiStep::with_solver(
            startup,
            coefficients,
            build_solver(solver),
        )?)
    } else {
        Box::new(ExplicitMultiStep::new(startup, coefficients)?)
    };
    Ok(BuiltMethod {
        step,
        estimate_order: None,
    })
}
