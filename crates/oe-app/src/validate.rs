//! Run file validation.
//!
//! Collects every problem with a run file instead of stopping at the first
//! one, so a user fixes them in one pass.

use oe_sim::SimError;

use crate::catalog::{model_info, unknown_args};
use crate::error::{AppError, AppResult};
use crate::methods::{DEFAULT_STARTUP, MethodFamily, method_info};
use crate::metrics::METRIC_NAMES;
use crate::schema::{ControllerKind, LoopKindDef, RunFile};

pub fn validate_run_file(run: &RunFile) -> AppResult<()> {
    let violations = collect_violations(run);
    if violations.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation { violations })
    }
}

pub fn collect_violations(run: &RunFile) -> Vec<String> {
    let mut violations = Vec::new();

    match model_info(&run.model.builtin) {
        None => violations.push(format!("unknown model '{}'", run.model.builtin)),
        Some(info) => {
            for arg in unknown_args(info, &run.model.args) {
                violations.push(format!("model '{}' has no argument '{arg}'", info.name));
            }
            if run.model.initial.len() != info.dim() {
                violations.push(format!(
                    "model '{}' has {} variables but {} initial values were given",
                    info.name,
                    info.dim(),
                    run.model.initial.len()
                ));
            }
        }
    }
    if run.model.initial.iter().any(|v| !v.is_finite()) {
        violations.push("initial values must be finite".to_string());
    }

    let method = method_info(&run.method.name);
    match method {
        None => violations.push(format!("unknown method '{}'", run.method.name)),
        Some(info) if info.family == MethodFamily::MultiStep => {
            let startup = run.method.startup.as_deref().unwrap_or(DEFAULT_STARTUP);
            match method_info(startup) {
                None => violations.push(format!("unknown startup method '{startup}'")),
                Some(s) if !s.is_single_step() => violations.push(format!(
                    "startup method '{startup}' must be a single-step method"
                )),
                Some(_) => {}
            }
        }
        Some(info) => {
            if run.method.startup.is_some() {
                violations.push(format!(
                    "method '{}' is single-step and takes no startup method",
                    info.name
                ));
            }
        }
    }

    if let Some(solver) = &run.method.solver {
        if solver.max_iterations == Some(0) {
            violations.push("solver max_iterations must be at least 1".to_string());
        }
        if solver.tolerance.is_some_and(|tol| !(tol > 0.0)) {
            violations.push("solver tolerance must be positive".to_string());
        }
    }

    for name in &run.metrics {
        if !METRIC_NAMES.contains(&name.as_str()) {
            violations.push(format!("unknown metric '{name}'"));
        }
    }

    let config = run.integration.run_config();
    match run.integration.kind {
        LoopKindDef::Fixed => {
            if run.controller.is_some() {
                violations.push("a fixed-step run takes no controller".to_string());
            }
            push_config_violations(&mut violations, config.resolve_fixed().err());
        }
        LoopKindDef::Adaptive => {
            let controller = run.controller.clone().unwrap_or_default();
            if controller.kind == ControllerKind::Error {
                if method.is_some_and(|m| !m.has_estimate()) {
                    violations.push(format!(
                        "error control needs an embedded method, '{}' has no error estimate",
                        run.method.name
                    ));
                }
                let c = controller.error_config();
                if !(c.atol >= 0.0 && c.rtol >= 0.0 && c.atol + c.rtol > 0.0) {
                    violations.push(
                        "controller tolerances must be non-negative and not both zero".to_string(),
                    );
                }
                if !(c.safety > 0.0 && c.safety <= 1.0) {
                    violations.push(format!(
                        "controller safety must be in (0, 1] (got {})",
                        c.safety
                    ));
                }
                if !(c.min_factor > 0.0 && c.min_factor <= 1.0 && c.max_factor >= 1.0) {
                    violations.push(
                        "controller factors need 0 < min_factor <= 1 <= max_factor".to_string(),
                    );
                }
            }
            match config.resolve_adaptive() {
                Ok(schedule) => {
                    if method.is_some_and(|m| m.family == MethodFamily::MultiStep)
                        && !whole_steps(schedule.end - schedule.start, schedule.initial_h)
                    {
                        violations.push(format!(
                            "multi-step method '{}' needs a constant step; end - start \
                             must be a whole number of step_size ({}) in an adaptive run",
                            run.method.name, schedule.initial_h
                        ));
                    }
                }
                Err(err) => push_config_violations(&mut violations, Some(err)),
            }
        }
    }

    violations
}

/// Whether `span` is an integer multiple of `h`, up to rounding.
fn whole_steps(span: f64, h: f64) -> bool {
    let ratio = span / h;
    let rounded = ratio.round();
    rounded >= 1.0 && (ratio - rounded).abs() <= 1e-9 * rounded
}

fn push_config_violations(violations: &mut Vec<String>, err: Option<SimError>) {
    match err {
        Some(SimError::InvalidConfig { violations: found }) => violations.extend(found),
        Some(other) => violations.push(other.to_string()),
        None => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ControllerDef, IntegrationDef, MethodDef, ModelDef};

    fn run_file() -> RunFile {
        RunFile {
            name: None,
            model: ModelDef {
                builtin: "harmonic".to_string(),
                args: Default::default(),
                initial: vec![1.0, 0.0],
            },
            method: MethodDef {
                name: "rk4".to_string(),
                startup: None,
                solver: None,
            },
            integration: IntegrationDef {
                kind: LoopKindDef::Fixed,
                start: 0.0,
                end: Some(1.0),
                step_size: None,
                num_steps: Some(10),
            },
            controller: None,
            metrics: vec![],
            trace: false,
        }
    }

    #[test]
    fn a_well_formed_file_passes() {
        assert!(validate_run_file(&run_file()).is_ok());
    }

    #[test]
    fn every_problem_is_collected() {
        let mut run = run_file();
        run.model.initial = vec![1.0];
        run.method.name = "ab2".to_string();
        run.method.startup = Some("bdf1".to_string());
        run.metrics = vec!["energy".to_string()];
        run.integration.step_size = Some(0.1);

        let violations = collect_violations(&run);
        assert_eq!(violations.len(), 4, "{violations:?}");
        assert!(violations[0].contains("2 variables"));
        assert!(violations[1].contains("single-step"));
        assert!(violations[2].contains("energy"));
        assert!(violations[3].contains("exactly two"));
    }

    #[test]
    fn error_control_requires_an_estimate() {
        let mut run = run_file();
        run.integration.kind = LoopKindDef::Adaptive;
        run.integration.num_steps = None;
        run.controller = Some(ControllerDef::default());
        let violations = collect_violations(&run);
        assert_eq!(violations.len(), 1, "{violations:?}");
        assert!(violations[0].contains("embedded"));

        run.method.name = "bogacki-shampine".to_string();
        assert!(validate_run_file(&run).is_ok());

        run.method.name = "rk4".to_string();
        run.controller = Some(ControllerDef {
            kind: ControllerKind::Fixed,
            ..ControllerDef::default()
        });
        assert!(validate_run_file(&run).is_ok());
    }

    #[test]
    fn adaptive_multistep_runs_need_whole_steps() {
        let mut run = run_file();
        run.model.builtin = "exponential".to_string();
        run.model.initial = vec![1.0];
        run.method.name = "ab3".to_string();
        run.integration.kind = LoopKindDef::Adaptive;
        run.integration.num_steps = None;
        run.integration.end = Some(0.15);
        run.integration.step_size = Some(0.1);
        run.controller = Some(ControllerDef {
            kind: ControllerKind::Fixed,
            ..ControllerDef::default()
        });
        let violations = collect_violations(&run);
        assert_eq!(violations.len(), 1, "{violations:?}");
        assert!(violations[0].contains("whole number"));

        run.integration.end = Some(0.3);
        assert!(validate_run_file(&run).is_ok());
    }
}
