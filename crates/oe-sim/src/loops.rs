//! The fixed-step and adaptive driving loops.
//!
//! Both loops follow the same order per iteration: attempt a step, record
//! metrics, run callbacks, then commit. Callbacks therefore always see the
//! last committed state next to the attempted one.

use nalgebra::DVector;
use oe_core::{CoreError, OdeModel, Real, State, ensure_finite_vector};
use oe_step::{StepFunction, StepOutput};

use crate::config::RunConfig;
use crate::context::StepContext;
use crate::controller::StepsizeController;
use crate::error::{SimError, SimResult};
use crate::observers::Observers;
use crate::run::{MetricRecord, Run};

fn initial_state(model: &dyn OdeModel, start: Real, y0: &DVector<Real>) -> SimResult<State> {
    if y0.len() != model.dim() {
        return Err(CoreError::DimensionMismatch {
            what: "initial state",
            expected: model.dim(),
            found: y0.len(),
        }
        .into());
    }
    ensure_finite_vector(y0, "initial state")?;
    Ok(State::new(start, y0.clone()))
}

fn attempt(
    step: &mut dyn StepFunction,
    model: &dyn OdeModel,
    state: &State,
    h: Real,
    iteration: usize,
) -> SimResult<StepOutput> {
    step.forward(model, state, h)
        .map_err(|source| SimError::Step {
            iteration,
            t: state.t,
            source,
        })
}

/// Integrate with a constant step size.
///
/// `config` must fix exactly two of `end`, `step_size` and `num_steps`. Every
/// computed step is committed; the run holds `num_steps` results and as many
/// metric records.
pub fn constant_h_loop(
    model: &dyn OdeModel,
    step: &mut dyn StepFunction,
    y0: &DVector<Real>,
    config: &RunConfig,
    observers: &mut Observers,
) -> SimResult<Run> {
    let schedule = config.resolve_fixed()?;
    let mut state = initial_state(model, schedule.start, y0)?;
    step.reset();

    tracing::debug!(
        model = model.name(),
        method = step.name(),
        h = schedule.step_size,
        num_steps = schedule.num_steps,
        "starting constant step run"
    );

    let h = schedule.step_size;
    let mut run = Run::new(config.clone());
    for iteration in 0..schedule.num_steps {
        let updated = attempt(step, model, &state, h, iteration)?;

        let ctx = StepContext {
            iteration,
            step_size: h,
            previous: &state,
            updated: &updated,
            model,
        };
        let values = observers.evaluate_metrics(&ctx);
        run.metrics.push(MetricRecord {
            iteration,
            step_size: h,
            n_accept: iteration + 1,
            n_reject: 0,
            values,
        });
        observers.dispatch(&ctx);

        let committed = updated.into_solution();
        run.results.push(committed.clone());
        state = committed;
    }

    Ok(run)
}

/// Integrate with a step size chosen by `controller`.
///
/// Rejected attempts are undone in the step function and retried from the
/// same state. Each iteration, accepted or not, produces exactly one metric
/// record whose `step_size` is the size of the next attempt. An accepted state
/// whose own time lies within rounding of `end` is committed with `t == end`
/// and ends the run. A state the step function places past `end`, such as a
/// replayed multi-step startup state, is committed unchanged and also ends the
/// run. Running out of iterations first returns the partial run.
pub fn dynamic_h_loop(
    model: &dyn OdeModel,
    step: &mut dyn StepFunction,
    y0: &DVector<Real>,
    config: &RunConfig,
    controller: &mut dyn StepsizeController,
    observers: &mut Observers,
) -> SimResult<Run> {
    let schedule = config.resolve_adaptive()?;
    let end = schedule.end;
    let mut state = initial_state(model, schedule.start, y0)?;
    step.reset();

    let mut run = Run::new(config.clone());
    if state.t >= end {
        return Ok(run);
    }

    tracing::debug!(
        model = model.name(),
        method = step.name(),
        controller = controller.name(),
        initial_h = schedule.initial_h,
        max_steps = schedule.max_steps,
        "starting adaptive run"
    );

    // states whose time lies within this distance of `end` land on it
    let end_tol = 1e-12 * end.abs().max(1.0);
    let clamp = |from: Real, h: Real| if from + h > end { end - from } else { h };

    let mut h = clamp(state.t, schedule.initial_h);
    let (mut n_accept, mut n_reject) = (0usize, 0usize);

    for iteration in 0..schedule.max_steps {
        let updated = attempt(step, model, &state, h, iteration)?;

        let ctx = StepContext {
            iteration,
            step_size: h,
            previous: &state,
            updated: &updated,
            model,
        };
        let decision = controller.control(&ctx)?;
        let accepted = decision.accepted;
        if accepted {
            n_accept += 1;
        } else {
            n_reject += 1;
        }

        let next_start = if accepted { updated.t() } else { state.t };
        let next_h = clamp(next_start, decision.next_h);

        let values = observers.evaluate_metrics(&ctx);
        run.metrics.push(MetricRecord {
            iteration,
            step_size: next_h,
            n_accept,
            n_reject,
            values,
        });
        observers.dispatch(&ctx);

        if !accepted {
            step.reject();
            h = next_h;
            continue;
        }

        let mut committed = updated.into_solution();
        if (committed.t - end).abs() <= end_tol {
            committed.t = end;
        } else if committed.t > end {
            tracing::warn!(
                t = committed.t,
                end,
                h,
                method = step.name(),
                "step function returned a state past the end; committing it unchanged"
            );
        }
        run.results.push(committed.clone());
        if committed.t >= end {
            tracing::debug!(
                iterations = iteration + 1,
                n_accept,
                n_reject,
                "adaptive run finished"
            );
            return Ok(run);
        }
        state = committed;
        h = next_h;
    }

    tracing::warn!(
        max_steps = schedule.max_steps,
        t = state.t,
        end,
        "adaptive run exhausted its step budget before reaching the end"
    );
    Ok(run)
}
