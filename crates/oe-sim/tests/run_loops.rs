//! End-to-end runs of both loops.

use std::cell::RefCell;
use std::rc::Rc;

use nalgebra::DVector;
use oe_core::FnModel;
use oe_sim::{
    Decision, ErrorController, ErrorControllerConfig, ErrorEstimateNorm, FixedController,
    FnCallback, FnMetric, IncrementNorm, Observers, RunConfig, SimError, SimResult, StepContext,
    StepsizeController, constant_h_loop, dynamic_h_loop,
};
use oe_step::{
    EmbeddedRungeKutta, ExplicitMultiStep, ExplicitRungeKutta, ForwardEuler, ImplicitRungeKutta,
    MultiStepCoefficients, StepFunction,
};
use proptest::prelude::*;

fn growth() -> FnModel {
    FnModel::builder()
        .name("growth")
        .rhs(|_t, y, _args| y.clone())
        .variables(["y"])
        .build()
        .expect("valid model")
}

fn one() -> DVector<f64> {
    DVector::from_element(1, 1.0)
}

struct RejectEveryOther {
    calls: usize,
}

impl StepsizeController for RejectEveryOther {
    fn name(&self) -> &str {
        "reject-every-other"
    }

    fn control(&mut self, ctx: &StepContext<'_>) -> SimResult<Decision> {
        self.calls += 1;
        Ok(Decision {
            accepted: self.calls % 2 == 0,
            next_h: ctx.step_size,
        })
    }
}

#[test]
fn ten_constant_steps_reach_one() {
    let config = RunConfig::new(0.0).with_end(1.0).with_num_steps(10);
    let run = constant_h_loop(
        &growth(),
        &mut ExplicitRungeKutta::rk4(),
        &one(),
        &config,
        &mut Observers::new(),
    )
    .expect("run");

    assert_eq!(run.results.len(), 10);
    let last = run.final_state().expect("non-empty");
    assert!((last.t - 1.0).abs() < 1e-12);
    assert!((last.y[0] - std::f64::consts::E).abs() < 1e-5);
    assert_eq!(run.config, config);
}

#[test]
fn metric_records_hold_every_metric_and_ignore_callbacks() {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let log = Rc::clone(&seen);
    let mut observers = Observers::new()
        .with_metric(IncrementNorm)
        .with_metric(ErrorEstimateNorm)
        .with_metric(FnMetric::new("t", |ctx: &StepContext<'_>| ctx.solution().t))
        .with_callback(FnCallback::new("log", move |ctx: &StepContext<'_>| {
            log.borrow_mut()
                .push((ctx.iteration, ctx.previous.t, ctx.solution().t));
        }));
    assert_eq!(observers.metric_names(), ["increment_norm", "error_estimate", "t"]);

    let config = RunConfig::new(0.0).with_step_size(0.25).with_num_steps(4);
    let run = constant_h_loop(&growth(), &mut ForwardEuler, &one(), &config, &mut observers)
        .expect("run");

    assert_eq!(run.metrics.len(), 4);
    for (i, record) in run.metrics.iter().enumerate() {
        assert_eq!(record.iteration, i);
        assert_eq!(record.values.len(), 3);
        assert_eq!(record.get("t"), Some(run.results[i].t));
    }

    // callbacks see the committed state next to the attempted one
    let seen = seen.borrow();
    assert_eq!(seen.len(), 4);
    for (i, (iteration, previous, updated)) in seen.iter().enumerate() {
        assert_eq!(*iteration, i);
        assert!((updated - previous - 0.25).abs() < 1e-15);
    }
}

#[test]
fn dopri5_with_error_control_tracks_the_exact_solution() {
    let mut method = EmbeddedRungeKutta::dormand_prince().expect("builtin");
    let mut controller = ErrorController::new(
        ErrorControllerConfig {
            atol: 1e-10,
            rtol: 1e-8,
            ..ErrorControllerConfig::default()
        },
        4,
    );
    let config = RunConfig::new(0.0).with_end(1.0).with_step_size(0.5);
    let run = dynamic_h_loop(
        &growth(),
        &mut method,
        &one(),
        &config,
        &mut controller,
        &mut Observers::new(),
    )
    .expect("run");

    let last = run.final_state().expect("non-empty");
    assert_eq!(last.t, 1.0);
    assert!((last.y[0] - std::f64::consts::E).abs() < 1e-6);
    assert_eq!(run.metrics.len(), run.n_accept() + run.n_reject());
    assert_eq!(run.results.len(), run.n_accept());
    assert!(run.results.windows(2).all(|w| w[0].t < w[1].t));
}

#[test]
fn rejections_do_not_disturb_multistep_history() {
    let build = || {
        ExplicitMultiStep::new(
            Box::new(ExplicitRungeKutta::rk4()),
            MultiStepCoefficients::adams_bashforth3(),
        )
        .expect("valid coefficients")
    };
    let config = RunConfig::new(0.0).with_end(1.0).with_step_size(0.1);

    let smooth = dynamic_h_loop(
        &growth(),
        &mut build(),
        &one(),
        &config,
        &mut FixedController,
        &mut Observers::new(),
    )
    .expect("run");
    let bumpy = dynamic_h_loop(
        &growth(),
        &mut build(),
        &one(),
        &config,
        &mut RejectEveryOther { calls: 0 },
        &mut Observers::new(),
    )
    .expect("run");

    assert_eq!(bumpy.n_reject(), bumpy.n_accept());
    assert_eq!(smooth.results, bumpy.results);
}

#[test]
fn replayed_startup_states_keep_their_own_time() {
    let mut method = ExplicitMultiStep::new(
        Box::new(ExplicitRungeKutta::rk4()),
        MultiStepCoefficients::adams_bashforth3(),
    )
    .expect("valid coefficients");
    // 0.15 is not a whole number of 0.1 steps, so the second attempt is
    // clamped to 0.05 while the history still replays the 0.2 state
    let config = RunConfig::new(0.0).with_end(0.15).with_step_size(0.1);
    let run = dynamic_h_loop(
        &growth(),
        &mut method,
        &one(),
        &config,
        &mut FixedController,
        &mut Observers::new(),
    )
    .expect("run");

    let times: Vec<f64> = run.results.iter().map(|s| s.t).collect();
    assert_eq!(times.len(), 2, "{times:?}");
    assert!((times[0] - 0.1).abs() < 1e-12);
    assert!((times[1] - 0.2).abs() < 1e-12);
    for state in &run.results {
        assert!(
            (state.y[0] - state.t.exp()).abs() < 1e-6,
            "y({}) = {} but exp gives {}",
            state.t,
            state.y[0],
            state.t.exp()
        );
    }
}

#[test]
fn the_error_controller_needs_an_embedded_method() {
    let config = RunConfig::new(0.0).with_end(1.0);
    let err = dynamic_h_loop(
        &growth(),
        &mut ImplicitRungeKutta::gauss_legendre4(),
        &one(),
        &config,
        &mut ErrorController::new(ErrorControllerConfig::default(), 1),
        &mut Observers::new(),
    )
    .unwrap_err();
    assert!(matches!(err, SimError::MissingEstimate { .. }));
}

#[test]
fn misconfigured_runs_fail_before_stepping() {
    let calls = Rc::new(RefCell::new(0usize));
    let counter = Rc::clone(&calls);
    let mut observers = Observers::new().with_callback(FnCallback::new("count", move |_| {
        *counter.borrow_mut() += 1;
    }));
    let config = RunConfig::new(1.0).with_end(0.0).with_step_size(0.1);
    let err = constant_h_loop(&growth(), &mut ForwardEuler, &one(), &config, &mut observers)
        .unwrap_err();
    assert!(matches!(err, SimError::InvalidConfig { .. }));
    assert_eq!(*calls.borrow(), 0);
}

#[test]
fn a_method_is_reusable_across_runs() {
    let mut method = ExplicitMultiStep::new(
        Box::new(ExplicitRungeKutta::rk4()),
        MultiStepCoefficients::adams_bashforth2(),
    )
    .expect("valid coefficients");
    let config = RunConfig::new(0.0).with_end(0.5).with_num_steps(5);

    let first = constant_h_loop(&growth(), &mut method, &one(), &config, &mut Observers::new())
        .expect("run");
    let second = constant_h_loop(&growth(), &mut method, &one(), &config, &mut Observers::new())
        .expect("run");
    assert_eq!(first, second);
    assert_eq!(method.name(), "ab2");
}

proptest! {
    #[test]
    fn constant_loop_runs_exactly_num_steps(
        start in -5.0f64..5.0,
        h in 1e-3f64..0.5,
        n in 1usize..50,
    ) {
        let config = RunConfig::new(start).with_step_size(h).with_num_steps(n);
        let run = constant_h_loop(&growth(), &mut ForwardEuler, &one(), &config, &mut Observers::new())
            .unwrap();
        prop_assert_eq!(run.results.len(), n);
        prop_assert_eq!(run.metrics.len(), n);
        let last = run.final_state().unwrap();
        prop_assert!((last.t - (start + h * n as f64)).abs() < 1e-9);
    }

    #[test]
    fn adaptive_loop_never_passes_end(
        end in 0.05f64..3.0,
        h in 0.01f64..1.0,
    ) {
        let config = RunConfig::new(0.0).with_end(end).with_step_size(h);
        let run = dynamic_h_loop(
            &growth(),
            &mut ForwardEuler,
            &one(),
            &config,
            &mut FixedController,
            &mut Observers::new(),
        )
        .unwrap();
        prop_assert!(run.results.iter().all(|s| s.t <= end));
        prop_assert_eq!(run.final_state().unwrap().t, end);
    }
}
