//! Run execution and caching service.

use std::path::Path;
use std::time::Instant;

use nalgebra::DVector;
use oe_core::OdeModel;
use oe_results::{
    LoopKind, MetricRecord, ResultRecord, RunManifest, RunStore, column_names, compute_run_id,
    timestamp_now,
};
use oe_sim::{
    ErrorController, FixedController, Observers, Run, StepsizeController, TraceCallback,
    constant_h_loop, dynamic_h_loop,
};
use oe_step::StepFunction;

use crate::catalog::build_model;
use crate::error::{AppError, AppResult};
use crate::methods::build_method;
use crate::metrics::build_metric;
use crate::schema::{ControllerKind, LoopKindDef, RunFile};
use crate::validate::validate_run_file;

/// Version mixed into every run id, so a new release never reuses results
/// computed by an older one.
pub const SOLVER_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Options for running simulations.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub use_cache: bool,
    pub solver_version: String,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            use_cache: true,
            solver_version: SOLVER_VERSION.to_string(),
        }
    }
}

/// Request to execute a run file and store its results under `out_dir`.
#[derive(Debug, Clone)]
pub struct RunRequest<'a> {
    pub run_file: &'a Path,
    pub out_dir: &'a Path,
    pub options: RunOptions,
}

/// Response from a run execution.
#[derive(Debug, Clone)]
pub struct RunResponse {
    pub run_id: String,
    pub manifest: RunManifest,
    pub loaded_from_cache: bool,
    pub elapsed_s: f64,
}

/// A finished run together with what the manifest records about it.
#[derive(Debug)]
pub struct ExecutedRun {
    pub run: Run,
    pub loop_kind: LoopKind,
    pub metric_names: Vec<String>,
    pub callback_names: Vec<String>,
    pub indep_name: String,
    pub variable_names: Vec<String>,
}

/// Load a run file from YAML.
pub fn load_run_file(path: &Path) -> AppResult<RunFile> {
    let content = std::fs::read_to_string(path).map_err(|e| AppError::RunFileRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    serde_yaml::from_str(&content).map_err(|e| AppError::RunFileParse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Validate a run file and integrate it without touching the store.
pub fn execute(run_file: &RunFile) -> AppResult<ExecutedRun> {
    validate_run_file(run_file)?;

    let model = build_model(&run_file.model.builtin, &run_file.model.args)?;
    let y0 = DVector::from_column_slice(&run_file.model.initial);
    let mut method = build_method(&run_file.method)?;

    let mut observers = Observers::new();
    for name in &run_file.metrics {
        observers.push_metric(build_metric(name)?);
    }
    if run_file.trace {
        observers.push_callback(Box::new(TraceCallback));
    }

    let config = run_file.integration.run_config();
    tracing::info!(
        model = model.name(),
        method = method.step.name(),
        start = config.start,
        "starting run"
    );

    let (run, loop_kind) = match run_file.integration.kind {
        LoopKindDef::Fixed => {
            let run =
                constant_h_loop(&model, method.step.as_mut(), &y0, &config, &mut observers)?;
            (run, LoopKind::Fixed)
        }
        LoopKindDef::Adaptive => {
            let def = run_file.controller.clone().unwrap_or_default();
            let mut controller: Box<dyn StepsizeController> = match def.kind {
                ControllerKind::Error => Box::new(ErrorController::new(
                    def.error_config(),
                    method.estimate_order.unwrap_or(1),
                )),
                ControllerKind::Fixed => Box::new(FixedController),
            };
            let run = dynamic_h_loop(
                &model,
                method.step.as_mut(),
                &y0,
                &config,
                controller.as_mut(),
                &mut observers,
            )?;
            let loop_kind = LoopKind::Adaptive {
                controller: controller.name().to_string(),
            };
            (run, loop_kind)
        }
    };

    tracing::info!(
        accepted = run.n_accept(),
        rejected = run.n_reject(),
        "run finished"
    );

    Ok(ExecutedRun {
        run,
        loop_kind,
        metric_names: observers.metric_names(),
        callback_names: observers.callback_names(),
        indep_name: model.indep_name().to_string(),
        variable_names: model.variable_names().to_vec(),
    })
}

/// Execute a run file, or load its results when an identical run is stored.
pub fn ensure_run(request: &RunRequest) -> AppResult<RunResponse> {
    let started = Instant::now();

    let run_file = load_run_file(request.run_file)?;
    let run_id = compute_run_id(&run_file, &request.options.solver_version)?;
    let store = RunStore::new(request.out_dir.to_path_buf())?;

    if request.options.use_cache && store.has_run(&run_id) {
        tracing::info!(run_id = %run_id, "loading cached run");
        let manifest = store.load_manifest(&run_id)?;
        return Ok(RunResponse {
            run_id,
            manifest,
            loaded_from_cache: true,
            elapsed_s: started.elapsed().as_secs_f64(),
        });
    }

    let executed = execute(&run_file)?;
    let manifest = RunManifest {
        run_id: run_id.clone(),
        model: run_file.model.builtin.clone(),
        method: run_file.method.name.clone(),
        loop_kind: executed.loop_kind,
        timestamp: timestamp_now(),
        solver_version: request.options.solver_version.clone(),
        indep_name: executed.indep_name,
        column_names: column_names(&executed.variable_names, run_file.model.initial.len()),
        variable_names: executed.variable_names,
        metric_names: executed.metric_names,
        callback_names: executed.callback_names,
        config: executed.run.config.clone(),
        n_results: executed.run.results.len(),
    };
    let results: Vec<ResultRecord> =
        executed.run.results.iter().map(ResultRecord::from).collect();

    store.save_run(&manifest, &results, &executed.run.metrics)?;
    tracing::info!(run_id = %run_id, results = results.len(), "run saved");

    Ok(RunResponse {
        run_id,
        manifest,
        loaded_from_cache: false,
        elapsed_s: started.elapsed().as_secs_f64(),
    })
}

/// List stored runs, optionally filtered by model.
pub fn list_runs(out_dir: &Path, model: Option<&str>) -> AppResult<Vec<RunManifest>> {
    let store = RunStore::new(out_dir.to_path_buf())?;
    Ok(store.list_runs(model)?)
}

/// Load a stored run: its manifest, committed states and metric log.
pub fn load_run(
    out_dir: &Path,
    run_id: &str,
) -> AppResult<(RunManifest, Vec<ResultRecord>, Vec<MetricRecord>)> {
    let store = RunStore::new(out_dir.to_path_buf())?;
    let manifest = store.load_manifest(run_id)?;
    let results = store.load_results(run_id)?;
    let metrics = store.load_metrics(run_id)?;
    Ok((manifest, results, metrics))
}

/// Write the committed states of a stored run as CSV.
pub fn export_csv(out_dir: &Path, run_id: &str, path: &Path) -> AppResult<()> {
    let store = RunStore::new(out_dir.to_path_buf())?;
    Ok(store.export_csv(run_id, path)?)
}
