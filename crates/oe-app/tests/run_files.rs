//! Run files driven end to end through the service layer.

use std::path::{Path, PathBuf};

use oe_app::schema::LoopKindDef;
use oe_app::*;
use oe_results::LoopKind;
use proptest::prelude::*;

fn scratch(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(name);
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).expect("create scratch dir");
    dir
}

fn write_run_file(dir: &Path, yaml: &str) -> PathBuf {
    let path = dir.join("run.yaml");
    std::fs::write(&path, yaml).expect("write run file");
    path
}

const DECAY: &str = r#"
name: decay
model:
  builtin: exponential
  args: { lambda: -0.5 }
  initial: [1.0]
method:
  name: ab3
  startup: rk4
integration:
  kind: fixed
  start: 0.0
  end: 2.0
  num_steps: 20
metrics: [increment_norm, time]
"#;

const OSCILLATOR: &str = r#"
model:
  builtin: harmonic
  args: { omega: 2.0 }
  initial: [1.0, 0.0]
method:
  name: dopri5
integration:
  kind: adaptive
  start: 0.0
  end: 3.0
  step_size: 0.1
controller:
  rtol: 1.0e-8
  atol: 1.0e-10
metrics: [error_estimate, step_size]
"#;

#[test]
fn fixed_run_is_stored_then_served_from_cache() {
    let dir = scratch("oe_app_fixed_run");
    let run_file = write_run_file(&dir, DECAY);
    let out_dir = dir.join("runs");
    let request = RunRequest {
        run_file: &run_file,
        out_dir: &out_dir,
        options: RunOptions::default(),
    };

    let first = ensure_run(&request).expect("run");
    assert!(!first.loaded_from_cache);
    assert_eq!(first.manifest.n_results, 20);
    assert_eq!(first.manifest.loop_kind, LoopKind::Fixed);
    assert_eq!(first.manifest.column_names, ["y"]);
    assert_eq!(first.manifest.metric_names, ["increment_norm", "time"]);

    let second = ensure_run(&request).expect("cached run");
    assert!(second.loaded_from_cache);
    assert_eq!(second.run_id, first.run_id);

    let (manifest, results, metrics) = load_run(&out_dir, &first.run_id).expect("load");
    assert_eq!(manifest, first.manifest);
    assert_eq!(results.len(), 20);
    assert_eq!(metrics.len(), 20);

    let last = results.last().expect("non-empty");
    assert!((last.t - 2.0).abs() < 1e-12);
    assert!((last.y[0] - (-1.0f64).exp()).abs() < 1e-4);

    let summary = get_run_summary(&results, &metrics).expect("summary");
    assert_eq!((summary.accepted, summary.rejected), (20, 0));
    let times = extract_metric_series(&metrics, "time").expect("time metric");
    assert!((times[19].1 - 2.0).abs() < 1e-12);

    assert_eq!(list_runs(&out_dir, Some("exponential")).expect("list").len(), 1);
    assert!(list_runs(&out_dir, Some("harmonic")).expect("list").is_empty());
}

#[test]
fn adaptive_run_lands_on_end_and_tracks_cosine() {
    let run_file: RunFile = serde_yaml::from_str(OSCILLATOR).expect("parse");
    assert_eq!(run_file.integration.kind, LoopKindDef::Adaptive);

    let executed = execute(&run_file).expect("run");
    assert_eq!(
        executed.loop_kind,
        LoopKind::Adaptive {
            controller: "error".to_string()
        }
    );
    let last = executed.run.final_state().expect("non-empty");
    assert_eq!(last.t, 3.0);
    assert!((last.y[0] - (6.0f64).cos()).abs() < 1e-6);
    assert!((last.y[1] + 2.0 * (6.0f64).sin()).abs() < 1e-5);
    assert_eq!(
        executed.run.metrics.len(),
        executed.run.n_accept() + executed.run.n_reject()
    );
    assert_eq!(executed.variable_names, ["x", "v"]);
}

#[test]
fn exported_csv_has_a_header_and_one_row_per_state() {
    let dir = scratch("oe_app_csv_export");
    let run_file = write_run_file(&dir, DECAY);
    let out_dir = dir.join("runs");
    let response = ensure_run(&RunRequest {
        run_file: &run_file,
        out_dir: &out_dir,
        options: RunOptions::default(),
    })
    .expect("run");

    let csv = dir.join("decay.csv");
    export_csv(&out_dir, &response.run_id, &csv).expect("export");
    let content = std::fs::read_to_string(csv).expect("read csv");
    let mut lines = content.lines();
    assert_eq!(lines.next(), Some("time,y"));
    assert_eq!(lines.count(), 20);
}

#[test]
fn invalid_files_report_every_violation() {
    let yaml = r#"
model:
  builtin: harmonic
  args: { stiffness: 3.0 }
  initial: [1.0]
method:
  name: rk4
integration:
  kind: adaptive
  start: 0.0
metrics: [energy]
"#;
    let run_file: RunFile = serde_yaml::from_str(yaml).expect("parse");
    match execute(&run_file).unwrap_err() {
        AppError::Validation { violations } => {
            assert_eq!(violations.len(), 5, "{violations:?}");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn unreadable_and_malformed_files_are_distinguished() {
    let dir = scratch("oe_app_bad_files");
    assert!(matches!(
        load_run_file(&dir.join("missing.yaml")),
        Err(AppError::RunFileRead { .. })
    ));
    let path = write_run_file(&dir, "model: [not, a, map]\n");
    assert!(matches!(
        load_run_file(&path),
        Err(AppError::RunFileParse { .. })
    ));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn implicit_multistep_runs_commit_every_step(n in 1usize..40, method in 0usize..3) {
        let name = ["bdf1", "bdf2", "bdf3"][method];
        let yaml = format!(
            "model: {{ builtin: logistic, args: {{ r: 2.0 }}, initial: [0.1] }}\n\
             method: {{ name: {name}, startup: backward-euler }}\n\
             integration: {{ kind: fixed, start: 0.0, step_size: 0.05, num_steps: {n} }}\n"
        );
        let run_file: RunFile = serde_yaml::from_str(&yaml).unwrap();
        let executed = execute(&run_file).unwrap();
        prop_assert_eq!(executed.run.results.len(), n);
        // logistic growth stays between the initial value and the capacity
        for state in &executed.run.results {
            prop_assert!(state.y[0] > 0.1 && state.y[0] < 1.0);
        }
    }
}
