use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use oe_app::{
    AppResult, METHODS, METRIC_NAMES, MODELS, MethodFamily, RunOptions, RunRequest, query,
    run_service, validate,
};

#[derive(Parser)]
#[command(name = "oe-cli")]
#[command(about = "odexplorer CLI - integrate ODE run files and inspect stored runs", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List available step functions
    Methods,
    /// List builtin models with their arguments
    Models,
    /// Validate a run file without integrating it
    Validate {
        /// Path to the run YAML file
        run_file: PathBuf,
    },
    /// Integrate a run file and store the results
    Run {
        /// Path to the run YAML file
        run_file: PathBuf,
        /// Results directory
        #[arg(short, long, default_value = "runs")]
        out: PathBuf,
        /// Skip cache and force re-run
        #[arg(long)]
        no_cache: bool,
    },
    /// List stored runs
    Runs {
        /// Results directory
        #[arg(default_value = "runs")]
        out: PathBuf,
        /// Only list runs of this model
        #[arg(long)]
        model: Option<String>,
    },
    /// Show details of a stored run
    ShowRun {
        /// Run ID to display
        run_id: String,
        /// Results directory
        #[arg(short, long, default_value = "runs")]
        out: PathBuf,
    },
    /// Export the states of a stored run as CSV
    Export {
        /// Run ID
        run_id: String,
        /// Output CSV file path
        output: PathBuf,
        /// Results directory
        #[arg(long, default_value = "runs")]
        out: PathBuf,
    },
}

fn main() -> AppResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Methods => {
            cmd_methods();
            Ok(())
        }
        Commands::Models => {
            cmd_models();
            Ok(())
        }
        Commands::Validate { run_file } => cmd_validate(&run_file),
        Commands::Run {
            run_file,
            out,
            no_cache,
        } => cmd_run(&run_file, &out, !no_cache),
        Commands::Runs { out, model } => cmd_runs(&out, model.as_deref()),
        Commands::ShowRun { run_id, out } => cmd_show_run(&out, &run_id),
        Commands::Export {
            run_id,
            output,
            out,
        } => cmd_export(&out, &run_id, &output),
    }
}

fn cmd_methods() {
    println!("{:<18} {:<12} {:>5}  implicit", "name", "family", "order");
    for m in METHODS {
        let family = match m.family {
            MethodFamily::SingleStep => "single-step",
            MethodFamily::Embedded => "embedded",
            MethodFamily::MultiStep => "multi-step",
        };
        println!(
            "{:<18} {:<12} {:>5}  {}",
            m.name,
            family,
            m.order,
            if m.implicit { "yes" } else { "no" }
        );
    }
    println!("\nMetrics: {}", METRIC_NAMES.join(", "));
}

fn cmd_models() {
    for m in MODELS {
        let args: Vec<String> = m.args.iter().map(|(n, v)| format!("{n}={v}")).collect();
        println!("{}", m.name);
        println!("  {}", m.equation);
        println!("  variables: {}", m.variables.join(", "));
        println!("  args: {}", args.join(", "));
    }
}

fn cmd_validate(run_file: &Path) -> AppResult<()> {
    println!("Validating run file: {}", run_file.display());
    let run = run_service::load_run_file(run_file)?;
    validate::validate_run_file(&run)?;
    println!("✓ Run file is valid");
    Ok(())
}

fn cmd_run(run_file: &Path, out: &Path, use_cache: bool) -> AppResult<()> {
    println!("Running: {}", run_file.display());

    let request = RunRequest {
        run_file,
        out_dir: out,
        options: RunOptions {
            use_cache,
            ..RunOptions::default()
        },
    };
    let response = run_service::ensure_run(&request)?;

    if response.loaded_from_cache {
        println!("✓ Loaded from cache: {}", response.run_id);
    } else {
        println!("✓ Run completed: {}", response.run_id);
    }
    println!("  Elapsed: {:.3}s", response.elapsed_s);

    print_summary(out, &response.run_id)
}

fn cmd_runs(out: &Path, model: Option<&str>) -> AppResult<()> {
    let runs = run_service::list_runs(out, model)?;

    if runs.is_empty() {
        println!("No stored runs in {}", out.display());
    } else {
        println!("Stored runs:");
        for run in runs {
            println!(
                "  {} - {} / {} ({} states, {})",
                run.run_id, run.model, run.method, run.n_results, run.timestamp
            );
        }
    }
    Ok(())
}

fn cmd_show_run(out: &Path, run_id: &str) -> AppResult<()> {
    let (manifest, _, _) = run_service::load_run(out, run_id)?;

    println!("Run: {}", manifest.run_id);
    println!("  Model: {}", manifest.model);
    println!("  Method: {}", manifest.method);
    println!("  Loop: {:?}", manifest.loop_kind);
    println!("  Timestamp: {}", manifest.timestamp);
    println!("  Solver version: {}", manifest.solver_version);
    println!(
        "  Columns: {}, {}",
        manifest.indep_name,
        manifest.column_names.join(", ")
    );
    if !manifest.metric_names.is_empty() {
        println!("  Metrics: {}", manifest.metric_names.join(", "));
    }

    print_summary(out, run_id)
}

fn cmd_export(out: &Path, run_id: &str, output: &Path) -> AppResult<()> {
    run_service::export_csv(out, run_id, output)?;
    println!("✓ Exported {} to {}", run_id, output.display());
    Ok(())
}

fn print_summary(out: &Path, run_id: &str) -> AppResult<()> {
    let (_manifest, results, metrics) = run_service::load_run(out, run_id)?;
    if results.is_empty() {
        println!("  No states committed");
        return Ok(());
    }
    let summary = query::get_run_summary(&results, &metrics)?;
    println!(
        "  Range: {:.6} .. {:.6}",
        summary.range.0, summary.range.1
    );
    println!("  States: {}", summary.record_count);
    println!(
        "  Steps: {} accepted, {} rejected",
        summary.accepted, summary.rejected
    );
    println!(
        "  Step size: {:.3e} .. {:.3e}",
        summary.min_step, summary.max_step
    );
    if let Some(last) = results.last() {
        let values: Vec<String> = last.y.iter().map(|v| format!("{v:.6e}")).collect();
        println!("  Final state: [{}]", values.join(", "));
    }
    Ok(())
}
