//! Run storage API.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::types::{MetricRecord, ResultRecord, RunManifest};
use crate::{ResultsError, ResultsResult};

const MANIFEST: &str = "manifest.json";
const RESULTS: &str = "results.jsonl";
const METRICS: &str = "metrics.jsonl";

#[derive(Clone, Debug)]
pub struct RunStore {
    root_dir: PathBuf,
}

impl RunStore {
    pub fn new(root_dir: PathBuf) -> ResultsResult<Self> {
        if !root_dir.exists() {
            fs::create_dir_all(&root_dir)?;
        }
        Ok(Self { root_dir })
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    fn run_dir(&self, run_id: &str) -> PathBuf {
        self.root_dir.join(run_id)
    }

    pub fn has_run(&self, run_id: &str) -> bool {
        self.run_dir(run_id).join(MANIFEST).exists()
    }

    pub fn save_run(
        &self,
        manifest: &RunManifest,
        results: &[ResultRecord],
        metrics: &[MetricRecord],
    ) -> ResultsResult<()> {
        let run_dir = self.run_dir(&manifest.run_id);
        fs::create_dir_all(&run_dir)?;

        let manifest_json = serde_json::to_string_pretty(manifest)?;
        fs::write(run_dir.join(MANIFEST), manifest_json)?;

        write_lines(&run_dir.join(RESULTS), results)?;
        write_lines(&run_dir.join(METRICS), metrics)?;

        Ok(())
    }

    fn existing_file(&self, run_id: &str, name: &str) -> ResultsResult<PathBuf> {
        let path = self.run_dir(run_id).join(name);
        if !path.exists() {
            return Err(ResultsError::RunNotFound {
                run_id: run_id.to_string(),
            });
        }
        Ok(path)
    }

    pub fn load_manifest(&self, run_id: &str) -> ResultsResult<RunManifest> {
        let path = self.existing_file(run_id, MANIFEST)?;
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn load_results(&self, run_id: &str) -> ResultsResult<Vec<ResultRecord>> {
        read_lines(&self.existing_file(run_id, RESULTS)?, RESULTS)
    }

    pub fn load_metrics(&self, run_id: &str) -> ResultsResult<Vec<MetricRecord>> {
        read_lines(&self.existing_file(run_id, METRICS)?, METRICS)
    }

    /// Manifests of every stored run, most recent first. With `model` set only
    /// runs of that model are returned.
    pub fn list_runs(&self, model: Option<&str>) -> ResultsResult<Vec<RunManifest>> {
        let mut runs = Vec::new();

        if !self.root_dir.exists() {
            return Ok(runs);
        }

        for entry in fs::read_dir(&self.root_dir)? {
            let entry = entry?;
            if !entry.path().is_dir() {
                continue;
            }
            let run_id = entry.file_name().to_string_lossy().to_string();
            if let Ok(manifest) = self.load_manifest(&run_id) {
                if model.is_none_or(|m| manifest.model == m) {
                    runs.push(manifest);
                }
            }
        }

        runs.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(runs)
    }

    pub fn delete_run(&self, run_id: &str) -> ResultsResult<()> {
        let run_dir = self.run_dir(run_id);
        if run_dir.exists() {
            fs::remove_dir_all(run_dir)?;
        }
        Ok(())
    }

    /// Write the committed states of a run as CSV, independent variable first.
    pub fn export_csv(&self, run_id: &str, path: &Path) -> ResultsResult<()> {
        let manifest = self.load_manifest(run_id)?;
        let results = self.load_results(run_id)?;

        let mut out = String::new();
        out.push_str(&manifest.indep_name);
        for column in &manifest.column_names {
            out.push(',');
            out.push_str(column);
        }
        out.push('\n');
        for record in &results {
            // writing into a String cannot fail
            let _ = write!(out, "{}", record.t);
            for value in &record.y {
                let _ = write!(out, ",{value}");
            }
            out.push('\n');
        }

        fs::write(path, out)?;
        Ok(())
    }
}

fn write_lines<T: Serialize>(path: &Path, records: &[T]) -> ResultsResult<()> {
    let mut content = String::new();
    for record in records {
        let line = serde_json::to_string(record)?;
        content.push_str(&line);
        content.push('\n');
    }
    fs::write(path, content)?;
    Ok(())
}

fn read_lines<T: DeserializeOwned>(path: &Path, file: &'static str) -> ResultsResult<Vec<T>> {
    let content = fs::read_to_string(path)?;
    let mut records = Vec::new();
    for (idx, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let record = serde_json::from_str(line).map_err(|source| ResultsError::MalformedLine {
            file,
            line: idx + 1,
            source,
        })?;
        records.push(record);
    }
    Ok(records)
}
