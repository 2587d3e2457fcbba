use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::de::DeserializeOwned;
use tracing::warn;

use super::DataSource;
use crate::model::{EvaluationRun, GroundTruth, MetricDefinitions, Project, Release, Workflow};
use crate::repository::{LatestRunEntry, derive_latest_runs};

pub const GT_FILE: &str = "gt.json";
pub const WORKFLOWS_FILE: &str = "workflows.json";
pub const RUNS_FILE: &str = "runs.json";
pub const LATEST_RUNS_FILE: &str = "runs_latest.json";
pub const PROJECTS_FILE: &str = "repos.json";
pub const RELEASES_FILE: &str = "ocrd_all_releases.json";
pub const METRIC_DEFINITIONS_FILE: &str = "metrics_definitions.json";

/// Reads API payloads saved as JSON files in one directory.
pub struct SnapshotSource {
    root: PathBuf,
}

impl SnapshotSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn required<T: DeserializeOwned>(&self, name: &str) -> Result<T> {
        let path = self.root.join(name);
        if !path.exists() {
            bail!("snapshot file missing: {}", path.display());
        }
        read_json(&path)
    }

    fn optional<T: DeserializeOwned + Default>(&self, name: &str) -> Result<T> {
        let path = self.root.join(name);
        if !path.exists() {
            warn!(path = %path.display(), "snapshot file missing, using empty catalog");
            return Ok(T::default());
        }
        read_json(&path)
    }
}

impl DataSource for SnapshotSource {
    fn describe(&self) -> String {
        self.root.display().to_string()
    }

    fn ground_truth(&self) -> Result<Vec<GroundTruth>> {
        self.required(GT_FILE)
    }

    fn workflows(&self) -> Result<Vec<Workflow>> {
        self.required(WORKFLOWS_FILE)
    }

    fn runs(&self) -> Result<Vec<EvaluationRun>> {
        self.required(RUNS_FILE)
    }

    fn latest_runs(&self) -> Result<Vec<LatestRunEntry>> {
        let path = self.root.join(LATEST_RUNS_FILE);
        if path.exists() {
            return read_json(&path);
        }

        warn!(path = %path.display(), "latest runs missing, deriving from all runs");
        let runs = self.runs()?;
        Ok(derive_latest_runs(&runs)
            .into_iter()
            .map(|run| LatestRunEntry::Run(Box::new(run)))
            .collect())
    }

    fn projects(&self) -> Result<Vec<Project>> {
        self.optional(PROJECTS_FILE)
    }

    fn releases(&self) -> Result<Vec<Release>> {
        self.optional(RELEASES_FILE)
    }

    fn metric_definitions(&self) -> Result<MetricDefinitions> {
        self.optional(METRIC_DEFINITIONS_FILE)
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_slice(&raw).with_context(|| format!("failed to parse {}", path.display()))
}
