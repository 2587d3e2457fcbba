use anyhow::Result;
use tracing::info;

use crate::model::{EvaluationRun, GroundTruth, MetricDefinitions, Project, Release, Workflow};
use crate::repository::{Dataset, LatestRunEntry, flatten_latest_runs};

mod endpoints;
mod http;
mod snapshot;

pub use endpoints::{DEFAULT_API_URL, DEFAULT_DATA_URL, Endpoints};
pub use http::HttpSource;
pub use snapshot::SnapshotSource;

/// Where evaluation payloads come from. Implementations decode and type the
/// payloads; they do not interpret them.
pub trait DataSource {
    fn describe(&self) -> String;
    fn ground_truth(&self) -> Result<Vec<GroundTruth>>;
    fn workflows(&self) -> Result<Vec<Workflow>>;
    fn runs(&self) -> Result<Vec<EvaluationRun>>;
    /// Latest runs as delivered, possibly wrapped one level deep.
    fn latest_runs(&self) -> Result<Vec<LatestRunEntry>>;
    fn projects(&self) -> Result<Vec<Project>>;
    fn releases(&self) -> Result<Vec<Release>>;
    fn metric_definitions(&self) -> Result<MetricDefinitions>;
}

pub fn load_dataset(source: &dyn DataSource) -> Result<Dataset> {
    info!(source = %source.describe(), "loading evaluation data");

    let gt = source.ground_truth()?;
    let workflows = source.workflows()?;
    let runs = source.runs()?;
    let latest_runs = flatten_latest_runs(source.latest_runs()?);
    let projects = source.projects()?;
    let releases = source.releases()?;
    let metric_definitions = source.metric_definitions()?;

    info!(
        gt = gt.len(),
        workflows = workflows.len(),
        runs = runs.len(),
        latest_runs = latest_runs.len(),
        projects = projects.len(),
        releases = releases.len(),
        metric_definitions = metric_definitions.len(),
        "loaded evaluation data"
    );

    Ok(Dataset {
        gt,
        workflows,
        runs,
        latest_runs,
        projects,
        releases,
        metric_definitions,
    })
}
