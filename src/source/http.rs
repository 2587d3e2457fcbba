use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::blocking::Client;
use serde::de::DeserializeOwned;
use tracing::debug;

use super::{DataSource, Endpoints};
use crate::model::{EvaluationRun, GroundTruth, MetricDefinitions, Project, Release, Workflow};
use crate::repository::LatestRunEntry;

/// Fetches payloads over HTTP GET. One attempt per payload, no retries.
pub struct HttpSource {
    client: Client,
    endpoints: Endpoints,
}

impl HttpSource {
    pub fn new(endpoints: Endpoints, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("quiver-eval/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("failed to build http client")?;

        Ok(Self { client, endpoints })
    }

    fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        debug!(url = %url, "GET");
        self.client
            .get(url)
            .send()
            .with_context(|| format!("request failed: {url}"))?
            .error_for_status()
            .with_context(|| format!("unexpected response status: {url}"))?
            .json::<T>()
            .with_context(|| format!("failed to decode json response: {url}"))
    }
}

impl DataSource for HttpSource {
    fn describe(&self) -> String {
        self.endpoints.api_url().to_string()
    }

    fn ground_truth(&self) -> Result<Vec<GroundTruth>> {
        self.get_json(&self.endpoints.ground_truth())
    }

    fn workflows(&self) -> Result<Vec<Workflow>> {
        self.get_json(&self.endpoints.workflows())
    }

    fn runs(&self) -> Result<Vec<EvaluationRun>> {
        self.get_json(&self.endpoints.runs(None, None))
    }

    fn latest_runs(&self) -> Result<Vec<LatestRunEntry>> {
        self.get_json(&self.endpoints.latest_runs(None, None))
    }

    fn projects(&self) -> Result<Vec<Project>> {
        self.get_json(&self.endpoints.projects())
    }

    fn releases(&self) -> Result<Vec<Release>> {
        self.get_json(&self.endpoints.releases())
    }

    fn metric_definitions(&self) -> Result<MetricDefinitions> {
        self.get_json(&self.endpoints.metric_definitions())
    }
}
