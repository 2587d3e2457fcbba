use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use anyhow::{Result, bail};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::identity::{CanonicalId, normalize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroundTruth {
    pub id: String,
    pub label: String,
    pub metadata: GroundTruthMetadata,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroundTruthMetadata {
    pub time: TimeSpan,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub language: Vec<String>,
    #[serde(default)]
    pub script: Vec<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSpan {
    #[serde(rename = "notBefore")]
    pub not_before: String,
    #[serde(rename = "notAfter")]
    pub not_after: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workflow {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub steps: Vec<WorkflowStep>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowStep {
    pub id: String,
    #[serde(default)]
    pub params: BTreeMap<String, StepParam>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StepParam {
    Number(f64),
    Text(String),
}

impl fmt::Display for StepParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(value) => write!(f, "{value}"),
            Self::Text(value) => f.write_str(value),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workspace {
    pub id: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationRun {
    pub eval_workflow_id: String,
    pub label: String,
    pub evaluation_results: EvaluationResults,
    pub metadata: EvaluationRunMetadata,
}

impl EvaluationRun {
    /// Grouping identity of a run: normalized ground-truth and workflow ids.
    pub fn run_key(&self) -> (CanonicalId, CanonicalId) {
        (self.gt_id(), self.workflow_id())
    }

    pub fn gt_id(&self) -> CanonicalId {
        normalize(&self.metadata.gt_workspace.id)
    }

    pub fn workflow_id(&self) -> CanonicalId {
        normalize(&self.metadata.ocr_workflow.id)
    }

    /// Parsed `timestamp`. Offsets are converted to UTC; naive timestamps are taken as UTC.
    pub fn recorded_at(&self) -> Option<DateTime<Utc>> {
        let raw = self.metadata.timestamp.trim();
        if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
            return Some(parsed.with_timezone(&Utc));
        }

        ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
            .iter()
            .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
            .map(|naive| naive.and_utc())
    }

    pub fn metric(&self, metric: MetricName) -> Option<f64> {
        self.evaluation_results.document_wide.get(metric)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResults {
    #[serde(default)]
    pub by_page: Vec<PageResult>,
    pub document_wide: DocumentWideResults,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageResult {
    pub page_id: String,
    pub cer: Option<f64>,
    pub wer: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentWideResults {
    #[serde(default)]
    pub cer_mean: Option<f64>,
    #[serde(default)]
    pub cer_median: Option<f64>,
    #[serde(default)]
    pub cer_range: Option<Vec<Option<f64>>>,
    #[serde(default)]
    pub cer: Option<f64>,
    #[serde(default)]
    pub cer_standard_deviation: Option<f64>,
    #[serde(default)]
    pub cpu_time: Option<f64>,
    #[serde(default)]
    pub pages_per_minute: Option<f64>,
    #[serde(default)]
    pub wall_time: Option<f64>,
    #[serde(default)]
    pub wer: Option<f64>,
}

impl DocumentWideResults {
    pub fn get(&self, metric: MetricName) -> Option<f64> {
        match metric {
            MetricName::CerMean => self.cer_mean,
            MetricName::CerMedian => self.cer_median,
            MetricName::Cer => self.cer,
            MetricName::CerStandardDeviation => self.cer_standard_deviation,
            MetricName::CpuTime => self.cpu_time,
            MetricName::PagesPerMinute => self.pages_per_minute,
            MetricName::WallTime => self.wall_time,
            MetricName::Wer => self.wer,
        }
    }
}

/// Scalar document-wide metrics. `cer_range` is deliberately absent: ranges are not averaged.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MetricName {
    CerMean,
    CerMedian,
    Cer,
    CerStandardDeviation,
    CpuTime,
    PagesPerMinute,
    WallTime,
    Wer,
}

impl MetricName {
    pub const ALL: [Self; 8] = [
        Self::CerMean,
        Self::CerMedian,
        Self::Cer,
        Self::CerStandardDeviation,
        Self::CpuTime,
        Self::PagesPerMinute,
        Self::WallTime,
        Self::Wer,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::CerMean => "cer_mean",
            Self::CerMedian => "cer_median",
            Self::Cer => "cer",
            Self::CerStandardDeviation => "cer_standard_deviation",
            Self::CpuTime => "cpu_time",
            Self::PagesPerMinute => "pages_per_minute",
            Self::WallTime => "wall_time",
            Self::Wer => "wer",
        }
    }
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MetricName {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        let normalized = value.trim().to_ascii_lowercase();
        if let Some(metric) = Self::ALL
            .into_iter()
            .find(|metric| metric.as_str() == normalized)
        {
            return Ok(metric);
        }
        if normalized == "cer_range" {
            bail!("cer_range is a range metric and cannot be aggregated");
        }
        bail!("unknown document-wide metric: {value}")
    }
}

impl Serialize for MetricName {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationRunMetadata {
    pub gt_workspace: Workspace,
    pub ocr_workflow: Workflow,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ocr_workspace: Option<Workspace>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eval_workflow: Option<Workflow>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eval_workspace: Option<Workspace>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eval_tool: Option<String>,
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_info: Option<ReleaseInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflow_model: Option<String>,
    #[serde(default)]
    pub workflow_steps: Vec<WorkflowStep>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_metadata: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseInfo {
    pub id: u64,
    pub published_at: String,
    pub tag_name: String,
    pub html_url: String,
}

/// OCR-D processor repository as listed in `repos.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub org_plus_name: String,
    #[serde(default)]
    pub project_type: String,
    #[serde(default)]
    pub latest_version: String,
    #[serde(default)]
    pub official: bool,
    #[serde(default)]
    pub compliant_cli: bool,
    #[serde(default)]
    pub ocrd_tool_json_valid: bool,
    #[serde(default)]
    pub unreleased_changes: u32,
    #[serde(default)]
    pub dependencies: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Release {
    pub tag: String,
    #[serde(default)]
    pub projects: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricDefinition {
    pub label: String,
    #[serde(default)]
    pub short_descr: String,
    #[serde(default)]
    pub url: String,
}

pub type MetricDefinitions = BTreeMap<String, MetricDefinition>;
