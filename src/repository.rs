use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

use serde::Deserialize;

use crate::identity::{CanonicalId, normalize};
use crate::model::{
    EvaluationRun, GroundTruth, MetricDefinition, MetricDefinitions, MetricName, Project, Release,
    Workflow,
};

/// Everything fetched in one load cycle.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub gt: Vec<GroundTruth>,
    pub workflows: Vec<Workflow>,
    pub runs: Vec<EvaluationRun>,
    pub latest_runs: Vec<EvaluationRun>,
    pub projects: Vec<Project>,
    pub releases: Vec<Release>,
    pub metric_definitions: MetricDefinitions,
}

/// Element of the latest-runs payload. The backend wraps each run in a
/// single-element list; plain runs are accepted as well.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum LatestRunEntry {
    Run(Box<EvaluationRun>),
    Nested(Vec<EvaluationRun>),
}

/// Flattens the latest-runs payload by exactly one level, keeping order.
pub fn flatten_latest_runs(entries: Vec<LatestRunEntry>) -> Vec<EvaluationRun> {
    let mut runs = Vec::with_capacity(entries.len());
    for entry in entries {
        match entry {
            LatestRunEntry::Run(run) => runs.push(*run),
            LatestRunEntry::Nested(nested) => runs.extend(nested),
        }
    }
    runs
}

/// Picks the most recent run per (ground truth, workflow) pair.
///
/// Keys keep the position of their first appearance. On equal timestamps the
/// later-listed run wins. Runs with a parsable timestamp beat runs without one.
pub fn derive_latest_runs(runs: &[EvaluationRun]) -> Vec<EvaluationRun> {
    let mut order = Vec::<(CanonicalId, CanonicalId)>::new();
    let mut latest = HashMap::<(CanonicalId, CanonicalId), &EvaluationRun>::new();

    for run in runs {
        let key = run.run_key();
        match latest.get_mut(&key) {
            Some(current) => {
                if compare_recency(run, current) != Ordering::Less {
                    *current = run;
                }
            }
            None => {
                order.push(key.clone());
                latest.insert(key, run);
            }
        }
    }

    order
        .into_iter()
        .filter_map(|key| latest.remove(&key))
        .cloned()
        .collect()
}

fn compare_recency(left: &EvaluationRun, right: &EvaluationRun) -> Ordering {
    match (left.recorded_at(), right.recorded_at()) {
        (Some(left_at), Some(right_at)) => left_at.cmp(&right_at),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (None, None) => left.metadata.timestamp.cmp(&right.metadata.timestamp),
    }
}

/// Read side of the evaluation data. A load cycle is swapped in as a whole.
#[derive(Debug, Clone, Default)]
pub struct RunRepository {
    dataset: Arc<Dataset>,
}

impl From<Dataset> for RunRepository {
    fn from(dataset: Dataset) -> Self {
        Self {
            dataset: Arc::new(dataset),
        }
    }
}

impl RunRepository {
    /// Swaps in a new load cycle. Readers holding a snapshot keep the old one.
    pub fn replace(&mut self, dataset: Dataset) {
        self.dataset = Arc::new(dataset);
    }

    /// Consistent view of the current load cycle.
    pub fn snapshot(&self) -> Arc<Dataset> {
        Arc::clone(&self.dataset)
    }

    pub fn ground_truth(&self) -> &[GroundTruth] {
        &self.dataset.gt
    }

    pub fn workflows(&self) -> &[Workflow] {
        &self.dataset.workflows
    }

    pub fn runs(&self) -> &[EvaluationRun] {
        &self.dataset.runs
    }

    pub fn projects(&self) -> &[Project] {
        &self.dataset.projects
    }

    pub fn releases(&self) -> &[Release] {
        &self.dataset.releases
    }

    /// Runs on `gt_id`, optionally narrowed to `workflow_id`, in load order.
    /// Both run ids and query ids are compared in normalized form.
    pub fn get_runs(&self, gt_id: &str, workflow_id: Option<&str>) -> Vec<&EvaluationRun> {
        filter_runs(&self.dataset.runs, gt_id, workflow_id)
    }

    pub fn get_latest_runs(&self) -> &[EvaluationRun] {
        &self.dataset.latest_runs
    }

    pub fn get_latest_runs_for(
        &self,
        gt_id: &str,
        workflow_id: Option<&str>,
    ) -> Vec<&EvaluationRun> {
        filter_runs(&self.dataset.latest_runs, gt_id, workflow_id)
    }

    pub fn get_gt_by_id(&self, id: &str) -> Option<&GroundTruth> {
        self.dataset.gt.iter().find(|item| item.id == id)
    }

    pub fn get_workflow_by_id(&self, id: &str) -> Option<&Workflow> {
        self.dataset.workflows.iter().find(|item| item.id == id)
    }

    pub fn get_repo_by_id(&self, id: &str) -> Option<&Project> {
        self.dataset.projects.iter().find(|repo| repo.id == id)
    }

    pub fn metric_definition(&self, metric: MetricName) -> Option<&MetricDefinition> {
        self.dataset.metric_definitions.get(metric.as_str())
    }
}

fn filter_runs<'a>(
    runs: &'a [EvaluationRun],
    gt_id: &str,
    workflow_id: Option<&str>,
) -> Vec<&'a EvaluationRun> {
    let gt_id = normalize(gt_id);
    let workflow_id = workflow_id.map(normalize);

    runs.iter()
        .filter(|run| {
            let match_gt = run.gt_id() == gt_id;
            let match_workflow = workflow_id
                .as_ref()
                .is_none_or(|workflow_id| run.workflow_id() == *workflow_id);
            match_gt && match_workflow
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{Dataset, LatestRunEntry, RunRepository, derive_latest_runs, flatten_latest_runs};
    use crate::test_fixtures::{gt, repository_with, run, run_json, workflow};

    fn labels(runs: &[&crate::model::EvaluationRun]) -> Vec<String> {
        runs.iter().map(|run| run.label.clone()).collect()
    }

    #[test]
    fn get_runs_filters_by_gt_and_optional_workflow() {
        let repository = repository_with(
            vec![],
            vec![],
            vec![
                run("https://example.org/gt/gt_a.ocrd.zip", "wf_1", "2023-01-01T00:00:00", Some(0.1)),
                run("gt_b", "wf_1", "2023-01-01T00:00:00", Some(0.2)),
                run("gt_a", "https://example.org/wf/wf_2.txt", "2023-01-02T00:00:00", Some(0.3)),
                run("gt_a", "wf_1", "2023-01-03T00:00:00", Some(0.4)),
            ],
            vec![],
        );

        let by_gt = repository.get_runs("gt_a", None);
        assert_eq!(
            labels(&by_gt),
            vec![
                "wf_1 on https://example.org/gt/gt_a.ocrd.zip",
                "https://example.org/wf/wf_2.txt on gt_a",
                "wf_1 on gt_a",
            ]
        );

        let by_pair = repository.get_runs("gt_a", Some("wf_1"));
        assert_eq!(by_pair.len(), 2);
        assert!(by_pair.iter().all(|run| run.workflow_id() == "wf_1"));
        assert!(by_pair.iter().all(|item| by_gt.contains(item)));

        assert!(repository.get_runs("gt_unknown", None).is_empty());
        assert!(repository.get_runs("gt_a", Some("wf_unknown")).is_empty());
    }

    #[test]
    fn lookups_use_exact_ids_and_first_match() {
        let mut duplicate = gt("gt_a", "Second", "1900");
        duplicate.metadata.title = Some("duplicate".to_string());
        let repository = repository_with(
            vec![gt("gt_a", "First", "1850"), duplicate],
            vec![workflow("minimal_ocr", "Minimal OCR")],
            vec![],
            vec![],
        );

        assert_eq!(
            repository.get_gt_by_id("gt_a").map(|item| item.label.as_str()),
            Some("First")
        );
        assert!(repository.get_gt_by_id("https://example.org/gt_a.zip").is_none());
        assert_eq!(
            repository
                .get_workflow_by_id("minimal_ocr")
                .map(|item| item.label.as_str()),
            Some("Minimal OCR")
        );
        assert!(repository.get_workflow_by_id("minimal_ocr.txt").is_none());
        assert!(repository.get_repo_by_id("ocrd_tesserocr").is_none());
    }

    #[test]
    fn nested_latest_payload_flattens_to_flat_shape() {
        let runs = vec![
            run_json("gt_a", "wf_1", "2023-01-01T00:00:00", Some(0.1)),
            run_json("gt_b", "wf_1", "2023-01-01T00:00:00", Some(0.2)),
            run_json("gt_c", "wf_1", "2023-01-01T00:00:00", Some(0.3)),
        ];
        let nested: Vec<LatestRunEntry> =
            serde_json::from_value(json!(runs.iter().map(|item| json!([item])).collect::<Vec<_>>()))
                .expect("nested payload should parse");
        let flat: Vec<LatestRunEntry> =
            serde_json::from_value(json!(runs)).expect("flat payload should parse");

        let from_nested = flatten_latest_runs(nested);
        let from_flat = flatten_latest_runs(flat);

        assert_eq!(from_nested, from_flat);
        assert_eq!(
            from_nested
                .iter()
                .map(|item| item.gt_id().to_string())
                .collect::<Vec<_>>(),
            vec!["gt_a", "gt_b", "gt_c"]
        );
    }

    #[test]
    fn doubly_nested_latest_payload_is_rejected() {
        let payload = json!([[[run_json("gt_a", "wf_1", "2023-01-01T00:00:00", Some(0.1))]]]);
        let parsed = serde_json::from_value::<Vec<LatestRunEntry>>(payload);
        assert!(parsed.is_err());
    }

    #[test]
    fn derive_latest_runs_keeps_newest_run_per_pair() {
        let runs = vec![
            run("gt_a", "wf_1", "2023-01-01T00:00:00", Some(0.5)),
            run("gt_b", "wf_1", "2023-01-05T00:00:00", Some(0.2)),
            run("gt_a", "wf_1.txt", "2023-03-01T00:00:00", Some(0.1)),
            run("gt_a", "wf_1", "2023-02-01T00:00:00", Some(0.3)),
            run("gt_a", "wf_2", "not a date", Some(0.9)),
        ];

        let latest = derive_latest_runs(&runs);
        let summary = latest
            .iter()
            .map(|item| (item.gt_id().to_string(), item.workflow_id().to_string(), item.metadata.timestamp.clone()))
            .collect::<Vec<_>>();

        assert_eq!(
            summary,
            vec![
                ("gt_a".to_string(), "wf_1".to_string(), "2023-03-01T00:00:00".to_string()),
                ("gt_b".to_string(), "wf_1".to_string(), "2023-01-05T00:00:00".to_string()),
                ("gt_a".to_string(), "wf_2".to_string(), "not a date".to_string()),
            ]
        );
    }

    #[test]
    fn replace_swaps_whole_load_cycle() {
        let mut repository = repository_with(
            vec![gt("gt_a", "A", "1850")],
            vec![],
            vec![run("gt_a", "wf_1", "2023-01-01T00:00:00", Some(0.1))],
            vec![],
        );
        let before = repository.snapshot();

        repository.replace(Dataset {
            gt: vec![gt("gt_b", "B", "1900")],
            ..Dataset::default()
        });

        assert_eq!(before.gt.len(), 1);
        assert_eq!(before.runs.len(), 1);
        assert!(repository.get_gt_by_id("gt_a").is_none());
        assert!(repository.get_gt_by_id("gt_b").is_some());
        assert!(repository.runs().is_empty());
        assert!(RunRepository::default().get_latest_runs().is_empty());
    }
}
