use std::collections::BTreeMap;

use serde::Serialize;

use crate::identity::CanonicalId;
use crate::model::{EvaluationRun, MetricName};
use crate::repository::RunRepository;

/// Mean of `metric` over `runs`.
///
/// Missing values count as zero but still count toward the denominator.
/// An empty input averages to zero.
pub fn average_metric<'a, I>(runs: I, metric: MetricName) -> f64
where
    I: IntoIterator<Item = &'a EvaluationRun>,
{
    let (total, count) = runs
        .into_iter()
        .fold((0.0_f64, 0_usize), |(total, count), run| {
            (total + run.metric(metric).unwrap_or(0.0), count + 1)
        });

    if count == 0 {
        return 0.0;
    }
    total / count as f64
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum EvaluationValue {
    Scalar(Option<f64>),
    Range(Option<Vec<Option<f64>>>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NamedEvaluation {
    pub name: &'static str,
    pub value: EvaluationValue,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupedSubject {
    pub workflow_id: CanonicalId,
    pub label: Option<String>,
    pub evaluations: Vec<NamedEvaluation>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupedRow {
    pub label: Option<String>,
    pub subjects: Vec<GroupedSubject>,
}

/// Latest-run results grouped by ground truth, then by workflow.
pub fn grouped_results(repository: &RunRepository) -> BTreeMap<CanonicalId, GroupedRow> {
    let mut grouped = BTreeMap::<CanonicalId, BTreeMap<CanonicalId, &EvaluationRun>>::new();
    for run in repository.get_latest_runs() {
        let (gt_id, workflow_id) = run.run_key();
        grouped.entry(gt_id).or_default().insert(workflow_id, run);
    }

    grouped
        .into_iter()
        .map(|(gt_id, by_workflow)| {
            let label = repository
                .get_gt_by_id(gt_id.as_str())
                .map(|gt| gt.label.clone());
            let subjects = by_workflow
                .into_iter()
                .map(|(workflow_id, run)| GroupedSubject {
                    label: repository
                        .get_workflow_by_id(workflow_id.as_str())
                        .map(|workflow| workflow.label.clone()),
                    evaluations: run_evaluations(run),
                    workflow_id,
                })
                .collect();
            (gt_id, GroupedRow { label, subjects })
        })
        .collect()
}

fn run_evaluations(run: &EvaluationRun) -> Vec<NamedEvaluation> {
    let document_wide = &run.evaluation_results.document_wide;
    let mut evaluations = MetricName::ALL
        .into_iter()
        .map(|metric| NamedEvaluation {
            name: metric.as_str(),
            value: EvaluationValue::Scalar(document_wide.get(metric)),
        })
        .collect::<Vec<_>>();
    evaluations.push(NamedEvaluation {
        name: "cer_range",
        value: EvaluationValue::Range(document_wide.cer_range.clone()),
    });
    evaluations
}

#[cfg(test)]
mod tests {
    use super::{EvaluationValue, average_metric, grouped_results};
    use crate::model::MetricName;
    use crate::test_fixtures::{gt, repository_with, run, workflow};

    #[test]
    fn empty_input_averages_to_zero() {
        assert_eq!(average_metric([], MetricName::Cer), 0.0);
        for metric in MetricName::ALL {
            assert_eq!(average_metric(Vec::new().iter(), metric), 0.0);
        }
    }

    #[test]
    fn null_values_count_as_zero_in_denominator() {
        let runs = vec![
            run("gt_a", "wf_1", "2023-01-01T00:00:00", Some(4.0)),
            run("gt_a", "wf_2", "2023-01-01T00:00:00", None),
            run("gt_a", "wf_3", "2023-01-01T00:00:00", Some(8.0)),
        ];

        assert_eq!(average_metric(&runs, MetricName::Cer), 4.0);
        assert_eq!(average_metric(&runs, MetricName::Wer), 0.0);
        assert_eq!(average_metric(&runs, MetricName::WallTime), 15.0);
        assert_eq!(runs.len(), 3);
    }

    #[test]
    fn grouped_results_use_latest_runs_and_known_labels() {
        let repository = repository_with(
            vec![gt("gt_a", "Antiqua", "1850")],
            vec![workflow("wf_1", "Minimal OCR")],
            vec![],
            vec![
                run("https://example.org/gt_a.zip", "wf_2", "2023-01-01T00:00:00", Some(0.2)),
                run("gt_a", "wf_1.txt", "2023-01-01T00:00:00", Some(0.1)),
                run("gt_b", "wf_1", "2023-01-01T00:00:00", None),
            ],
        );

        let grouped = grouped_results(&repository);
        let keys = grouped.keys().map(ToString::to_string).collect::<Vec<_>>();
        assert_eq!(keys, vec!["gt_a", "gt_b"]);

        let row = grouped.values().next().expect("gt_a row");
        assert_eq!(row.label.as_deref(), Some("Antiqua"));
        let workflow_labels = row
            .subjects
            .iter()
            .map(|subject| (subject.workflow_id.to_string(), subject.label.clone()))
            .collect::<Vec<_>>();
        assert_eq!(
            workflow_labels,
            vec![
                ("wf_1".to_string(), Some("Minimal OCR".to_string())),
                ("wf_2".to_string(), None),
            ]
        );

        let cer = row.subjects[0]
            .evaluations
            .iter()
            .find(|evaluation| evaluation.name == "cer")
            .map(|evaluation| evaluation.value.clone());
        assert_eq!(cer, Some(EvaluationValue::Scalar(Some(0.1))));
        let range = row.subjects[0]
            .evaluations
            .iter()
            .find(|evaluation| evaluation.name == "cer_range")
            .map(|evaluation| evaluation.value.clone());
        assert_eq!(
            range,
            Some(EvaluationValue::Range(Some(vec![Some(0.1), Some(0.1)])))
        );
    }
}
