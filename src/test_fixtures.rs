use serde_json::{Value, json};

use crate::model::{EvaluationRun, GroundTruth, Workflow};
use crate::repository::{Dataset, RunRepository};

pub fn gt_json(id: &str, label: &str, not_before: &str) -> Value {
    json!({
        "id": id,
        "label": label,
        "metadata": {
            "time": { "notBefore": not_before, "notAfter": not_before },
            "title": label,
            "language": ["ger"],
            "script": ["Latn"]
        }
    })
}

pub fn gt(id: &str, label: &str, not_before: &str) -> GroundTruth {
    serde_json::from_value(gt_json(id, label, not_before)).expect("fixture ground truth")
}

pub fn workflow(id: &str, label: &str) -> Workflow {
    serde_json::from_value(json!({
        "id": id,
        "label": label,
        "model": "Fraktur_GT4HistOCR",
        "steps": [
            { "id": "ocrd-tesserocr-recognize", "params": { "model": "Fraktur", "textequiv_level": "line" } }
        ]
    }))
    .expect("fixture workflow")
}

/// Run of workflow `workflow_id` on workspace `gt_id`; `cer` doubles as `cer_mean`.
pub fn run_json(gt_id: &str, workflow_id: &str, timestamp: &str, cer: Option<f64>) -> Value {
    json!({
        "eval_workflow_id": format!("eval_{workflow_id}"),
        "label": format!("{workflow_id} on {gt_id}"),
        "evaluation_results": {
            "by_page": [
                { "page_id": "phys_0001", "cer": cer, "wer": null }
            ],
            "document_wide": {
                "cer": cer,
                "cer_mean": cer,
                "cer_median": cer,
                "cer_range": [cer, cer],
                "cer_standard_deviation": null,
                "cpu_time": 12.5,
                "pages_per_minute": 4.0,
                "wall_time": 15.0,
                "wer": null
            }
        },
        "metadata": {
            "gt_workspace": { "id": gt_id, "label": gt_id },
            "ocr_workflow": { "id": workflow_id, "label": workflow_id },
            "eval_tool": "ocrd-dinglehopper",
            "timestamp": timestamp,
            "release_info": {
                "id": 1,
                "published_at": "2023-04-01T00:00:00Z",
                "tag_name": "v2023-04-01",
                "html_url": "https://github.com/OCR-D/ocrd_all/releases/tag/v2023-04-01"
            },
            "workflow_steps": []
        }
    })
}

pub fn run(gt_id: &str, workflow_id: &str, timestamp: &str, cer: Option<f64>) -> EvaluationRun {
    serde_json::from_value(run_json(gt_id, workflow_id, timestamp, cer)).expect("fixture run")
}

pub fn repository_with(
    gt: Vec<GroundTruth>,
    workflows: Vec<Workflow>,
    runs: Vec<EvaluationRun>,
    latest_runs: Vec<EvaluationRun>,
) -> RunRepository {
    RunRepository::from(Dataset {
        gt,
        workflows,
        runs,
        latest_runs,
        ..Dataset::default()
    })
}
