use std::io::{self, Write};

use anyhow::Result;
use serde::Serialize;
use tracing::info;

use crate::cli::RunsArgs;
use crate::commands::open_repository;
use crate::model::{EvaluationRun, MetricName};
use crate::util::{format_metric, write_json_stdout};

#[derive(Debug, Serialize)]
struct RunsResponse<'a> {
    gt: &'a str,
    workflow: Option<&'a str>,
    latest: bool,
    returned: usize,
    runs: Vec<&'a EvaluationRun>,
}

pub fn run(args: RunsArgs) -> Result<()> {
    let repository = open_repository(&args.source)?;
    let workflow = args.workflow.as_deref();

    let runs = if args.latest {
        repository.get_latest_runs_for(&args.gt, workflow)
    } else {
        repository.get_runs(&args.gt, workflow)
    };

    info!(
        gt = %args.gt,
        workflow = %workflow.unwrap_or_default(),
        latest = args.latest,
        count = runs.len(),
        "matched runs"
    );

    let response = RunsResponse {
        gt: &args.gt,
        workflow,
        latest: args.latest,
        returned: runs.len(),
        runs,
    };

    if args.json {
        return write_json_stdout(&response);
    }
    write_text_response(&response)
}

fn write_text_response(response: &RunsResponse<'_>) -> Result<()> {
    let mut output = io::BufWriter::new(io::stdout().lock());

    writeln!(
        output,
        "Runs: gt={} workflow={} latest={} returned={}",
        response.gt,
        response.workflow.unwrap_or("*"),
        response.latest,
        response.returned
    )?;

    for run in &response.runs {
        writeln!(
            output,
            "{}\t{}\t{}\tcer={}\twer={}\twall_time={}\trelease={}",
            run.metadata.timestamp,
            run.gt_id(),
            run.workflow_id(),
            format_metric(run.metric(MetricName::Cer)),
            format_metric(run.metric(MetricName::Wer)),
            format_metric(run.metric(MetricName::WallTime)),
            run.metadata
                .release_info
                .as_ref()
                .map(|release| release.tag_name.as_str())
                .unwrap_or("-"),
        )?;
        if !run.evaluation_results.by_page.is_empty() {
            writeln!(output, "\tpages: {}", run.evaluation_results.by_page.len())?;
        }
    }

    output.flush()?;
    Ok(())
}
