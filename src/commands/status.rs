use std::collections::HashSet;
use std::io::{self, Write};

use anyhow::Result;
use tracing::{info, warn};

use crate::cli::StatusArgs;
use crate::commands::open_repository;
use crate::identity::normalize;
use crate::util::now_utc_string;

pub fn run(args: StatusArgs) -> Result<()> {
    let repository = open_repository(&args.source)?;
    let dataset = repository.snapshot();

    let mut seen = HashSet::new();
    let duplicate_latest = dataset
        .latest_runs
        .iter()
        .filter(|run| !seen.insert(run.run_key()))
        .count();
    if duplicate_latest > 0 {
        warn!(
            duplicates = duplicate_latest,
            "latest runs contain more than one run per ground truth and workflow"
        );
    }

    let unknown_gt = dataset
        .latest_runs
        .iter()
        .filter(|run| {
            dataset
                .gt
                .iter()
                .all(|gt| run.gt_id() != normalize(&gt.id))
        })
        .count();

    let newest_run = dataset
        .runs
        .iter()
        .filter_map(|run| run.recorded_at())
        .max();

    info!(
        gt = dataset.gt.len(),
        runs = dataset.runs.len(),
        latest_runs = dataset.latest_runs.len(),
        "status loaded"
    );

    let mut output = io::BufWriter::new(io::stdout().lock());
    writeln!(output, "Loaded at: {}", now_utc_string())?;
    writeln!(output, "Ground truth: {}", dataset.gt.len())?;
    writeln!(output, "Workflows: {}", repository.workflows().len())?;
    writeln!(output, "Runs: {}", repository.runs().len())?;
    writeln!(
        output,
        "Latest runs: {} (without loaded ground truth: {})",
        dataset.latest_runs.len(),
        unknown_gt
    )?;
    match newest_run {
        Some(timestamp) => writeln!(output, "Newest run: {}", timestamp.to_rfc3339())?,
        None => writeln!(output, "Newest run: -")?,
    }
    writeln!(output, "Projects: {}", repository.projects().len())?;
    writeln!(output, "Releases: {}", repository.releases().len())?;
    writeln!(output, "Metric definitions: {}", dataset.metric_definitions.len())?;
    output.flush()?;

    Ok(())
}
