use std::io::{self, Write};

use anyhow::Result;
use serde::Serialize;
use tracing::info;

use crate::cli::RankArgs;
use crate::commands::open_repository;
use crate::model::{GroundTruth, MetricName};
use crate::ranking::{SortStrategy, latest_average, sort_by_option};
use crate::repository::RunRepository;
use crate::util::{format_metric, write_json_stdout};

#[derive(Debug, Clone, Serialize)]
struct RankedGroundTruth {
    rank: usize,
    id: String,
    label: String,
    not_before: String,
    not_after: String,
    latest_run_count: usize,
    average: f64,
}

#[derive(Debug, Serialize)]
struct RankResponse {
    sort: String,
    strategy: &'static str,
    metric: MetricName,
    metric_label: Option<String>,
    returned: usize,
    results: Vec<RankedGroundTruth>,
}

pub fn run(args: RankArgs) -> Result<()> {
    let metric = args.metric.parse::<MetricName>()?;
    let strategy = SortStrategy::from_option(&args.sort);
    let repository = open_repository(&args.source)?;

    let ranked = rank_ground_truth(&repository, strategy, metric)?;
    info!(
        strategy = %strategy,
        metric = %metric,
        count = ranked.len(),
        "ranked ground truth"
    );

    let response = RankResponse {
        sort: args.sort.clone(),
        strategy: strategy.as_str(),
        metric,
        metric_label: repository
            .metric_definition(metric)
            .map(|definition| definition.label.clone()),
        returned: ranked.len(),
        results: ranked,
    };

    if args.json {
        return write_json_stdout(&response);
    }
    write_text_response(&response)
}

fn rank_ground_truth(
    repository: &RunRepository,
    strategy: SortStrategy,
    metric: MetricName,
) -> Result<Vec<RankedGroundTruth>> {
    let sorted = sort_by_option(
        repository.ground_truth().to_vec(),
        strategy,
        metric,
        repository,
    )?;

    Ok(sorted
        .iter()
        .enumerate()
        .map(|(index, gt)| ranked_entry(index + 1, gt, metric, repository))
        .collect())
}

fn ranked_entry(
    rank: usize,
    gt: &GroundTruth,
    metric: MetricName,
    repository: &RunRepository,
) -> RankedGroundTruth {
    RankedGroundTruth {
        rank,
        id: gt.id.clone(),
        label: gt.label.clone(),
        not_before: gt.metadata.time.not_before.clone(),
        not_after: gt.metadata.time.not_after.clone(),
        latest_run_count: repository.get_latest_runs_for(&gt.id, None).len(),
        average: latest_average(gt, metric, repository),
    }
}

fn write_text_response(response: &RankResponse) -> Result<()> {
    let mut output = io::BufWriter::new(io::stdout().lock());

    let metric_label = response
        .metric_label
        .as_deref()
        .unwrap_or(response.metric.as_str());
    writeln!(
        output,
        "Sort: {} ({}) metric={}",
        response.sort, response.strategy, metric_label
    )?;
    writeln!(output, "Results: {}", response.returned)?;

    for entry in &response.results {
        writeln!(
            output,
            "{}.\t{}\t{}\t{}-{}\truns={}\t{}={}",
            entry.rank,
            entry.id,
            entry.label,
            entry.not_before,
            entry.not_after,
            entry.latest_run_count,
            response.metric,
            format_metric(Some(entry.average)),
        )?;
    }

    output.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::rank_ground_truth;
    use crate::model::MetricName;
    use crate::ranking::SortStrategy;
    use crate::test_fixtures::{gt, repository_with, run};

    #[test]
    fn rank_entries_carry_position_and_average() {
        let repository = repository_with(
            vec![gt("gt_a", "A", "1900"), gt("gt_b", "B", "1800")],
            vec![],
            vec![],
            vec![
                run("gt_a", "wf_1", "2023-01-01T00:00:00", Some(0.10)),
                run("gt_b", "wf_1", "2023-01-01T00:00:00", Some(0.05)),
                run("gt_b", "wf_2", "2023-01-01T00:00:00", None),
            ],
        );

        let ranked = rank_ground_truth(&repository, SortStrategy::YearAsc, MetricName::Cer)
            .expect("ranking should succeed");

        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].rank, 1);
        assert_eq!(ranked[0].id, "gt_b");
        assert_eq!(ranked[0].latest_run_count, 2);
        assert_eq!(ranked[0].average, 0.025);
        assert_eq!(ranked[1].id, "gt_a");
        assert_eq!(ranked[1].average, 0.10);
    }
}
