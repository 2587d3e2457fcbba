use std::cmp::Ordering;
use std::fmt;

use anyhow::{Context, Result};
use regex::Regex;
use tracing::{debug, warn};
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

use crate::metrics::average_metric;
use crate::model::{GroundTruth, MetricName, TimeSpan};
use crate::repository::RunRepository;


#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SortStrategy {
    LabelAsc,
    LabelDesc,
    YearAsc,
    YearDesc,
    MetricAsc,
    MetricDesc,
    /// Any unrecognized option. Keeps the input order untouched.
    Passthrough,
}

impl SortStrategy {
    pub const OPTIONS: [Self; 6] = [
        Self::LabelAsc,
        Self::LabelDesc,
        Self::MetricDesc,
        Self::MetricAsc,
        Self::YearAsc,
        Self::YearDesc,
    ];

    pub fn from_option(option: &str) -> Self {
        let normalized = option.trim();
        match Self::OPTIONS
            .into_iter()
            .find(|strategy| strategy.as_str() == normalized)
        {
            Some(strategy) => strategy,
            None => {
                warn!(option = %option, "unrecognized sort option, keeping input order");
                Self::Passthrough
            }
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::LabelAsc => "label_asc",
            Self::LabelDesc => "label_desc",
            Self::YearAsc => "year_asc",
            Self::YearDesc => "year_desc",
            Self::MetricAsc => "metric_asc",
            Self::MetricDesc => "metric_desc",
            Self::Passthrough => "passthrough",
        }
    }
}

impl fmt::Display for SortStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Orders ground truths by `strategy`. The sort is stable, so entries that
/// compare equal keep their input order in both directions.
pub fn sort_by_option(
    gt_list: Vec<GroundTruth>,
    strategy: SortStrategy,
    metric: MetricName,
    repository: &RunRepository,
) -> Result<Vec<GroundTruth>> {
    debug!(strategy = %strategy, metric = %metric, count = gt_list.len(), "sorting ground truth");

    let sorted = match strategy {
        SortStrategy::MetricDesc => sort_by_metric(gt_list, true, metric, repository),
        SortStrategy::MetricAsc => sort_by_metric(gt_list, false, metric, repository),
        SortStrategy::LabelDesc => sort_by_label(gt_list, true),
        SortStrategy::LabelAsc => sort_by_label(gt_list, false),
        SortStrategy::YearDesc => sort_by_year(gt_list, true)?,
        SortStrategy::YearAsc => sort_by_year(gt_list, false)?,
        SortStrategy::Passthrough => gt_list,
    };
    Ok(sorted)
}

/// Average of `metric` over the latest runs recorded for `gt`.
pub fn latest_average(gt: &GroundTruth, metric: MetricName, repository: &RunRepository) -> f64 {
    average_metric(repository.get_latest_runs_for(&gt.id, None), metric)
}

fn sort_by_metric(
    gt_list: Vec<GroundTruth>,
    desc: bool,
    metric: MetricName,
    repository: &RunRepository,
) -> Vec<GroundTruth> {
    let mut decorated = gt_list
        .into_iter()
        .map(|gt| (latest_average(&gt, metric, repository), gt))
        .collect::<Vec<_>>();

    decorated.sort_by(|(left, _), (right, _)| {
        let (left, right) = if desc { (right, left) } else { (left, right) };
        left.partial_cmp(right).unwrap_or(Ordering::Equal)
    });

    decorated.into_iter().map(|(_, gt)| gt).collect()
}

fn sort_by_label(gt_list: Vec<GroundTruth>, desc: bool) -> Vec<GroundTruth> {
    let mut decorated = gt_list
        .into_iter()
        .map(|gt| (collation_key(&gt.label), gt))
        .collect::<Vec<_>>();

    decorated.sort_by(|(left, _), (right, _)| {
        if desc {
            right.cmp(left)
        } else {
            left.cmp(right)
        }
    });

    decorated.into_iter().map(|(_, gt)| gt).collect()
}

/// Sort key for a label: the lowercased text with accents folded onto their
/// base letters, then the lowercased text itself. `Ärzteblatt` sorts with
/// `a`, and an accented label follows its unaccented twin. Labels differing
/// only in case compare equal.
fn collation_key(label: &str) -> (String, String) {
    let lowered = label.to_lowercase();
    let mut folded = String::with_capacity(lowered.len());
    for ch in lowered.nfkd() {
        match ch {
            'ß' => folded.push_str("ss"),
            'æ' => folded.push_str("ae"),
            'œ' => folded.push_str("oe"),
            'ø' => folded.push('o'),
            'ł' => folded.push('l'),
            'đ' => folded.push('d'),
            ch if is_combining_mark(ch) => {}
            ch => folded.push(ch),
        }
    }
    (folded, lowered)
}

fn sort_by_year(mut gt_list: Vec<GroundTruth>, desc: bool) -> Result<Vec<GroundTruth>> {
    let year_regex =
        Regex::new(r"^\s*(-?\d{1,6})").context("failed to compile leading year regex")?;

    gt_list.sort_by(|left, right| {
        if desc {
            compare_time_spans(&year_regex, &right.metadata.time, &left.metadata.time)
        } else {
            compare_time_spans(&year_regex, &left.metadata.time, &right.metadata.time)
        }
    });
    Ok(gt_list)
}

/// Numeric comparison on the leading year of `notBefore`, then on the raw
/// value. Values without a leading year order first.
fn compare_time_spans(year_regex: &Regex, left: &TimeSpan, right: &TimeSpan) -> Ordering {
    let raw = left.not_before.cmp(&right.not_before);
    match (
        leading_year(year_regex, &left.not_before),
        leading_year(year_regex, &right.not_before),
    ) {
        (Some(left_year), Some(right_year)) => left_year.cmp(&right_year).then(raw),
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (None, None) => raw,
    }
}

fn leading_year(year_regex: &Regex, value: &str) -> Option<i64> {
    year_regex
        .captures(value)
        .and_then(|captures| captures.get(1))
        .and_then(|year| year.as_str().parse::<i64>().ok())
}
