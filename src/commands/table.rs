use std::io::{self, Write};

use anyhow::Result;

use crate::cli::TableArgs;
use crate::commands::open_repository;
use crate::metrics::{EvaluationValue, grouped_results};
use crate::util::{format_metric, write_json_stdout};

pub fn run(args: TableArgs) -> Result<()> {
    let repository = open_repository(&args.source)?;
    let grouped = grouped_results(&repository);

    if args.json {
        return write_json_stdout(&grouped);
    }

    let mut output = io::BufWriter::new(io::stdout().lock());
    for (gt_id, row) in &grouped {
        writeln!(output, "{}\t{}", gt_id, row.label.as_deref().unwrap_or("-"))?;
        for subject in &row.subjects {
            let values = subject
                .evaluations
                .iter()
                .map(|evaluation| format!("{}={}", evaluation.name, format_value(&evaluation.value)))
                .collect::<Vec<_>>();
            writeln!(
                output,
                "\t{}\t{}\t{}",
                subject.workflow_id,
                subject.label.as_deref().unwrap_or("-"),
                values.join(" ")
            )?;
        }
    }
    output.flush()?;
    Ok(())
}

fn format_value(value: &EvaluationValue) -> String {
    match value {
        EvaluationValue::Scalar(value) => format_metric(*value),
        EvaluationValue::Range(Some(range)) => {
            let parts = range
                .iter()
                .map(|item| format_metric(*item))
                .collect::<Vec<_>>();
            format!("[{}]", parts.join(", "))
        }
        EvaluationValue::Range(None) => "-".to_string(),
    }
}
