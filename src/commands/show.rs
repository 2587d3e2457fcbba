use std::io::{self, Write};

use anyhow::Result;
use tracing::warn;

use crate::cli::{ShowArgs, ShowKind};
use crate::commands::open_repository;
use crate::model::{GroundTruth, Project, Workflow};
use crate::repository::RunRepository;
use crate::util::write_json_stdout;

pub fn run(args: ShowArgs) -> Result<()> {
    let repository = open_repository(&args.source)?;

    let found = match args.kind {
        ShowKind::Gt => repository
            .get_gt_by_id(&args.id)
            .map(|gt| show_gt(gt, &repository, args.json)),
        ShowKind::Workflow => repository
            .get_workflow_by_id(&args.id)
            .map(|workflow| show_workflow(workflow, args.json)),
        ShowKind::Project => repository
            .get_repo_by_id(&args.id)
            .map(|project| show_project(project, &repository, args.json)),
    };

    match found {
        Some(result) => result,
        None => {
            warn!(kind = args.kind.as_str(), id = %args.id, "no match");
            let mut output = io::stdout().lock();
            writeln!(output, "{} not found: {}", args.kind.as_str(), args.id)?;
            Ok(())
        }
    }
}

fn show_gt(gt: &GroundTruth, repository: &RunRepository, json: bool) -> Result<()> {
    if json {
        return write_json_stdout(gt);
    }

    let mut output = io::BufWriter::new(io::stdout().lock());
    writeln!(output, "{}\t{}", gt.id, gt.label)?;
    writeln!(
        output,
        "\ttime: {} - {}",
        gt.metadata.time.not_before, gt.metadata.time.not_after
    )?;
    if let Some(title) = &gt.metadata.title {
        writeln!(output, "\ttitle: {title}")?;
    }
    if !gt.metadata.language.is_empty() {
        writeln!(output, "\tlanguage: {}", gt.metadata.language.join(", "))?;
    }
    if !gt.metadata.script.is_empty() {
        writeln!(output, "\tscript: {}", gt.metadata.script.join(", "))?;
    }
    writeln!(output, "\truns: {}", repository.get_runs(&gt.id, None).len())?;
    writeln!(
        output,
        "\tlatest runs: {}",
        repository.get_latest_runs_for(&gt.id, None).len()
    )?;
    output.flush()?;
    Ok(())
}

fn show_workflow(workflow: &Workflow, json: bool) -> Result<()> {
    if json {
        return write_json_stdout(workflow);
    }

    let mut output = io::BufWriter::new(io::stdout().lock());
    writeln!(output, "{}\t{}", workflow.id, workflow.label)?;
    if !workflow.model.is_empty() {
        writeln!(output, "\tmodel: {}", workflow.model)?;
    }
    for (index, step) in workflow.steps.iter().enumerate() {
        writeln!(output, "\tstep[{}]: {}", index + 1, step.id)?;
        for (name, value) in &step.params {
            writeln!(output, "\t  {name}={value}")?;
        }
    }
    output.flush()?;
    Ok(())
}

fn show_project(project: &Project, repository: &RunRepository, json: bool) -> Result<()> {
    if json {
        return write_json_stdout(project);
    }

    let releases = repository
        .releases()
        .iter()
        .filter(|release| release.projects.iter().any(|id| id == &project.id))
        .map(|release| release.tag.as_str())
        .collect::<Vec<_>>();

    let mut output = io::BufWriter::new(io::stdout().lock());
    writeln!(output, "{}\t{}", project.id, project.url)?;
    writeln!(
        output,
        "\tversion: {} official={} compliant_cli={} ocrd_tool_json_valid={} unreleased_changes={}",
        project.latest_version,
        project.official,
        project.compliant_cli,
        project.ocrd_tool_json_valid,
        project.unreleased_changes
    )?;
    if !project.project_type.is_empty() {
        writeln!(output, "\ttype: {}", project.project_type)?;
    }
    writeln!(output, "\tdependencies: {}", project.dependencies.len())?;
    writeln!(output, "\treleases: {}", releases.join(", "))?;
    output.flush()?;
    Ok(())
}
