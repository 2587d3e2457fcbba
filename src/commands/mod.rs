use std::time::Duration;

use anyhow::Result;

use crate::cli::SourceArgs;
use crate::repository::RunRepository;
use crate::source::{DataSource, Endpoints, HttpSource, SnapshotSource, load_dataset};

pub mod rank;
pub mod runs;
pub mod show;
pub mod status;
pub mod table;

pub(crate) fn open_repository(args: &SourceArgs) -> Result<RunRepository> {
    let source: Box<dyn DataSource> = match &args.snapshot_dir {
        Some(dir) => Box::new(SnapshotSource::new(dir)),
        None => Box::new(HttpSource::new(
            Endpoints::new(&args.api_url, &args.data_url),
            Duration::from_secs(args.timeout_secs),
        )?),
    };

    let mut repository = RunRepository::default();
    repository.replace(load_dataset(source.as_ref())?);
    Ok(repository)
}
