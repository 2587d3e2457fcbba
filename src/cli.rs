use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::source::{DEFAULT_API_URL, DEFAULT_DATA_URL};

#[derive(Parser, Debug)]
#[command(
    name = "quiver-eval",
    version,
    about = "Query and rank OCR workflow evaluation results"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Status(StatusArgs),
    Rank(RankArgs),
    Runs(RunsArgs),
    Show(ShowArgs),
    Table(TableArgs),
}

#[derive(Args, Debug, Clone)]
pub struct SourceArgs {
    /// Read payloads from JSON files in this directory instead of the API.
    #[arg(long)]
    pub snapshot_dir: Option<PathBuf>,

    #[arg(long, env = "QUIVER_API_URL", default_value = DEFAULT_API_URL)]
    pub api_url: String,

    #[arg(long, env = "QUIVER_DATA_URL", default_value = DEFAULT_DATA_URL)]
    pub data_url: String,

    #[arg(long, env = "QUIVER_TIMEOUT_SECS", default_value_t = 30)]
    pub timeout_secs: u64,
}

#[derive(Args, Debug, Clone)]
pub struct StatusArgs {
    #[command(flatten)]
    pub source: SourceArgs,
}

#[derive(Args, Debug, Clone)]
pub struct RankArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// One of label_asc, label_desc, year_asc, year_desc, metric_asc, metric_desc.
    /// Anything else keeps the loaded order.
    #[arg(long, default_value = "label_asc")]
    pub sort: String,

    #[arg(long, default_value = "cer")]
    pub metric: String,

    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct RunsArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    #[arg(long)]
    pub gt: String,

    #[arg(long)]
    pub workflow: Option<String>,

    #[arg(long, default_value_t = false)]
    pub latest: bool,

    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum ShowKind {
    Gt,
    Workflow,
    Project,
}

impl ShowKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Gt => "ground truth",
            Self::Workflow => "workflow",
            Self::Project => "project",
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct ShowArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    #[arg(value_enum)]
    pub kind: ShowKind,

    pub id: String,

    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct TableArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    #[arg(long, default_value_t = false)]
    pub json: bool,
}
