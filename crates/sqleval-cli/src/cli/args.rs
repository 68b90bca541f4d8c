use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "sqleval",
    version,
    about = "Execution-based text-to-SQL evaluation and reasoning distillation"
)]
pub struct Cli {
    /// YAML config; defaults to ./sqleval.yaml when present
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// reject unknown config keys instead of warning
    #[arg(long, global = true)]
    pub strict_config: bool,

    /// tracing filter, e.g. `info` or `sqleval_core=debug`
    #[arg(long, global = true, env = "SQLEVAL_LOG", default_value = "info")]
    pub log_level: String,

    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Generate SQL with a model over a split and judge it by execution
    Eval(EvalArgs),
    /// Produce reasoning traces with a teacher model and verify them
    Distill(DistillArgs),
    /// Re-judge non-correct entries of an evaluation CSV after SQL retrieval
    Reevaluate(ReevaluateArgs),
    /// Convert a distillation CSV to Alpaca instruction records
    ExportAlpaca(ExportAlpacaArgs),
    /// Print the prompt schema of a database
    Schema(SchemaArgs),
    /// Summarize a result CSV
    Report(ReportArgs),
    Version,
}

#[derive(Parser, Clone)]
pub struct EvalArgs {
    #[arg(long)]
    pub model: String,
    #[arg(long, default_value = "spider")]
    pub dataset: String,
    #[arg(long, default_value = "train")]
    pub split: String,
    /// first instance index (inclusive)
    #[arg(long)]
    pub start: Option<usize>,
    /// last instance index (inclusive)
    #[arg(long)]
    pub end: Option<usize>,
    #[arg(long)]
    pub out: Option<PathBuf>,
    /// exit 1 when accuracy ends up below this value
    #[arg(long)]
    pub min_accuracy: Option<f64>,
}

#[derive(Parser, Clone)]
pub struct DistillArgs {
    #[arg(long)]
    pub teacher: String,
    /// defaults to the teacher
    #[arg(long)]
    pub verifier: Option<String>,
    #[arg(long, default_value = "spider")]
    pub dataset: String,
    #[arg(long, default_value = "train")]
    pub split: String,
    #[arg(long)]
    pub start: Option<usize>,
    #[arg(long)]
    pub end: Option<usize>,
    /// neither read nor write the result cache
    #[arg(long, conflicts_with = "refresh_cache")]
    pub no_cache: bool,
    /// ignore a cached result but overwrite it
    #[arg(long)]
    pub refresh_cache: bool,
    #[arg(long)]
    pub out: Option<PathBuf>,
}

#[derive(Parser, Clone)]
pub struct ReevaluateArgs {
    #[arg(long)]
    pub input: PathBuf,
    /// model used to pull SQL out of raw responses
    #[arg(long)]
    pub model: String,
}

#[derive(Parser, Clone)]
pub struct ExportAlpacaArgs {
    #[arg(long)]
    pub input: PathBuf,
    #[arg(long)]
    pub out: PathBuf,
    #[arg(long)]
    pub include_unverified: bool,
}

#[derive(Parser, Clone)]
pub struct SchemaArgs {
    #[arg(long)]
    pub db: PathBuf,
    #[arg(long)]
    pub no_samples: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ReportKind {
    Eval,
    Distill,
}

#[derive(Parser, Clone)]
pub struct ReportArgs {
    #[arg(long)]
    pub input: PathBuf,
    #[arg(long, value_enum, default_value_t = ReportKind::Eval)]
    pub kind: ReportKind,
}
