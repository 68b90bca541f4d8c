use super::{build_prompter, exit_codes, Context};
use crate::cli::args::ReevaluateArgs;
use anyhow::Context as _;
use sqleval_core::engine::runner::reevaluate;
use sqleval_core::report::{console::print_eval_summary, summarize_evaluations};
use sqleval_core::storage::tables::{load_evaluations, save_evaluations};
use std::path::{Path, PathBuf};

pub async fn run(ctx: &Context, args: ReevaluateArgs) -> anyhow::Result<i32> {
    let cfg = ctx.load_config()?;
    let entries = load_evaluations(&args.input)?;
    let before = summarize_evaluations(&entries);

    let prompter = build_prompter(&cfg);
    let fresh = reevaluate(&prompter, &cfg.prompts.retrieval, &args.model, &entries).await;

    let out = reevaluated_path(&args.input)?;
    save_evaluations(&out, &fresh)?;
    tracing::info!(event = "sqleval.reevaluate.saved", path = %out.display(), entries = fresh.len(), "wrote re-evaluated report");

    eprintln!(
        "accuracy before re-evaluation: {}",
        before.accuracy.map_or_else(|| "n/a".to_string(), |a| format!("{:.4}", a))
    );
    print_eval_summary(&args.model, &summarize_evaluations(&fresh));
    Ok(exit_codes::OK)
}

/// `runs/m_spider_result.csv` -> `runs/m_spider_result_reevaluated.csv`
pub fn reevaluated_path(input: &Path) -> anyhow::Result<PathBuf> {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .with_context(|| format!("cannot derive output name from {}", input.display()))?;
    Ok(input.with_file_name(format!("{}_reevaluated.csv", stem)))
}
