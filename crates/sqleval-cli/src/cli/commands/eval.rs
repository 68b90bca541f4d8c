use super::{build_prompter, exit_codes, Context};
use crate::cli::args::EvalArgs;
use sqleval_core::dataset::IndexRange;
use sqleval_core::engine::runner::{EvalRequest, EvalRunner};
use sqleval_core::report::{console::print_eval_summary, summarize_evaluations};
use sqleval_core::storage::tables::{evaluation_file_name, save_evaluations};

pub async fn run(ctx: &Context, args: EvalArgs) -> anyhow::Result<i32> {
    let cfg = ctx.load_config()?;
    let out = args
        .out
        .clone()
        .unwrap_or_else(|| cfg.output_dir.join(evaluation_file_name(&args.model, &args.dataset)));

    let req = EvalRequest {
        model: args.model.clone(),
        dataset: args.dataset,
        split: args.split,
        range: IndexRange::new(args.start, args.end),
    };
    let prompter = build_prompter(&cfg);
    let runner = EvalRunner::new(cfg, prompter);
    let entries = runner.run(&req).await?;

    save_evaluations(&out, &entries)?;
    tracing::info!(event = "sqleval.eval.saved", path = %out.display(), entries = entries.len(), "wrote evaluation report");

    let summary = summarize_evaluations(&entries);
    print_eval_summary(&args.model, &summary);

    if let Some(min) = args.min_accuracy {
        let accuracy = summary.accuracy.unwrap_or(0.0);
        if accuracy < min {
            eprintln!("accuracy {:.4} is below --min-accuracy {:.4}", accuracy, min);
            return Ok(exit_codes::BELOW_MIN_ACCURACY);
        }
    }
    Ok(exit_codes::OK)
}
