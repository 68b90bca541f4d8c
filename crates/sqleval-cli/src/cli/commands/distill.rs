use super::{build_prompter, exit_codes, Context};
use crate::cli::args::DistillArgs;
use sqleval_core::cache::CachePolicy;
use sqleval_core::dataset::IndexRange;
use sqleval_core::engine::runner::{DistillRequest, DistillRunner};
use sqleval_core::report::{console::print_distill_summary, summarize_distillations};
use sqleval_core::storage::tables::{distillation_file_name, save_distillations};

pub async fn run(ctx: &Context, args: DistillArgs) -> anyhow::Result<i32> {
    let cfg = ctx.load_config()?;
    let out = args.out.clone().unwrap_or_else(|| {
        cfg.output_dir
            .join(distillation_file_name(&args.teacher, &args.dataset, &args.split))
    });

    let policy = if args.no_cache {
        CachePolicy::Disabled
    } else if args.refresh_cache {
        CachePolicy::Refresh
    } else {
        CachePolicy::Enabled
    };
    let req = DistillRequest {
        teacher: args.teacher.clone(),
        verifier: args.verifier,
        dataset: args.dataset,
        split: args.split,
        range: IndexRange::new(args.start, args.end),
        policy,
    };

    let prompter = build_prompter(&cfg);
    let runner = DistillRunner::new(cfg, prompter);
    let outcome = runner.run(&req).await?;

    if outcome.cache_path.as_deref() != Some(out.as_path()) {
        save_distillations(&out, &outcome.entries)?;
    }
    tracing::info!(
        event = "sqleval.distill.saved",
        path = %out.display(),
        from_cache = outcome.from_cache,
        entries = outcome.entries.len(),
        "wrote distillation report"
    );

    print_distill_summary(&args.teacher, &summarize_distillations(&outcome.entries));
    Ok(exit_codes::OK)
}
