use super::exit_codes;
use crate::cli::args::{ReportArgs, ReportKind};
use sqleval_core::report::console::{print_distill_summary, print_eval_summary};
use sqleval_core::report::{summarize_distillations, summarize_evaluations};
use sqleval_core::storage::tables::{load_distillations, load_evaluations};

/// Prints the console summary on stderr and the JSON summary on stdout.
pub fn run(args: ReportArgs) -> anyhow::Result<i32> {
    let label = args.input.display().to_string();
    let json = match args.kind {
        ReportKind::Eval => {
            let summary = summarize_evaluations(&load_evaluations(&args.input)?);
            print_eval_summary(&label, &summary);
            serde_json::to_string_pretty(&summary)?
        }
        ReportKind::Distill => {
            let summary = summarize_distillations(&load_distillations(&args.input)?);
            print_distill_summary(&label, &summary);
            serde_json::to_string_pretty(&summary)?
        }
    };
    println!("{}", json);
    Ok(exit_codes::OK)
}
