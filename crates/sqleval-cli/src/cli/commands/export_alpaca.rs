use super::{exit_codes, Context};
use crate::cli::args::ExportAlpacaArgs;
use sqleval_core::report::alpaca::{save_alpaca, to_alpaca};
use sqleval_core::storage::tables::load_distillations;

pub fn run(ctx: &Context, args: ExportAlpacaArgs) -> anyhow::Result<i32> {
    let cfg = ctx.load_config()?;
    let entries = load_distillations(&args.input)?;
    let records = to_alpaca(&entries, &cfg.prompts.alpaca_instruction, !args.include_unverified)?;
    save_alpaca(&args.out, &records)?;
    eprintln!(
        "exported {} of {} entries to {}",
        records.len(),
        entries.len(),
        args.out.display()
    );
    Ok(exit_codes::OK)
}
