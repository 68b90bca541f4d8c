use super::{exit_codes, Context};
use crate::cli::args::SchemaArgs;
use sqleval_core::schema::describe_schema;

pub fn run(ctx: &Context, args: SchemaArgs) -> anyhow::Result<i32> {
    let cfg = ctx.load_config()?;
    let include_samples = cfg.settings.include_sample_rows && !args.no_samples;
    let schema = describe_schema(&args.db, include_samples, cfg.settings.sample_rows)?;
    println!("{}", schema.format_for_prompt());
    Ok(exit_codes::OK)
}
