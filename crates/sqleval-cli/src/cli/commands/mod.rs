use super::args::*;
use sqleval_core::config::{load_config, Config, DEFAULT_CONFIG_FILE};
use sqleval_core::prompt::Prompter;
use sqleval_core::providers::llm::registry::ModelRegistry;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub mod distill;
pub mod eval;
pub mod export_alpaca;
pub mod reevaluate;
pub mod report;
pub mod schema;

pub mod exit_codes {
    pub const OK: i32 = 0;
    pub const BELOW_MIN_ACCURACY: i32 = 1;
    pub const CONFIG_ERROR: i32 = 2;
}

pub async fn dispatch(cli: Cli) -> anyhow::Result<i32> {
    let ctx = Context {
        config_path: cli.config,
        strict_config: cli.strict_config,
    };
    match cli.cmd {
        Command::Eval(args) => eval::run(&ctx, args).await,
        Command::Distill(args) => distill::run(&ctx, args).await,
        Command::Reevaluate(args) => reevaluate::run(&ctx, args).await,
        Command::ExportAlpaca(args) => export_alpaca::run(&ctx, args),
        Command::Schema(args) => schema::run(&ctx, args),
        Command::Report(args) => report::run(args),
        Command::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(exit_codes::OK)
        }
    }
}

/// Global options shared by every command.
pub struct Context {
    pub config_path: Option<PathBuf>,
    pub strict_config: bool,
}

impl Context {
    /// Explicit `--config` must exist; the default file is optional.
    pub fn load_config(&self) -> anyhow::Result<Config> {
        let mut cfg = match &self.config_path {
            Some(path) => load_config(path, self.strict_config)?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                load_config(Path::new(DEFAULT_CONFIG_FILE), self.strict_config)?
            }
            None => {
                tracing::debug!("no {} found, using built-in defaults", DEFAULT_CONFIG_FILE);
                Config::default()
            }
        };
        cfg.apply_env();
        Ok(cfg)
    }
}

pub fn build_prompter(cfg: &Config) -> Prompter {
    let registry = Arc::new(ModelRegistry::from_config(cfg));
    Prompter::new(registry, cfg.settings.timeout_seconds)
}
