#![allow(dead_code)]

use rusqlite::Connection;
use sqleval_core::config::Config;
use sqleval_core::prompt::Prompter;
use sqleval_core::providers::llm::fake::FakeClient;
use sqleval_core::providers::llm::registry::ModelRegistry;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub const COUNT_OLDER: &str = "SELECT COUNT(*) FROM head WHERE age > 56";

/// `{root}/database/dept/dept.sqlite` with `head(age)` = 56, 60, 45.
pub fn dept_database(root: &Path) -> anyhow::Result<PathBuf> {
    let dir = root.join("database").join("dept");
    std::fs::create_dir_all(&dir)?;
    let path = dir.join("dept.sqlite");
    let conn = Connection::open(&path)?;
    conn.execute_batch(
        "CREATE TABLE head (head_id INTEGER PRIMARY KEY, name TEXT, age INTEGER);
         INSERT INTO head (name, age) VALUES ('Ann', 56), ('Bob', 60), ('Cy', 45);",
    )?;
    Ok(path)
}

/// Writes `train_spider.json` under `root` and returns a config pointing at it.
pub fn spider_fixture(root: &Path, instances: serde_json::Value) -> anyhow::Result<Config> {
    dept_database(root)?;
    std::fs::write(root.join("train_spider.json"), serde_json::to_vec_pretty(&instances)?)?;

    let mut cfg = Config::default();
    cfg.dataset.root = root.to_path_buf();
    cfg.cache_dir = root.join("cache");
    cfg.output_dir = root.to_path_buf();
    cfg.settings.timeout_seconds = 5;
    Ok(cfg)
}

pub fn prompter_with(cfg: &Config, clients: &[(&str, Arc<FakeClient>)]) -> Prompter {
    let registry = Arc::new(ModelRegistry::from_config(cfg));
    for (name, client) in clients {
        registry.register(*name, client.clone());
    }
    Prompter::new(registry, cfg.settings.timeout_seconds)
}
