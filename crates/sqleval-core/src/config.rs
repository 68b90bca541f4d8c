use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub const SUPPORTED_CONFIG_VERSION: u32 = 1;
pub const DEFAULT_CONFIG_FILE: &str = "sqleval.yaml";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    #[serde(rename = "configVersion", alias = "version")]
    pub version: u32,
    pub dataset: DatasetConfig,
    pub settings: Settings,
    pub models: BTreeMap<String, ModelSpec>,
    pub prompts: Prompts,
    pub cache_dir: PathBuf,
    pub output_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: SUPPORTED_CONFIG_VERSION,
            dataset: DatasetConfig::default(),
            settings: Settings::default(),
            models: default_models(),
            prompts: Prompts::default(),
            cache_dir: PathBuf::from(".sqleval/cache"),
            output_dir: PathBuf::from("."),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DatasetConfig {
    pub name: String,
    pub root: PathBuf,
    /// Split name -> benchmark JSON file, relative to `root`.
    pub splits: BTreeMap<String, PathBuf>,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        let splits = [
            ("train", "train_spider.json"),
            ("dev", "dev.json"),
            ("test", "test.json"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), PathBuf::from(v)))
        .collect();
        Self {
            name: "spider".into(),
            root: PathBuf::from("spider_data"),
            splits,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub timeout_seconds: u64,
    pub include_sample_rows: bool,
    pub sample_rows: usize,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
    pub ollama_url: String,
    pub openai_base_url: String,
    pub openai_api_key_env: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            timeout_seconds: 120,
            include_sample_rows: true,
            sample_rows: 3,
            temperature: 0.1,
            max_tokens: None,
            ollama_url: "http://localhost:11434".into(),
            openai_base_url: "https://api.openai.com/v1".into(),
            openai_api_key_env: "OPENAI_API_KEY".into(),
        }
    }
}

/// How a model identifier is served.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Backend {
    HostedApi,
    #[default]
    LocalInference,
    Custom,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ModelSpec {
    pub backend: Backend,
    /// Name sent to the backend when it differs from the identifier used in reports.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub served_name: Option<String>,
}

fn default_models() -> BTreeMap<String, ModelSpec> {
    ["gpt-4o", "gpt-4o-mini"]
        .into_iter()
        .map(|m| {
            (
                m.to_string(),
                ModelSpec {
                    backend: Backend::HostedApi,
                    served_name: None,
                },
            )
        })
        .collect()
}

impl Config {
    pub fn split_file(&self, split: &str) -> Option<PathBuf> {
        self.dataset.splits.get(split).map(|p| self.dataset.root.join(p))
    }

    /// Applies `SQLEVAL_*` environment overrides.
    pub fn apply_env(&mut self) {
        if let Ok(v) = std::env::var("SQLEVAL_SPIDER_ROOT") {
            self.dataset.root = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("SQLEVAL_OLLAMA_URL") {
            self.settings.ollama_url = v;
        }
        if let Ok(v) = std::env::var("SQLEVAL_TIMEOUT_SECONDS") {
            if let Ok(n) = v.parse() {
                self.settings.timeout_seconds = n;
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Prompts {
    /// Placeholders: `{request}`, `{schema}`, `{db_path}`.
    pub generation: String,
    /// Placeholders: `{problem}`, `{solution}`, `{schema}`.
    pub distillation: String,
    /// Placeholders: `{problem}`, `{schema}`, `{reasoning}`.
    pub verification: String,
    /// Placeholders: `{response}`.
    pub retrieval: String,
    /// Placeholders: `{request}`, `{schema}`.
    pub alpaca_instruction: String,
}

impl Default for Prompts {
    fn default() -> Self {
        Self {
            generation: GENERATION.into(),
            distillation: DISTILLATION.into(),
            verification: VERIFICATION.into(),
            retrieval: RETRIEVAL.into(),
            alpaca_instruction: ALPACA_INSTRUCTION.into(),
        }
    }
}

const GENERATION: &str = "You are an expert SQLite developer.
Given the database schema below, write one SQLite query that answers the request.
Respond only with the SQL query and nothing else.

Schema:
{schema}

Request: {request}
";

const DISTILLATION: &str = "You are teaching a student to translate questions into SQLite queries.
Given the schema, the question and its correct query, explain step by step how to arrive at the query.
Put your explanation between <reasoning> and </reasoning>, then give the query between <final answer> and </final answer>.

Schema:
{schema}

Question: {problem}
Correct query: {solution}
";

const VERIFICATION: &str = "You are an expert SQLite developer.
Using the schema and the reasoning below, write the SQLite query that answers the question.
Put the query between <final answer> and </final answer>.

Schema:
{schema}

Question: {problem}

Reasoning:
{reasoning}
";

const RETRIEVAL: &str = "Retrieve the sql in the text below. Respond only with the sql and nothing else.
{response}
";

const ALPACA_INSTRUCTION: &str = "Translate the request into a SQLite query for the given schema.

Schema:
{schema}

Request: {request}";

/// Loads a YAML config. Unknown keys are logged, or rejected when `strict`.
pub fn load_config(path: &Path, strict: bool) -> Result<Config, ConfigError> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| ConfigError(format!("failed to read config {}: {}", path.display(), e)))?;
    parse_config(&raw, strict).map_err(|e| ConfigError(format!("{} (file: {})", e.0, path.display())))
}

pub fn parse_config(raw: &str, strict: bool) -> Result<Config, ConfigError> {
    let mut ignored = std::collections::BTreeSet::new();
    let deserializer = serde_yaml::Deserializer::from_str(raw);
    let cfg: Config = serde_ignored::deserialize(deserializer, |path| {
        ignored.insert(path.to_string());
    })
    .map_err(|e| ConfigError(format!("failed to parse YAML: {}", e)))?;

    let meaningful: Vec<_> = ignored
        .iter()
        .filter(|k| !k.starts_with('_') && !k.starts_with("x-"))
        .collect();
    if !meaningful.is_empty() {
        if strict {
            return Err(ConfigError(format!("unknown config fields: {:?}", meaningful)));
        }
        tracing::warn!(fields = ?meaningful, "ignored unknown config fields");
    }

    if cfg.version != 0 && cfg.version != SUPPORTED_CONFIG_VERSION {
        return Err(ConfigError(format!(
            "unsupported config version {} (supported: 0, {})",
            cfg.version, SUPPORTED_CONFIG_VERSION
        )));
    }
    if cfg.dataset.name != "spider" {
        return Err(ConfigError(format!(
            "unsupported dataset '{}' (supported: spider)",
            cfg.dataset.name
        )));
    }
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::llm::registry::ModelRegistry;

    #[test]
    fn empty_document_yields_defaults() {
        let cfg = parse_config("{}", true).unwrap();
        assert_eq!(cfg.dataset, DatasetConfig::default());
        assert_eq!(cfg.settings.timeout_seconds, 120);
        let registry = ModelRegistry::from_config(&cfg);
        assert_eq!(registry.backend("gpt-4o"), Backend::HostedApi);
        assert_eq!(registry.backend("llama3.1:8b"), Backend::LocalInference);
    }

    #[test]
    fn models_and_splits_are_read() {
        let cfg = parse_config(
            r#"
version: 1
dataset:
  root: /data/spider
  splits:
    train: train_spider_clean.json
models:
  my-model:
    backend: custom
settings:
  timeout_seconds: 5
"#,
            true,
        )
        .unwrap();
        assert_eq!(cfg.models.get("my-model").map(|m| m.backend), Some(Backend::Custom));
        assert_eq!(
            cfg.split_file("train"),
            Some(PathBuf::from("/data/spider/train_spider_clean.json"))
        );
        assert_eq!(cfg.split_file("dev"), None);
        assert_eq!(cfg.settings.timeout_seconds, 5);
        assert_eq!(cfg.settings.sample_rows, 3);
    }

    #[test]
    fn unknown_fields_fail_only_in_strict_mode() {
        let raw = "settings:\n  paralel: 4\n";
        assert!(parse_config(raw, false).is_ok());
        let err = parse_config(raw, true).unwrap_err();
        assert!(err.to_string().contains("paralel"));
    }

    #[test]
    fn unsupported_version_is_rejected() {
        assert!(parse_config("version: 7", false).is_err());
        assert!(parse_config("dataset:\n  name: bird\n", false).is_err());
    }
}
