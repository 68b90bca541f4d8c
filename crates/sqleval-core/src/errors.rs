use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("config error: {0}")]
pub struct ConfigError(pub String);

/// A SQL statement failed to run: syntax error, missing object, engine fault,
/// or the database itself could not be opened.
#[derive(Debug, Clone, Error, PartialEq)]
#[error("{message}")]
pub struct ExecutionError {
    pub message: String,
}

impl ExecutionError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<rusqlite::Error> for ExecutionError {
    fn from(e: rusqlite::Error) -> Self {
        Self::new(e.to_string())
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum TabularError {
    #[error("row {index} has {found} values, expected {expected}")]
    RaggedRow {
        index: usize,
        expected: usize,
        found: usize,
    },
}

#[derive(Debug, Error, PartialEq)]
pub enum AggregationError {
    #[error("cannot compute accuracy over zero entries")]
    Empty,
}

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("failed to read dataset {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse dataset {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("dataset {path} must contain a JSON array of objects")]
    Shape { path: PathBuf },
    #[error("unsupported dataset '{0}' (supported: spider)")]
    UnknownDataset(String),
    #[error("split '{split}' is not configured for dataset '{dataset}'")]
    UnknownSplit { dataset: String, split: String },
    #[error("instance {index} is missing attribute '{attribute}'")]
    MissingAttribute { index: usize, attribute: &'static str },
}

#[derive(Debug, Error, PartialEq)]
pub enum TemplateError {
    #[error("template placeholder '{{{0}}}' has no argument")]
    MissingArgument(String),
    #[error("unclosed '{{' at byte {0}")]
    Unclosed(usize),
    #[error("unmatched '}}' at byte {0}")]
    Unmatched(usize),
}

#[derive(Debug, Error, PartialEq)]
pub enum DistillError {
    #[error("entry already left the generated state")]
    AlreadyVerified,
}
