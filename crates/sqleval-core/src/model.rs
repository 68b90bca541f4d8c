use crate::errors::{DistillError, TabularError};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::path::{Path, PathBuf};

/// A single scalar cell as produced by the database engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Value {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl Value {
    fn rank(&self) -> u8 {
        match self {
            Value::Null => 0,
            Value::Integer(_) => 1,
            Value::Real(_) => 2,
            Value::Text(_) => 3,
            Value::Blob(_) => 4,
        }
    }

    /// Total order over values. Values of different types never compare
    /// equal, so `Integer(1)` and `Real(1.0)` are distinct.
    pub fn total_cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Value::Null, Value::Null) => Ordering::Equal,
            (Value::Integer(a), Value::Integer(b)) => a.cmp(b),
            (Value::Real(a), Value::Real(b)) => a.total_cmp(b),
            (Value::Text(a), Value::Text(b)) => a.cmp(b),
            (Value::Blob(a), Value::Blob(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.total_cmp(other) == Ordering::Equal
    }
}

impl Eq for Value {}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Real(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Real(r) => write!(f, "{}", r),
            Value::Text(s) => write!(f, "'{}'", s),
            Value::Blob(b) => write!(f, "<blob {} bytes>", b.len()),
        }
    }
}

/// Rows returned by one query execution. Immutable once built; every row has
/// exactly `columns.len()` values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TabularResult {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl TabularResult {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Result<Self, TabularError> {
        let expected = columns.len();
        for (index, row) in rows.iter().enumerate() {
            if row.len() != expected {
                return Err(TabularError::RaggedRow {
                    index,
                    expected,
                    found: row.len(),
                });
            }
        }
        Ok(Self { columns, rows })
    }

    /// Builds a result with positional column names (`col0`, `col1`, ...),
    /// taking the width from the first row.
    pub fn unnamed(rows: Vec<Vec<Value>>) -> Result<Self, TabularError> {
        let width = rows.first().map(|r| r.len()).unwrap_or(0);
        let columns = (0..width).map(|i| format!("col{}", i)).collect();
        Self::new(columns, rows)
    }

    pub fn empty() -> Self {
        Self {
            columns: Vec::new(),
            rows: Vec::new(),
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuerySide {
    Generated,
    Gold,
}

impl QuerySide {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuerySide::Generated => "generated",
            QuerySide::Gold => "gold",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "generated" => Some(QuerySide::Generated),
            "gold" => Some(QuerySide::Gold),
            _ => None,
        }
    }
}

impl fmt::Display for QuerySide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Correctness classification of one evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "message")]
pub enum Verdict {
    Correct,
    Incorrect,
    ExecutionError(String),
}

impl Verdict {
    pub fn is_correct(&self) -> bool {
        matches!(self, Verdict::Correct)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Verdict::Correct => "correct",
            Verdict::Incorrect => "incorrect",
            Verdict::ExecutionError(_) => "execution_error",
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            Verdict::ExecutionError(m) => Some(m.as_str()),
            _ => None,
        }
    }
}

/// One generated-vs-gold comparison. The verdict is written once by the
/// evaluator; the generated SQL is never touched after construction.
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationEntry {
    pub db_path: PathBuf,
    pub question: String,
    pub gold_sql: String,
    pub generated_sql: String,
    pub response: Option<String>,
    verdict: Option<Verdict>,
    error_side: Option<QuerySide>,
}

impl EvaluationEntry {
    pub fn new(
        db_path: impl Into<PathBuf>,
        question: impl Into<String>,
        gold_sql: impl Into<String>,
        generated_sql: impl Into<String>,
    ) -> Self {
        Self {
            db_path: db_path.into(),
            question: question.into(),
            gold_sql: gold_sql.into(),
            generated_sql: generated_sql.into(),
            response: None,
            verdict: None,
            error_side: None,
        }
    }

    pub fn with_response(mut self, response: impl Into<String>) -> Self {
        self.response = Some(response.into());
        self
    }

    /// Rehydrates an entry that was evaluated earlier (e.g. read back from a report).
    pub fn restored(
        mut self,
        verdict: Option<Verdict>,
        error_side: Option<QuerySide>,
    ) -> Self {
        self.verdict = verdict;
        self.error_side = error_side;
        self
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    pub fn verdict(&self) -> Option<&Verdict> {
        self.verdict.as_ref()
    }

    pub fn error_side(&self) -> Option<QuerySide> {
        self.error_side
    }

    pub fn is_correct(&self) -> bool {
        self.verdict.as_ref().is_some_and(Verdict::is_correct)
    }

    /// Returns false (and leaves the entry untouched) when a verdict is already present.
    pub(crate) fn record_verdict(&mut self, verdict: Verdict, error_side: Option<QuerySide>) -> bool {
        if self.verdict.is_some() {
            return false;
        }
        self.verdict = Some(verdict);
        self.error_side = error_side;
        true
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistillState {
    Generated,
    Verified,
    Failed,
}

/// Reasoning-annotated training example produced by a teacher model.
///
/// `is_verified` is `None` until the verification step has run, after which
/// it holds whether the verifier re-derived SQL matching the gold answer.
#[derive(Debug, Clone, PartialEq)]
pub struct DistillationEntry {
    pub teacher_model_name: String,
    pub verifier_model_name: String,
    pub db_id: String,
    pub question: String,
    pub schema: String,
    pub gold_solution: String,
    pub reasoning: String,
    verification_solution: String,
    is_verified: Option<bool>,
    failure: Option<String>,
}

impl DistillationEntry {
    pub fn generated(
        teacher_model_name: impl Into<String>,
        db_id: impl Into<String>,
        question: impl Into<String>,
        schema: impl Into<String>,
        gold_solution: impl Into<String>,
        reasoning: impl Into<String>,
    ) -> Self {
        Self {
            teacher_model_name: teacher_model_name.into(),
            verifier_model_name: String::new(),
            db_id: db_id.into(),
            question: question.into(),
            schema: schema.into(),
            gold_solution: gold_solution.into(),
            reasoning: reasoning.into(),
            verification_solution: String::new(),
            is_verified: None,
            failure: None,
        }
    }

    /// Placeholder for an instance whose generation or verification raised.
    pub fn failed(
        teacher_model_name: impl Into<String>,
        db_id: impl Into<String>,
        question: impl Into<String>,
        gold_solution: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        let mut entry = Self::generated(
            teacher_model_name,
            db_id,
            question,
            "",
            gold_solution,
            "",
        );
        entry.failure = Some(reason.into());
        entry
    }

    /// Rehydrates a persisted entry without running any transition.
    pub fn restored(
        mut self,
        verifier_model_name: String,
        verification_solution: String,
        is_verified: Option<bool>,
        failure: Option<String>,
    ) -> Self {
        self.verifier_model_name = verifier_model_name;
        self.verification_solution = verification_solution;
        self.is_verified = is_verified;
        self.failure = failure;
        self
    }

    pub fn state(&self) -> DistillState {
        if self.failure.is_some() {
            DistillState::Failed
        } else if self.is_verified.is_some() {
            DistillState::Verified
        } else {
            DistillState::Generated
        }
    }

    pub fn is_verified(&self) -> Option<bool> {
        self.is_verified
    }

    pub fn verification_solution(&self) -> &str {
        &self.verification_solution
    }

    pub fn failure(&self) -> Option<&str> {
        self.failure.as_deref()
    }

    /// The single `Generated -> Verified` transition.
    pub fn mark_verified(
        &mut self,
        verifier_model_name: &str,
        verification_solution: String,
        verdict: &Verdict,
    ) -> Result<(), DistillError> {
        if self.state() != DistillState::Generated {
            return Err(DistillError::AlreadyVerified);
        }
        self.verifier_model_name = verifier_model_name.to_string();
        self.verification_solution = verification_solution;
        self.is_verified = Some(verdict.is_correct());
        Ok(())
    }

    /// Absorbs a step failure. A verified entry keeps its flag.
    pub fn mark_failed(&mut self, reason: impl Into<String>) {
        if self.is_verified.is_none() {
            self.failure = Some(reason.into());
        }
    }
}

/// One benchmark record. Attributes absent from the source are `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpiderInstance {
    pub db_id: Option<String>,
    pub query: Option<String>,
    pub question: Option<String>,
}

impl SpiderInstance {
    pub const ATTRIBUTES: [&'static str; 3] = ["db_id", "query", "question"];
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LlmResponse {
    pub text: String,
    pub provider: String,
    pub model: String,
    #[serde(default)]
    pub meta: serde_json::Value,
}
