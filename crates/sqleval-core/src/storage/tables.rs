//! Row-oriented CSV persistence for evaluation and distillation reports.

use crate::model::{DistillationEntry, EvaluationEntry, QuerySide, Verdict};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

#[derive(Debug, Serialize, Deserialize)]
struct EvaluationRow {
    db_path: String,
    question: String,
    gold_sql: String,
    generated_sql: String,
    response: Option<String>,
    verdict: String,
    error_side: Option<String>,
    error: Option<String>,
}

impl From<&EvaluationEntry> for EvaluationRow {
    fn from(e: &EvaluationEntry) -> Self {
        Self {
            db_path: e.db_path.to_string_lossy().into_owned(),
            question: e.question.clone(),
            gold_sql: e.gold_sql.clone(),
            generated_sql: e.generated_sql.clone(),
            response: e.response.clone(),
            verdict: e.verdict().map(|v| v.label()).unwrap_or_default().to_string(),
            error_side: e.error_side().map(|s| s.as_str().to_string()),
            error: e.verdict().and_then(|v| v.error_message()).map(String::from),
        }
    }
}

impl EvaluationRow {
    fn into_entry(self) -> anyhow::Result<EvaluationEntry> {
        let verdict = match self.verdict.as_str() {
            "" => None,
            "correct" => Some(Verdict::Correct),
            "incorrect" => Some(Verdict::Incorrect),
            "execution_error" => Some(Verdict::ExecutionError(self.error.unwrap_or_default())),
            other => anyhow::bail!("unknown verdict '{}'", other),
        };
        let side = self.error_side.as_deref().and_then(QuerySide::parse);
        let mut entry = EvaluationEntry::new(
            PathBuf::from(self.db_path),
            self.question,
            self.gold_sql,
            self.generated_sql,
        );
        entry.response = self.response;
        Ok(entry.restored(verdict, side))
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct DistillationRow {
    teacher_model_name: String,
    verifier_model_name: String,
    db_id: String,
    question: String,
    schema: String,
    gold_solution: String,
    reasoning: String,
    verification_solution: String,
    is_verified: Option<bool>,
    failure: Option<String>,
}

impl From<&DistillationEntry> for DistillationRow {
    fn from(e: &DistillationEntry) -> Self {
        Self {
            teacher_model_name: e.teacher_model_name.clone(),
            verifier_model_name: e.verifier_model_name.clone(),
            db_id: e.db_id.clone(),
            question: e.question.clone(),
            schema: e.schema.clone(),
            gold_solution: e.gold_solution.clone(),
            reasoning: e.reasoning.clone(),
            verification_solution: e.verification_solution().to_string(),
            is_verified: e.is_verified(),
            failure: e.failure().map(String::from),
        }
    }
}

impl From<DistillationRow> for DistillationEntry {
    fn from(r: DistillationRow) -> Self {
        DistillationEntry::generated(
            r.teacher_model_name,
            r.db_id,
            r.question,
            r.schema,
            r.gold_solution,
            r.reasoning,
        )
        .restored(
            r.verifier_model_name,
            r.verification_solution,
            r.is_verified,
            r.failure,
        )
    }
}

pub fn write_evaluations<W: Write>(w: W, entries: &[EvaluationEntry]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_writer(w);
    for e in entries {
        wtr.serialize(EvaluationRow::from(e))?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn read_evaluations<R: Read>(r: R) -> anyhow::Result<Vec<EvaluationEntry>> {
    let mut rdr = csv::Reader::from_reader(r);
    let mut out = Vec::new();
    for (i, row) in rdr.deserialize::<EvaluationRow>().enumerate() {
        let row = row.with_context(|| format!("malformed evaluation row {}", i + 1))?;
        out.push(row.into_entry()?);
    }
    Ok(out)
}

pub fn write_distillations<W: Write>(w: W, entries: &[DistillationEntry]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_writer(w);
    for e in entries {
        wtr.serialize(DistillationRow::from(e))?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn read_distillations<R: Read>(r: R) -> anyhow::Result<Vec<DistillationEntry>> {
    let mut rdr = csv::Reader::from_reader(r);
    let mut out = Vec::new();
    for (i, row) in rdr.deserialize::<DistillationRow>().enumerate() {
        let row = row.with_context(|| format!("malformed distillation row {}", i + 1))?;
        out.push(row.into());
    }
    Ok(out)
}

pub fn distillations_to_string(entries: &[DistillationEntry]) -> anyhow::Result<String> {
    let mut buf = Vec::new();
    write_distillations(&mut buf, entries)?;
    Ok(String::from_utf8(buf)?)
}

pub fn save_evaluations(path: &Path, entries: &[EvaluationEntry]) -> anyhow::Result<()> {
    let f = create(path)?;
    write_evaluations(f, entries)
}

pub fn load_evaluations(path: &Path) -> anyhow::Result<Vec<EvaluationEntry>> {
    let f = std::fs::File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    read_evaluations(f).with_context(|| format!("failed to read {}", path.display()))
}

pub fn save_distillations(path: &Path, entries: &[DistillationEntry]) -> anyhow::Result<()> {
    let f = create(path)?;
    write_distillations(f, entries)
}

pub fn load_distillations(path: &Path) -> anyhow::Result<Vec<DistillationEntry>> {
    let f = std::fs::File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    read_distillations(f).with_context(|| format!("failed to read {}", path.display()))
}

fn create(path: &Path) -> anyhow::Result<std::fs::File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.display()))?;
    }
    std::fs::File::create(path).with_context(|| format!("failed to write {}", path.display()))
}

/// `:` and `/` in model identifiers are not file-name safe.
pub fn sanitize_model_name(model: &str) -> String {
    model.replace([':', '/', '\\'], "-")
}

pub fn evaluation_file_name(model: &str, dataset: &str) -> String {
    format!("{}_{}_result.csv", sanitize_model_name(model), dataset)
}

pub fn distillation_file_name(model: &str, dataset: &str, split: &str) -> String {
    format!("{}_{}_{}_distilled.csv", sanitize_model_name(model), dataset, split)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evaluation_rows_keep_verdict_and_error() -> anyhow::Result<()> {
        let ok = EvaluationEntry::new("db/a.sqlite", "q1", "SELECT 1", "SELECT 1")
            .with_response("```sql\nSELECT 1\n```")
            .restored(Some(Verdict::Correct), None);
        let bad = EvaluationEntry::new("db/a.sqlite", "q2, with comma", "SELECT 1", "SELEKT")
            .restored(
                Some(Verdict::ExecutionError("near \"SELEKT\": syntax error".into())),
                Some(QuerySide::Generated),
            );

        let mut buf = Vec::new();
        write_evaluations(&mut buf, &[ok.clone(), bad.clone()])?;
        let text = String::from_utf8(buf.clone())?;
        assert!(text.starts_with("db_path,question,gold_sql,generated_sql,response,verdict,error_side,error"));

        let back = read_evaluations(buf.as_slice())?;
        assert_eq!(back, vec![ok, bad]);
        Ok(())
    }

    #[test]
    fn unverified_flag_is_an_empty_cell() -> anyhow::Result<()> {
        let pending = DistillationEntry::generated("t", "dept", "q", "schema", "SELECT 1", "r");
        let text = distillations_to_string(&[pending.clone()])?;
        assert!(text.lines().nth(1).unwrap_or_default().ends_with(",,"));

        let back = read_distillations(text.as_bytes())?;
        assert_eq!(back[0].is_verified(), None);
        assert_eq!(back, vec![pending]);
        Ok(())
    }

    #[test]
    fn file_names_are_sanitized() {
        assert_eq!(
            evaluation_file_name("llama3.1:8b-instruct-q4_0", "spider"),
            "llama3.1-8b-instruct-q4_0_spider_result.csv"
        );
        assert_eq!(
            distillation_file_name("org/model:7b", "spider", "train"),
            "org-model-7b_spider_train_distilled.csv"
        );
    }
}
