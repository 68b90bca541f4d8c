//! Instruction-tuning export of distilled reasoning.

use crate::errors::TemplateError;
use crate::model::DistillationEntry;
use crate::prompt::{render, ANSWER_CLOSE, ANSWER_OPEN};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlpacaRecord {
    pub instruction: String,
    pub input: String,
    pub output: String,
}

/// Converts entries to Alpaca records. The output pairs the teacher's
/// reasoning with the gold query as final answer.
pub fn to_alpaca(
    entries: &[DistillationEntry],
    instruction_template: &str,
    only_verified: bool,
) -> Result<Vec<AlpacaRecord>, TemplateError> {
    entries
        .iter()
        .filter(|e| e.failure().is_none())
        .filter(|e| !only_verified || e.is_verified() == Some(true))
        .map(|e| {
            let instruction = render(
                instruction_template,
                &[("request", &e.question), ("schema", &e.schema)],
            )?;
            Ok(AlpacaRecord {
                instruction,
                input: String::new(),
                output: format!("{}\n{}{}{}", e.reasoning, ANSWER_OPEN, e.gold_solution, ANSWER_CLOSE),
            })
        })
        .collect()
}

/// Writes `records` as a pretty-printed JSON array.
pub fn save_alpaca(path: &Path, records: &[AlpacaRecord]) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(records)?;
    std::fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Verdict;

    #[test]
    fn only_verified_entries_are_exported_by_default() {
        let mut good = DistillationEntry::generated("t", "db", "How many?", "CREATE TABLE head(age)", "SELECT COUNT(*) FROM head", "Count rows.");
        good.mark_verified("v", "SELECT COUNT(*) FROM head".into(), &Verdict::Correct).unwrap();
        let mut bad = DistillationEntry::generated("t", "db", "q", "s", "SELECT 1", "r");
        bad.mark_verified("v", "SELECT 2".into(), &Verdict::Incorrect).unwrap();

        let out = to_alpaca(&[good.clone(), bad.clone()], "{request} | {schema}", true).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].instruction, "How many? | CREATE TABLE head(age)");
        assert_eq!(
            out[0].output,
            "Count rows.\n<final answer>SELECT COUNT(*) FROM head</final answer>"
        );

        assert_eq!(to_alpaca(&[good, bad], "{request}", false).unwrap().len(), 2);
    }
}
