pub mod alpaca;
pub mod console;

use crate::errors::AggregationError;
use crate::model::{DistillationEntry, EvaluationEntry, Verdict};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvalSummary {
    pub total: usize,
    pub correct: usize,
    pub incorrect: usize,
    pub execution_errors: usize,
    pub accuracy: Option<f64>,
    pub generated_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistillSummary {
    pub total: usize,
    pub verified: usize,
    pub rejected: usize,
    pub pending: usize,
    pub failed: usize,
    pub verification_rate: Option<f64>,
    pub generated_at: String,
}

/// Share of entries whose verdict is `Correct`.
pub fn accuracy(entries: &[EvaluationEntry]) -> Result<f64, AggregationError> {
    if entries.is_empty() {
        return Err(AggregationError::Empty);
    }
    let correct = entries.iter().filter(|e| e.is_correct()).count();
    Ok(correct as f64 / entries.len() as f64)
}

/// Share of distillation entries whose reasoning was verified.
pub fn verification_rate(entries: &[DistillationEntry]) -> Result<f64, AggregationError> {
    if entries.is_empty() {
        return Err(AggregationError::Empty);
    }
    let verified = entries.iter().filter(|e| e.is_verified() == Some(true)).count();
    Ok(verified as f64 / entries.len() as f64)
}

pub fn summarize_evaluations(entries: &[EvaluationEntry]) -> EvalSummary {
    let mut s = EvalSummary {
        total: entries.len(),
        correct: 0,
        incorrect: 0,
        execution_errors: 0,
        accuracy: accuracy(entries).ok(),
        generated_at: chrono::Utc::now().to_rfc3339(),
    };
    for e in entries {
        match e.verdict() {
            Some(Verdict::Correct) => s.correct += 1,
            Some(Verdict::ExecutionError(_)) => s.execution_errors += 1,
            Some(Verdict::Incorrect) | None => s.incorrect += 1,
        }
    }
    s
}

pub fn summarize_distillations(entries: &[DistillationEntry]) -> DistillSummary {
    let mut s = DistillSummary {
        total: entries.len(),
        verified: 0,
        rejected: 0,
        pending: 0,
        failed: 0,
        verification_rate: verification_rate(entries).ok(),
        generated_at: chrono::Utc::now().to_rfc3339(),
    };
    for e in entries {
        if e.failure().is_some() {
            s.failed += 1;
            continue;
        }
        match e.is_verified() {
            Some(true) => s.verified += 1,
            Some(false) => s.rejected += 1,
            None => s.pending += 1,
        }
    }
    s
}
