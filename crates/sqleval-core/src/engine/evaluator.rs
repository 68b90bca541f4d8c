use crate::engine::compare::{first_difference, results_match};
use crate::engine::executor::{open_database, run_query};
use crate::errors::ExecutionError;
use crate::model::{EvaluationEntry, QuerySide, TabularResult, Verdict};
use rusqlite::Connection;

/// Evaluates `entry` on a connection opened for this call and released
/// before returning. Entries that already carry a verdict are returned as is.
pub fn evaluate(entry: EvaluationEntry) -> EvaluationEntry {
    if entry.verdict().is_some() {
        return entry;
    }
    match open_database(entry.db_path()) {
        Ok(conn) => evaluate_on(entry, &conn),
        Err(e) => {
            let verdict = Verdict::ExecutionError(e.message.clone());
            record(entry, verdict, Some(QuerySide::Generated), Some(&e))
        }
    }
}

/// Evaluates `entry` on a caller-owned connection, which stays open.
pub fn evaluate_on(entry: EvaluationEntry, conn: &Connection) -> EvaluationEntry {
    if entry.verdict().is_some() {
        return entry;
    }
    tracing::debug!(
        question = %entry.question,
        gold_sql = %entry.gold_sql,
        generated_sql = %entry.generated_sql,
        "evaluating entry"
    );

    let (verdict, side) = judge(conn, &entry.generated_sql, &entry.gold_sql);
    let err = verdict.error_message().map(ExecutionError::new);
    record(entry, verdict, side, err.as_ref())
}

/// Runs generated then gold SQL and compares the results.
pub fn judge(conn: &Connection, generated_sql: &str, gold_sql: &str) -> (Verdict, Option<QuerySide>) {
    let generated = match run_query(conn, generated_sql) {
        Ok(r) => r,
        Err(e) => return (Verdict::ExecutionError(e.message), Some(QuerySide::Generated)),
    };
    let gold = match run_query(conn, gold_sql) {
        Ok(r) => r,
        Err(e) => return (Verdict::ExecutionError(e.message), Some(QuerySide::Gold)),
    };
    (compare(&generated, &gold), None)
}

fn compare(generated: &TabularResult, gold: &TabularResult) -> Verdict {
    if results_match(generated, gold) {
        return Verdict::Correct;
    }
    if let Some(diff) = first_difference(generated, gold) {
        tracing::debug!(
            generated_rows = generated.len(),
            gold_rows = gold.len(),
            diff = %diff,
            "result sets differ"
        );
    }
    Verdict::Incorrect
}

fn record(
    mut entry: EvaluationEntry,
    verdict: Verdict,
    side: Option<QuerySide>,
    err: Option<&ExecutionError>,
) -> EvaluationEntry {
    match (&verdict, side, err) {
        (Verdict::ExecutionError(_), Some(side), Some(e)) => tracing::warn!(
            event = "sqleval.eval.execution_error",
            side = %side,
            db = %entry.db_path.display(),
            error = %e,
            "query execution failed"
        ),
        _ => tracing::info!(
            event = "sqleval.eval.verdict",
            verdict = verdict.label(),
            db = %entry.db_path.display(),
        ),
    }
    entry.record_verdict(verdict, side);
    entry
}
