mod common;

use common::{dept_database, prompter_with, spider_fixture, COUNT_OLDER};
use serde_json::json;
use sqleval_core::dataset::IndexRange;
use sqleval_core::engine::evaluator::evaluate;
use sqleval_core::engine::runner::{reevaluate, EvalRequest, EvalRunner};
use sqleval_core::errors::AggregationError;
use sqleval_core::model::{EvaluationEntry, QuerySide, Verdict};
use sqleval_core::providers::llm::fake::FakeClient;
use sqleval_core::report::accuracy;
use sqleval_core::storage::tables::{load_evaluations, save_evaluations};
use std::sync::Arc;
use tempfile::tempdir;

fn request(range: IndexRange) -> EvalRequest {
    EvalRequest {
        model: "candidate".into(),
        dataset: "spider".into(),
        split: "train".into(),
        range,
    }
}

#[test]
fn dept_scenario_correct_then_incorrect() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let db = dept_database(dir.path())?;

    let same = evaluate(EvaluationEntry::new(&db, "older than 56?", COUNT_OLDER, COUNT_OLDER));
    assert_eq!(same.verdict(), Some(&Verdict::Correct));

    let off_by_one = "SELECT COUNT(*) FROM head WHERE age >= 56";
    let wrong = evaluate(EvaluationEntry::new(&db, "older than 56?", COUNT_OLDER, off_by_one));
    assert_eq!(wrong.verdict(), Some(&Verdict::Incorrect));
    assert_eq!(wrong.generated_sql, off_by_one);

    assert_eq!(accuracy(&[same, wrong])?, 0.5);
    Ok(())
}

#[test]
fn accuracy_over_nothing_is_an_error() {
    assert_eq!(accuracy(&[]), Err(AggregationError::Empty));
}

#[tokio::test]
async fn batch_continues_past_broken_instances() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let cfg = spider_fixture(
        dir.path(),
        json!([
            {"db_id": "dept", "question": "typo", "query": COUNT_OLDER},
            {"db_id": "dept", "question": "older", "query": COUNT_OLDER},
            {"db_id": "dept", "question": "no gold"},
            {"db_id": "dept", "question": "names", "query": "SELECT name FROM head ORDER BY age"}
        ]),
    )?;

    let model = Arc::new(FakeClient::new("candidate").with_handler(|prompt| {
        Ok(if prompt.contains("Request: typo") {
            "SELEKT * FROM x".to_string()
        } else if prompt.contains("Request: older") {
            format!("```sql\n{}\n```", COUNT_OLDER)
        } else {
            "SELECT name FROM head ORDER BY age DESC".to_string()
        })
    }));
    let runner = EvalRunner::new(cfg.clone(), prompter_with(&cfg, &[("candidate", model.clone())]));

    let entries = runner.run(&request(IndexRange::default())).await?;
    assert_eq!(entries.len(), 4);

    assert!(matches!(entries[0].verdict(), Some(Verdict::ExecutionError(_))));
    assert_eq!(entries[0].error_side(), Some(QuerySide::Generated));
    assert_eq!(entries[0].generated_sql, "SELEKT * FROM x");

    assert_eq!(entries[1].verdict(), Some(&Verdict::Correct));
    assert_eq!(entries[1].generated_sql, COUNT_OLDER);

    let missing = entries[2].verdict().and_then(|v| v.error_message()).unwrap_or_default();
    assert!(missing.contains("query"), "{}", missing);

    // rows in a different order are judged incorrect
    assert_eq!(entries[3].verdict(), Some(&Verdict::Incorrect));

    // the instance without gold SQL never reached the model
    assert_eq!(model.calls(), 3);

    let prompt = &model.prompts()[1];
    assert!(prompt.contains("CREATE TABLE head ("));
    assert!(prompt.contains("'Ann'"));
    Ok(())
}

#[tokio::test]
async fn index_range_limits_the_batch() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let items: Vec<_> = (0..5)
        .map(|i| json!({"db_id": "dept", "question": format!("q{}", i), "query": COUNT_OLDER}))
        .collect();
    let cfg = spider_fixture(dir.path(), json!(items))?;

    let model = Arc::new(FakeClient::new("candidate").with_handler(|_| Ok(COUNT_OLDER.to_string())));
    let runner = EvalRunner::new(cfg.clone(), prompter_with(&cfg, &[("candidate", model.clone())]));

    let entries = runner.run(&request(IndexRange::new(Some(1), Some(3)))).await?;
    let questions: Vec<_> = entries.iter().map(|e| e.question.as_str()).collect();
    assert_eq!(questions, ["q1", "q2", "q3"]);
    assert_eq!(model.calls(), 3);
    Ok(())
}

#[tokio::test]
async fn missing_split_file_aborts_the_run() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let mut cfg = spider_fixture(dir.path(), json!([]))?;
    cfg.dataset.root = dir.path().join("nowhere");

    let runner = EvalRunner::new(cfg.clone(), prompter_with(&cfg, &[]));
    let err = runner.run(&request(IndexRange::default())).await.unwrap_err();
    assert!(format!("{:#}", err).contains("failed to read dataset"));
    Ok(())
}

#[tokio::test]
async fn reevaluation_retrieves_sql_from_raw_responses() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let db = dept_database(dir.path())?;

    let chatty = EvaluationEntry::new(&db, "older", COUNT_OLDER, "Sure! The answer is SELECT COUNT(*) FROM head WHERE age > 56")
        .with_response("Sure! The answer is SELECT COUNT(*) FROM head WHERE age > 56");
    let good = EvaluationEntry::new(&db, "older", COUNT_OLDER, COUNT_OLDER);
    let report = dir.path().join("candidate_spider_result.csv");
    save_evaluations(&report, &[evaluate(chatty), evaluate(good)])?;
    let entries = load_evaluations(&report)?;
    assert!(matches!(entries[0].verdict(), Some(Verdict::ExecutionError(_))));

    let cfg = sqleval_core::config::Config::default();
    let retriever = Arc::new(FakeClient::new("retriever").with_responses([format!("```sql\n{}\n```", COUNT_OLDER)]));
    let prompter = prompter_with(&cfg, &[("retriever", retriever.clone())]);

    let fresh = reevaluate(&prompter, &cfg.prompts.retrieval, "retriever", &entries).await;
    assert_eq!(fresh.len(), 2);
    assert_eq!(fresh[0].verdict(), Some(&Verdict::Correct));
    assert_eq!(fresh[1], entries[1]);
    assert_eq!(retriever.calls(), 1);
    assert!(retriever.prompts()[0].contains("Sure! The answer is"));

    // the loaded entry keeps its original verdict
    assert!(matches!(entries[0].verdict(), Some(Verdict::ExecutionError(_))));
    Ok(())
}
