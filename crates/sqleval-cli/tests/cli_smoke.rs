use assert_cmd::Command;
use predicates::prelude::*;
use predicates::str::contains;
use rusqlite::Connection;
use sqleval_core::model::{EvaluationEntry, Verdict};
use sqleval_core::storage::tables::save_evaluations;
use std::fs;
use tempfile::TempDir;

fn sqleval(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("sqleval").unwrap();
    cmd.current_dir(dir.path()).env_remove("SQLEVAL_SPIDER_ROOT");
    cmd
}

#[test]
fn version_prints_package_version() {
    let dir = TempDir::new().unwrap();
    sqleval(&dir)
        .arg("version")
        .assert()
        .success()
        .stdout(contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn schema_prints_tables_and_samples() {
    let dir = TempDir::new().unwrap();
    let db = dir.path().join("dept.sqlite");
    let conn = Connection::open(&db).unwrap();
    conn.execute_batch("CREATE TABLE head (age INTEGER); INSERT INTO head VALUES (56), (60);")
        .unwrap();
    drop(conn);

    sqleval(&dir)
        .args(["schema", "--db"])
        .arg(&db)
        .assert()
        .success()
        .stdout(contains("CREATE TABLE head ("))
        .stdout(contains("60"));

    sqleval(&dir)
        .args(["schema", "--no-samples", "--db"])
        .arg(&db)
        .assert()
        .success()
        .stdout(contains("sample rows").not());
}

#[test]
fn report_summarizes_an_evaluation_csv() {
    let dir = TempDir::new().unwrap();
    let csv = dir.path().join("m_spider_result.csv");
    let entries = vec![
        EvaluationEntry::new("a.sqlite", "q1", "SELECT 1", "SELECT 1").restored(Some(Verdict::Correct), None),
        EvaluationEntry::new("a.sqlite", "q2", "SELECT 1", "SELECT 2").restored(Some(Verdict::Incorrect), None),
    ];
    save_evaluations(&csv, &entries).unwrap();

    sqleval(&dir)
        .args(["report", "--input"])
        .arg(&csv)
        .assert()
        .success()
        .stdout(contains("\"accuracy\": 0.5"))
        .stderr(contains("Accuracy: 0.5000"));
}

#[test]
fn missing_dataset_is_fatal() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("sqleval.yaml"),
        "version: 1\ndataset:\n  root: does-not-exist\n",
    )
    .unwrap();

    sqleval(&dir)
        .args(["eval", "--model", "local-model"])
        .assert()
        .code(2)
        .stderr(contains("failed to read dataset"));
}

#[test]
fn explicit_config_must_exist() {
    let dir = TempDir::new().unwrap();
    sqleval(&dir)
        .args(["--config", "missing.yaml", "schema", "--db", "x.sqlite"])
        .assert()
        .code(2)
        .stderr(contains("failed to read config"));
}
