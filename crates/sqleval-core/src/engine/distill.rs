use crate::config::Prompts;
use crate::engine::evaluator::evaluate;
use crate::errors::DistillError;
use crate::model::{DistillState, DistillationEntry, EvaluationEntry};
use crate::prompt::{clean_sql, extract_final_answer, extract_reasoning, Prompter};
use std::path::Path;

/// Inputs of one distillation instance.
#[derive(Debug, Clone)]
pub struct DistillTask<'a> {
    pub db_id: &'a str,
    pub db_path: &'a Path,
    pub question: &'a str,
    pub gold_sql: &'a str,
    pub schema: &'a str,
}

/// Runs the Generate and Verify steps against the configured prompts.
#[derive(Clone)]
pub struct Distiller {
    prompter: Prompter,
    prompts: Prompts,
}

impl Distiller {
    pub fn new(prompter: Prompter, prompts: Prompts) -> Self {
        Self { prompter, prompts }
    }

    /// Asks `teacher` to explain how the gold query answers the question.
    pub async fn generate(&self, teacher: &str, task: &DistillTask<'_>) -> anyhow::Result<DistillationEntry> {
        let response = self
            .prompter
            .prompt(
                teacher,
                &self.prompts.distillation,
                &[
                    ("problem", task.question),
                    ("solution", task.gold_sql),
                    ("schema", task.schema),
                ],
            )
            .await?;

        let reasoning = extract_reasoning(&response);
        if reasoning.is_fallback() {
            tracing::warn!(
                event = "sqleval.distill.malformed_response",
                model = teacher,
                db_id = task.db_id,
                step = "generate",
                "reasoning markers missing, using whole response"
            );
        }

        Ok(DistillationEntry::generated(
            teacher,
            task.db_id,
            task.question,
            task.schema,
            task.gold_sql,
            reasoning.text(),
        ))
    }

    /// Asks `verifier` to re-derive the query from the reasoning alone, then
    /// checks it against the gold query on `db_path`.
    pub async fn verify(
        &self,
        verifier: &str,
        entry: &mut DistillationEntry,
        db_path: &Path,
    ) -> anyhow::Result<()> {
        if entry.state() != DistillState::Generated {
            return Err(DistillError::AlreadyVerified.into());
        }
        let response = self
            .prompter
            .prompt(
                verifier,
                &self.prompts.verification,
                &[
                    ("problem", entry.question.as_str()),
                    ("schema", entry.schema.as_str()),
                    ("reasoning", entry.reasoning.as_str()),
                ],
            )
            .await?;

        let answer = extract_final_answer(&response);
        if answer.is_fallback() {
            tracing::warn!(
                event = "sqleval.distill.malformed_response",
                model = verifier,
                db_id = %entry.db_id,
                step = "verify",
                "final answer markers missing, using whole response"
            );
        }
        let sql = clean_sql(answer.text());

        let evaluated = evaluate(EvaluationEntry::new(
            db_path,
            entry.question.clone(),
            entry.gold_solution.clone(),
            sql.clone(),
        ));
        let verdict = evaluated
            .verdict()
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("evaluator returned no verdict"))?;

        entry.mark_verified(verifier, sql, &verdict)?;
        tracing::info!(
            event = "sqleval.distill.verified",
            db_id = %entry.db_id,
            verifier,
            verdict = verdict.label(),
            verified = verdict.is_correct(),
            "reasoning verified"
        );
        Ok(())
    }

    /// Generate followed by Verify.
    pub async fn distill(
        &self,
        teacher: &str,
        verifier: &str,
        task: &DistillTask<'_>,
    ) -> anyhow::Result<DistillationEntry> {
        let mut entry = self.generate(teacher, task).await?;
        if let Err(e) = self.verify(verifier, &mut entry, task.db_path).await {
            tracing::warn!(
                event = "sqleval.distill.verify_failed",
                db_id = task.db_id,
                error = %e,
                "verification step failed"
            );
            entry.mark_failed(format!("verification failed: {:#}", e));
        }
        Ok(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::providers::llm::fake::FakeClient;
    use crate::providers::llm::registry::ModelRegistry;
    use rusqlite::Connection;
    use std::collections::BTreeMap;
    use std::sync::Arc;
    use tempfile::tempdir;

    fn distiller(clients: Vec<(&str, FakeClient)>) -> Distiller {
        let registry = Arc::new(ModelRegistry::new(Settings::default(), BTreeMap::new()));
        for (name, c) in clients {
            registry.register(name, Arc::new(c));
        }
        Distiller::new(Prompter::new(registry, 5), Prompts::default())
    }

    fn head_db(dir: &Path) -> anyhow::Result<std::path::PathBuf> {
        let path = dir.join("dept.sqlite");
        let conn = Connection::open(&path)?;
        conn.execute_batch("CREATE TABLE head(age INTEGER); INSERT INTO head VALUES (56), (60), (45);")?;
        Ok(path)
    }

    fn task<'a>(db_path: &'a Path) -> DistillTask<'a> {
        DistillTask {
            db_id: "dept",
            db_path,
            question: "How many heads are older than 56?",
            gold_sql: "SELECT COUNT(*) FROM head WHERE age > 56",
            schema: "CREATE TABLE head(age INTEGER)",
        }
    }

    #[tokio::test]
    async fn verified_when_verifier_reproduces_gold_result() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let db = head_db(dir.path())?;
        let d = distiller(vec![
            ("teacher", FakeClient::new("teacher").with_responses(["<reasoning>Filter age above 56 and count.</reasoning>"])),
            ("verifier", FakeClient::new("verifier").with_responses(["<final answer>```sql\nSELECT count(*) FROM head WHERE 56 < age\n```</final answer>"])),
        ]);

        let entry = d.distill("teacher", "verifier", &task(&db)).await?;
        assert_eq!(entry.reasoning, "Filter age above 56 and count.");
        assert_eq!(entry.is_verified(), Some(true));
        assert_eq!(entry.verification_solution(), "SELECT count(*) FROM head WHERE 56 < age");
        assert_eq!(entry.verifier_model_name, "verifier");
        Ok(())
    }

    #[tokio::test]
    async fn unverified_when_result_differs() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let db = head_db(dir.path())?;
        let d = distiller(vec![
            ("t", FakeClient::new("t").with_responses(["no markers at all"])),
            ("v", FakeClient::new("v").with_responses(["<final answer>SELECT COUNT(*) FROM head WHERE age >= 56</final answer>"])),
        ]);

        let entry = d.distill("t", "v", &task(&db)).await?;
        assert_eq!(entry.reasoning, "no markers at all");
        assert_eq!(entry.is_verified(), Some(false));
        assert_eq!(entry.state(), DistillState::Verified);
        Ok(())
    }

    #[tokio::test]
    async fn verifier_failure_leaves_flag_unset() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let db = head_db(dir.path())?;
        let d = distiller(vec![
            ("t", FakeClient::new("t").with_responses(["<reasoning>r</reasoning>"])),
            ("v", FakeClient::new("v")),
        ]);

        let entry = d.distill("t", "v", &task(&db)).await?;
        assert_eq!(entry.is_verified(), None);
        assert_eq!(entry.state(), DistillState::Failed);
        assert!(entry.failure().unwrap_or_default().contains("verification failed"));
        Ok(())
    }

    #[tokio::test]
    async fn verify_runs_once() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let db = head_db(dir.path())?;
        let model = Arc::new(FakeClient::new("m").with_responses([
            "<reasoning>r</reasoning>",
            "<final answer>SELECT COUNT(*) FROM head WHERE age > 56</final answer>",
            "<final answer>SELECT 0</final answer>",
        ]));
        let registry = Arc::new(ModelRegistry::new(Settings::default(), BTreeMap::new()));
        registry.register("m", model.clone());
        let d = Distiller::new(Prompter::new(registry, 5), Prompts::default());

        let mut entry = d.generate("m", &task(&db)).await?;
        d.verify("m", &mut entry, &db).await?;
        let err = d.verify("m", &mut entry, &db).await.unwrap_err();
        assert!(err.downcast_ref::<DistillError>().is_some());
        assert_eq!(entry.is_verified(), Some(true));
        // the rejected second pass never reached the verifier
        assert_eq!(model.calls(), 2);
        Ok(())
    }
}
