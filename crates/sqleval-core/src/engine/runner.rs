use crate::cache::key::CacheKey;
use crate::cache::{CachePolicy, ResultCache};
use crate::config::Config;
use crate::dataset::{database_path, load_split, IndexRange, ResolvedInstance};
use crate::engine::distill::{DistillTask, Distiller};
use crate::engine::evaluator::evaluate;
use crate::model::{DistillationEntry, EvaluationEntry, QuerySide, SpiderInstance, Verdict};
use crate::prompt::{clean_sql, Prompter};
use crate::schema::describe_schema;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct EvalRequest {
    pub model: String,
    pub dataset: String,
    pub split: String,
    pub range: IndexRange,
}

/// Generates SQL for every in-range instance of a split and judges it.
pub struct EvalRunner {
    pub config: Config,
    pub prompter: Prompter,
}

impl EvalRunner {
    pub fn new(config: Config, prompter: Prompter) -> Self {
        Self { config, prompter }
    }

    /// Only a missing or unreadable split aborts the run; instance failures
    /// are recorded as `ExecutionError` verdicts.
    pub async fn run(&self, req: &EvalRequest) -> anyhow::Result<Vec<EvaluationEntry>> {
        let instances = load_split(&self.config, &req.dataset, &req.split)?;
        let mut entries = Vec::new();

        for (index, inst) in instances.iter().enumerate() {
            if !req.range.contains(index) {
                continue;
            }
            let entry = match self.run_instance(index, inst, req).await {
                Ok(e) => e,
                Err(e) => {
                    let reason = format!("{:#}", e);
                    tracing::warn!(
                        event = "sqleval.eval.instance_failed",
                        index,
                        error = %reason,
                        "instance failed, recording execution error"
                    );
                    self.failed_entry(inst, &req.split, reason)
                }
            };
            tracing::info!(
                event = "sqleval.eval.entry",
                index,
                verdict = entry.verdict().map(|v| v.label()).unwrap_or("none"),
                "instance evaluated"
            );
            entries.push(entry);
        }
        Ok(entries)
    }

    async fn run_instance(
        &self,
        index: usize,
        inst: &SpiderInstance,
        req: &EvalRequest,
    ) -> anyhow::Result<EvaluationEntry> {
        let resolved = ResolvedInstance::resolve(index, inst, &self.config.dataset.root, &req.split)?;
        let settings = &self.config.settings;
        let schema = describe_schema(&resolved.db_path, settings.include_sample_rows, settings.sample_rows)?
            .format_for_prompt();
        let db_path = resolved.db_path.to_string_lossy();

        let response = self
            .prompter
            .prompt(
                &req.model,
                &self.config.prompts.generation,
                &[
                    ("request", resolved.question.as_str()),
                    ("schema", schema.as_str()),
                    ("db_path", &*db_path),
                ],
            )
            .await?;
        let sql = clean_sql(&response);

        let entry = EvaluationEntry::new(resolved.db_path, resolved.question, resolved.gold_sql, sql)
            .with_response(response);
        Ok(evaluate(entry))
    }

    fn failed_entry(&self, inst: &SpiderInstance, split: &str, reason: String) -> EvaluationEntry {
        let db_path = inst
            .db_id
            .as_deref()
            .map(|id| database_path(&self.config.dataset.root, id, split))
            .unwrap_or_default();
        let mut entry = EvaluationEntry::new(
            db_path,
            inst.question.clone().unwrap_or_default(),
            inst.query.clone().unwrap_or_default(),
            String::new(),
        );
        entry.record_verdict(Verdict::ExecutionError(reason), Some(QuerySide::Generated));
        entry
    }
}

#[derive(Debug, Clone)]
pub struct DistillRequest {
    pub teacher: String,
    /// Defaults to the teacher.
    pub verifier: Option<String>,
    pub dataset: String,
    pub split: String,
    pub range: IndexRange,
    pub policy: CachePolicy,
}

impl DistillRequest {
    pub fn verifier(&self) -> &str {
        self.verifier.as_deref().unwrap_or(self.teacher.as_str())
    }

    /// The cache holds whole splits only, so a range-limited run neither
    /// reads nor writes it.
    pub fn effective_policy(&self) -> CachePolicy {
        if self.range == IndexRange::default() {
            self.policy
        } else {
            CachePolicy::Disabled
        }
    }

    pub fn cache_key(&self) -> CacheKey {
        CacheKey::new(&self.teacher, &self.dataset, &self.split)
    }
}

#[derive(Debug, Clone)]
pub struct DistillOutcome {
    pub entries: Vec<DistillationEntry>,
    pub from_cache: bool,
    pub cache_path: Option<PathBuf>,
}

/// Batch driver for distillation with a full-result cache in front of it.
pub struct DistillRunner {
    pub config: Config,
    pub distiller: Distiller,
    pub cache: ResultCache,
}

impl DistillRunner {
    pub fn new(config: Config, prompter: Prompter) -> Self {
        let distiller = Distiller::new(prompter, config.prompts.clone());
        let cache = ResultCache::new(config.cache_dir.clone());
        Self {
            config,
            distiller,
            cache,
        }
    }

    pub async fn run(&self, req: &DistillRequest) -> anyhow::Result<DistillOutcome> {
        let key = req.cache_key();
        let policy = req.effective_policy();
        if policy != req.policy {
            tracing::info!(
                event = "sqleval.cache.bypass",
                start = ?req.range.start,
                end = ?req.range.end,
                "index range set, result cache not used"
            );
        }
        if policy.reads() {
            if let Some(entries) = self.cache.get(&key)? {
                let path = self.cache.path_for(&key);
                tracing::info!(
                    event = "sqleval.cache.hit",
                    path = %path.display(),
                    entries = entries.len(),
                    "serving distillation from cache"
                );
                return Ok(DistillOutcome {
                    entries,
                    from_cache: true,
                    cache_path: Some(path),
                });
            }
            tracing::info!(event = "sqleval.cache.miss", key = %key.file_name(), "no cached distillation");
        }

        let instances = load_split(&self.config, &req.dataset, &req.split)?;
        let mut entries = Vec::new();
        for (index, inst) in instances.iter().enumerate() {
            if !req.range.contains(index) {
                continue;
            }
            let entry = match self.run_instance(index, inst, req).await {
                Ok(e) => e,
                Err(e) => {
                    let reason = format!("{:#}", e);
                    tracing::warn!(
                        event = "sqleval.distill.instance_failed",
                        index,
                        error = %reason,
                        "instance failed, recording placeholder"
                    );
                    DistillationEntry::failed(
                        &req.teacher,
                        inst.db_id.clone().unwrap_or_default(),
                        inst.question.clone().unwrap_or_default(),
                        inst.query.clone().unwrap_or_default(),
                        reason,
                    )
                }
            };
            entries.push(entry);
        }

        let cache_path = if policy.writes() {
            let path = self.cache.put(&key, &entries)?;
            tracing::info!(event = "sqleval.cache.write", path = %path.display(), entries = entries.len(), "cached distillation");
            Some(path)
        } else {
            None
        };

        Ok(DistillOutcome {
            entries,
            from_cache: false,
            cache_path,
        })
    }

    async fn run_instance(
        &self,
        index: usize,
        inst: &SpiderInstance,
        req: &DistillRequest,
    ) -> anyhow::Result<DistillationEntry> {
        let resolved = ResolvedInstance::resolve(index, inst, &self.config.dataset.root, &req.split)?;
        let settings = &self.config.settings;
        let schema = describe_schema(&resolved.db_path, settings.include_sample_rows, settings.sample_rows)?
            .format_for_prompt();
        tracing::debug!(index, db_id = %resolved.db_id, question = %resolved.question, "distilling instance");

        let task = DistillTask {
            db_id: &resolved.db_id,
            db_path: &resolved.db_path,
            question: &resolved.question,
            gold_sql: &resolved.gold_sql,
            schema: &schema,
        };
        self.distiller.distill(&req.teacher, req.verifier(), &task).await
    }
}

/// Re-judges every entry that is not already correct, letting `model` pull
/// the SQL out of the raw response first. Produces fresh entries; correct
/// entries are carried over as they are.
pub async fn reevaluate(
    prompter: &Prompter,
    retrieval_template: &str,
    model: &str,
    entries: &[EvaluationEntry],
) -> Vec<EvaluationEntry> {
    let mut out = Vec::with_capacity(entries.len());
    for (index, entry) in entries.iter().enumerate() {
        if entry.is_correct() {
            out.push(entry.clone());
            continue;
        }
        let source = entry.response.as_deref().unwrap_or(&entry.generated_sql);
        let retrieved = match prompter
            .prompt(model, retrieval_template, &[("response", source)])
            .await
        {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(
                    event = "sqleval.reevaluate.retrieval_failed",
                    index,
                    error = ?e,
                    "keeping previous verdict"
                );
                out.push(entry.clone());
                continue;
            }
        };

        let fresh = EvaluationEntry::new(
            entry.db_path.clone(),
            entry.question.clone(),
            entry.gold_sql.clone(),
            clean_sql(&retrieved),
        )
        .with_response(source);
        out.push(evaluate(fresh));
    }
    out
}
