use crate::config::Config;
use crate::errors::DatasetError;
use crate::model::SpiderInstance;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

/// Reads a JSON array of objects, keeping only `attributes`. Keys missing
/// from a record are filled with `null` and reported with a warning; the
/// record is kept.
pub fn load_json_records(
    path: &Path,
    attributes: &[&str],
) -> Result<Vec<Map<String, Value>>, DatasetError> {
    let raw = std::fs::read_to_string(path).map_err(|source| DatasetError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let data: Value = serde_json::from_str(&raw).map_err(|source| DatasetError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    let Value::Array(items) = data else {
        return Err(DatasetError::Shape {
            path: path.to_path_buf(),
        });
    };

    let mut out = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        let Value::Object(obj) = item else {
            return Err(DatasetError::Shape {
                path: path.to_path_buf(),
            });
        };
        let mut record = Map::new();
        for attr in attributes {
            match obj.get(*attr) {
                Some(v) => {
                    record.insert(attr.to_string(), v.clone());
                }
                None => {
                    tracing::warn!(
                        index,
                        attribute = *attr,
                        "attribute missing in JSON data, set to null"
                    );
                    record.insert(attr.to_string(), Value::Null);
                }
            }
        }
        out.push(record);
    }
    Ok(out)
}

pub fn load_spider_file(path: &Path) -> Result<Vec<SpiderInstance>, DatasetError> {
    let records = load_json_records(path, &SpiderInstance::ATTRIBUTES)?;
    Ok(records
        .into_iter()
        .map(|r| SpiderInstance {
            db_id: text(&r, "db_id"),
            query: text(&r, "query"),
            question: text(&r, "question"),
        })
        .collect())
}

fn text(record: &Map<String, Value>, key: &str) -> Option<String> {
    match record.get(key)? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Loads the benchmark split configured for `dataset`.
pub fn load_split(cfg: &Config, dataset: &str, split: &str) -> Result<Vec<SpiderInstance>, DatasetError> {
    if dataset != cfg.dataset.name {
        return Err(DatasetError::UnknownDataset(dataset.to_string()));
    }
    let path = cfg.split_file(split).ok_or_else(|| DatasetError::UnknownSplit {
        dataset: dataset.to_string(),
        split: split.to_string(),
    })?;
    let instances = load_spider_file(&path)?;
    tracing::info!(dataset, split, path = %path.display(), instances = instances.len(), "loaded benchmark split");
    Ok(instances)
}

/// Location of the single-file database for `db_id`. The training split
/// ships its databases under `database/`, every other split under `test_database/`.
pub fn database_path(root: &Path, db_id: &str, split: &str) -> PathBuf {
    let dir = if split == "train" {
        "database"
    } else {
        "test_database"
    };
    root.join(dir).join(db_id).join(format!("{}.sqlite", db_id))
}

/// A benchmark instance with every attribute needed for generation present.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedInstance {
    pub index: usize,
    pub db_id: String,
    pub db_path: PathBuf,
    pub question: String,
    pub gold_sql: String,
}

impl ResolvedInstance {
    pub fn resolve(
        index: usize,
        instance: &SpiderInstance,
        root: &Path,
        split: &str,
    ) -> Result<Self, DatasetError> {
        let missing = |attribute| DatasetError::MissingAttribute { index, attribute };
        let db_id = instance.db_id.clone().ok_or_else(|| missing("db_id"))?;
        let question = instance.question.clone().ok_or_else(|| missing("question"))?;
        let gold_sql = instance.query.clone().ok_or_else(|| missing("query"))?;
        Ok(Self {
            index,
            db_path: database_path(root, &db_id, split),
            db_id,
            question,
            gold_sql,
        })
    }
}

/// Inclusive index window over a split. Open ends are unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IndexRange {
    pub start: Option<usize>,
    pub end: Option<usize>,
}

impl IndexRange {
    pub fn new(start: Option<usize>, end: Option<usize>) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, index: usize) -> bool {
        self.start.map_or(true, |s| index >= s) && self.end.map_or(true, |e| index <= e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn missing_attributes_become_none() -> anyhow::Result<()> {
        let mut tmp = NamedTempFile::new()?;
        write!(
            tmp,
            r#"[
              {{"db_id": "dept", "query": "SELECT 1", "question": "q", "query_toks": ["SELECT"]}},
              {{"db_id": "dept", "question": "no query"}}
            ]"#
        )?;

        let items = load_spider_file(tmp.path())?;
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].query.as_deref(), Some("SELECT 1"));
        assert_eq!(items[1].query, None);
        assert_eq!(items[1].question.as_deref(), Some("no query"));
        Ok(())
    }

    #[test]
    fn non_array_is_rejected() -> anyhow::Result<()> {
        let mut tmp = NamedTempFile::new()?;
        write!(tmp, r#"{{"db_id": "dept"}}"#)?;
        assert!(matches!(load_spider_file(tmp.path()), Err(DatasetError::Shape { .. })));

        let mut tmp = NamedTempFile::new()?;
        write!(tmp, r#"[1, 2]"#)?;
        assert!(matches!(load_spider_file(tmp.path()), Err(DatasetError::Shape { .. })));
        Ok(())
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let err = load_spider_file(Path::new("/nonexistent/train.json")).unwrap_err();
        assert!(matches!(err, DatasetError::Read { .. }));
    }

    #[test]
    fn database_paths_depend_on_split() {
        let root = Path::new("spider");
        assert_eq!(
            database_path(root, "dept", "train"),
            PathBuf::from("spider/database/dept/dept.sqlite")
        );
        assert_eq!(
            database_path(root, "dept", "dev"),
            PathBuf::from("spider/test_database/dept/dept.sqlite")
        );
    }

    #[test]
    fn resolve_reports_missing_attribute() {
        let inst = SpiderInstance {
            db_id: Some("dept".into()),
            query: None,
            question: Some("q".into()),
        };
        let err = ResolvedInstance::resolve(4, &inst, Path::new("r"), "train").unwrap_err();
        assert!(matches!(
            err,
            DatasetError::MissingAttribute {
                index: 4,
                attribute: "query"
            }
        ));
    }

    #[test]
    fn index_range_is_inclusive() {
        let r = IndexRange::new(Some(2), Some(4));
        assert!(!r.contains(1));
        assert!(r.contains(2));
        assert!(r.contains(4));
        assert!(!r.contains(5));
        assert!(IndexRange::default().contains(10_000));
    }
}
