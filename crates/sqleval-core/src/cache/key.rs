use crate::storage::tables::distillation_file_name;

/// Identity of a full distillation result: one per (teacher model, dataset, split).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub model: String,
    pub dataset: String,
    pub split: String,
}

impl CacheKey {
    pub fn new(model: &str, dataset: &str, split: &str) -> Self {
        Self {
            model: model.to_string(),
            dataset: dataset.to_string(),
            split: split.to_string(),
        }
    }

    pub fn file_name(&self) -> String {
        distillation_file_name(&self.model, &self.dataset, &self.split)
    }
}
