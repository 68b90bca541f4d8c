//! Full-result cache for distillation runs.

pub mod key;

use crate::model::DistillationEntry;
use crate::storage::tables::{load_distillations, save_distillations};
use key::CacheKey;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CachePolicy {
    /// Serve hits, write results after a miss.
    #[default]
    Enabled,
    /// Ignore existing entries but overwrite them with the new result.
    Refresh,
    Disabled,
}

impl CachePolicy {
    pub fn reads(&self) -> bool {
        matches!(self, CachePolicy::Enabled)
    }

    pub fn writes(&self) -> bool {
        !matches!(self, CachePolicy::Disabled)
    }
}

#[derive(Debug, Clone)]
pub struct ResultCache {
    dir: PathBuf,
}

impl ResultCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, key: &CacheKey) -> PathBuf {
        self.dir.join(key.file_name())
    }

    pub fn get(&self, key: &CacheKey) -> anyhow::Result<Option<Vec<DistillationEntry>>> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        load_distillations(&path).map(Some)
    }

    pub fn put(&self, key: &CacheKey, entries: &[DistillationEntry]) -> anyhow::Result<PathBuf> {
        let path = self.path_for(key);
        save_distillations(&path, entries)?;
        Ok(path)
    }
}
