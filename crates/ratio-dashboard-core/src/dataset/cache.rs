//! Memoisation of prepared datasets, keyed on the two source files.
//!
//! A key is the pair of canonical paths together with each file's length and
//! modification time, so editing either source produces a new key and the
//! stale entry for the same paths is dropped. Preparation runs while the
//! lock is held, so a given key is prepared at most once per cache.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::SystemTime;

use crate::dataset::prepare::{prepare, PreparedDataset};
use crate::error::DashboardError;
use crate::DashboardResult;

/// Identity and version of one source file.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceStamp {
    pub path: PathBuf,
    pub len: u64,
    pub modified: Option<SystemTime>,
}

impl SourceStamp {
    pub fn of(path: &Path) -> DashboardResult<Self> {
        let load_err = |e: std::io::Error| DashboardError::load(path.display().to_string(), e);
        let path = fs::canonicalize(path).map_err(load_err)?;
        let meta = fs::metadata(&path).map_err(load_err)?;
        if !meta.is_file() {
            return Err(DashboardError::load(path.display().to_string(), "not a file"));
        }
        Ok(Self {
            len: meta.len(),
            modified: meta.modified().ok(),
            path,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceKey {
    pub ratios: SourceStamp,
    pub inputs: SourceStamp,
}

impl SourceKey {
    pub fn of(ratios: &Path, inputs: &Path) -> DashboardResult<Self> {
        Ok(Self {
            ratios: SourceStamp::of(ratios)?,
            inputs: SourceStamp::of(inputs)?,
        })
    }

    fn same_paths(&self, other: &SourceKey) -> bool {
        self.ratios.path == other.ratios.path && self.inputs.path == other.inputs.path
    }
}

/// Prepared datasets shared by every query against the same sources.
#[derive(Debug, Default)]
pub struct DatasetCache {
    entries: Mutex<HashMap<SourceKey, Arc<PreparedDataset>>>,
}

impl DatasetCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the prepared dataset for these sources, loading and preparing
    /// them on first use.
    pub fn get_or_prepare(
        &self,
        ratios: &Path,
        inputs: &Path,
    ) -> DashboardResult<Arc<PreparedDataset>> {
        self.get_or_insert_with(ratios, inputs, || prepare(ratios, inputs))
    }

    /// Like [`get_or_prepare`](Self::get_or_prepare) with a caller-supplied
    /// preparation step. Failures are returned and not cached.
    pub fn get_or_insert_with<F>(
        &self,
        ratios: &Path,
        inputs: &Path,
        build: F,
    ) -> DashboardResult<Arc<PreparedDataset>>
    where
        F: FnOnce() -> DashboardResult<PreparedDataset>,
    {
        let key = SourceKey::of(ratios, inputs)?;
        let mut entries = self.lock();

        if let Some(dataset) = entries.get(&key) {
            tracing::debug!(ratios = %key.ratios.path.display(), "dataset cache hit");
            return Ok(Arc::clone(dataset));
        }

        tracing::debug!(ratios = %key.ratios.path.display(), "dataset cache miss");
        let dataset = Arc::new(build()?);
        entries.retain(|k, _| !k.same_paths(&key));
        entries.insert(key, Arc::clone(&dataset));
        Ok(dataset)
    }

    /// Drop every entry for this pair of paths. Returns whether one existed.
    pub fn invalidate(&self, ratios: &Path, inputs: &Path) -> bool {
        let ratios = fs::canonicalize(ratios).unwrap_or_else(|_| ratios.to_path_buf());
        let inputs = fs::canonicalize(inputs).unwrap_or_else(|_| inputs.to_path_buf());
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|k, _| !(k.ratios.path == ratios && k.inputs.path == inputs));
        before != entries.len()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // Entries are only ever replaced whole, so a poisoned map is still consistent.
    fn lock(&self) -> MutexGuard<'_, HashMap<SourceKey, Arc<PreparedDataset>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::io::Write;

    const RATIOS: &str = "company,category,ratio_name,2023,2024\nFASING,liquidity,Current Ratio,1.5,1.1\n";
    const INPUTS: &str = "item,company,2023,2024\nnet_cash_flow,FASING,1,2\n";

    fn write_file(dir: &tempfile::TempDir, name: &str, contents: &str) -> PathBuf {
        let path = dir.path().join(name);
        let mut f = fs::File::create(&path).unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        path
    }

    fn sources() -> (tempfile::TempDir, PathBuf, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let ratios = write_file(&dir, "ratios.csv", RATIOS);
        let inputs = write_file(&dir, "inputs.csv", INPUTS);
        (dir, ratios, inputs)
    }

    #[test]
    fn test_prepares_once_per_source_pair() {
        let (_dir, ratios, inputs) = sources();
        let cache = DatasetCache::new();
        let runs = Cell::new(0);

        for _ in 0..3 {
            cache
                .get_or_insert_with(&ratios, &inputs, || {
                    runs.set(runs.get() + 1);
                    prepare(&ratios, &inputs)
                })
                .unwrap();
        }
        assert_eq!(runs.get(), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_shared_snapshot() {
        let (_dir, ratios, inputs) = sources();
        let cache = DatasetCache::new();
        let a = cache.get_or_prepare(&ratios, &inputs).unwrap();
        let b = cache.get_or_prepare(&ratios, &inputs).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_changed_source_is_reprepared() {
        let (dir, ratios, inputs) = sources();
        let cache = DatasetCache::new();
        let first = cache.get_or_prepare(&ratios, &inputs).unwrap();

        write_file(
            &dir,
            "ratios.csv",
            &format!("{RATIOS}FEERUM,liquidity,Current Ratio,2.0,2.5\n"),
        );
        let second = cache.get_or_prepare(&ratios, &inputs).unwrap();

        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(second.ratios.len(), 2);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_invalidate_forces_reprepare() {
        let (_dir, ratios, inputs) = sources();
        let cache = DatasetCache::new();
        let first = cache.get_or_prepare(&ratios, &inputs).unwrap();

        assert!(cache.invalidate(&ratios, &inputs));
        assert!(cache.is_empty());
        assert!(!cache.invalidate(&ratios, &inputs));

        let second = cache.get_or_prepare(&ratios, &inputs).unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_load_failure_is_not_cached() {
        let (dir, ratios, _) = sources();
        let broken = write_file(&dir, "broken.csv", "item,company\nx,y\n");
        let cache = DatasetCache::new();

        let err = cache.get_or_prepare(&ratios, &broken).unwrap_err();
        assert!(matches!(err, DashboardError::Load { .. }));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_missing_file_is_load_error() {
        let (dir, ratios, _) = sources();
        let cache = DatasetCache::new();
        let err = cache
            .get_or_prepare(&ratios, &dir.path().join("absent.csv"))
            .unwrap_err();
        assert!(matches!(err, DashboardError::Load { .. }));
    }
}
