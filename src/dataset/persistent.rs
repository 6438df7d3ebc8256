// src/dataset/persistent.rs

use std::sync::Arc;

use tracing::debug;

use crate::cache::{DiskCacheStore, EntryCodec};
use crate::error::Result;
use crate::transform::Compose;
use crate::value::Value;

use super::traits::{IndexedDataset, RecordSource};

/// Dataset whose deterministic transform head is cached on disk.
///
/// On each access the source record is fingerprinted; a cache hit skips the
/// deterministic prefix of the pipeline entirely and resumes at the first
/// random transform. A miss evaluates the prefix, persists the intermediate
/// value, and then resumes. The random suffix always runs per access, so
/// augmentation stays fresh while the expensive head is paid once per record.
///
/// The fingerprint covers the source record only, not the pipeline. Editing
/// the deterministic transforms without clearing the cache directory serves
/// stale intermediates; callers own that invalidation.
///
/// If the cache directory does not exist the dataset degrades to recomputing
/// the full pipeline on every access, without error.
pub struct PersistentDataset {
    source: Arc<dyn RecordSource>,
    transform: Compose,
    store: DiskCacheStore,
}

impl PersistentDataset {
    /// Create a dataset caching into `cache_dir` with uncompressed entries.
    pub fn new(
        source: Arc<dyn RecordSource>,
        transform: Compose,
        cache_dir: impl Into<std::path::PathBuf>,
    ) -> Self {
        Self::with_store(source, transform, DiskCacheStore::new(cache_dir, EntryCodec::new("none", 0)))
    }

    /// Create a dataset over an explicitly configured store, e.g. one built
    /// via [`DiskCacheStore::from_config`] to enable entry compression.
    pub fn with_store(source: Arc<dyn RecordSource>, transform: Compose, store: DiskCacheStore) -> Self {
        Self { source, transform, store }
    }

    pub fn store(&self) -> &DiskCacheStore {
        &self.store
    }

    fn pre_random(&self, record: Value) -> Result<Value> {
        if !self.store.is_active() {
            return self.transform.apply_prefix(record);
        }
        let key = self.store.key_for(&record)?;
        if let Some(cached) = self.store.load(&key)? {
            debug!(key = %key, "disk cache hit");
            return Ok(cached);
        }
        debug!(key = %key, "disk cache miss");
        let intermediate = self.transform.apply_prefix(record)?;
        self.store.store(&key, &intermediate)?;
        Ok(intermediate)
    }
}

impl IndexedDataset for PersistentDataset {
    fn len(&self) -> usize {
        self.source.len()
    }

    fn get(&self, index: usize) -> Result<Value> {
        let record = self.source.get(index)?;
        let intermediate = self.pre_random(record)?;
        self.transform.apply_suffix(intermediate)
    }
}

impl std::fmt::Debug for PersistentDataset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistentDataset")
            .field("len", &self.source.len())
            .field("store", &self.store)
            .finish()
    }
}
