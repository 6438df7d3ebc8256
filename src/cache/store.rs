// src/cache/store.rs

//! Persistent disk store for cache entries.

use std::fs::{self, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::config::CacheConfig;
use crate::error::{PipelineError, Result};
use crate::value::Value;

use super::entry::EntryCodec;
use super::fingerprint::fingerprint;

/// Disk-backed key→value store for pre-random pipeline results.
///
/// Entries live at `{cache_dir}/{fingerprint}.cache`. Writes go to a
/// uniquely-named temp file in the same directory and are published with
/// an atomic rename, so readers never observe a half-written entry and an
/// interrupted writer cannot corrupt a canonical one. Entries are never
/// invalidated by the store; clearing the directory is the caller's job.
///
/// If the cache directory does not exist the store is inactive: `load`
/// reports a miss and `store` is a no-op. This is the configured
/// degradation path, not an error.
pub struct DiskCacheStore {
    cache_dir: PathBuf,
    codec: EntryCodec,
}

impl DiskCacheStore {
    pub fn new(cache_dir: impl Into<PathBuf>, codec: EntryCodec) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            codec,
        }
    }

    /// Creates a store from the cache configuration section.
    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(
            config.cache_dir.clone(),
            EntryCodec::new(config.compression.clone(), config.compression_level),
        )
    }

    /// Whether the cache directory exists and entries can be served.
    pub fn is_active(&self) -> bool {
        self.cache_dir.is_dir()
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Computes the cache key for a raw record.
    pub fn key_for(&self, record: &Value) -> Result<String> {
        fingerprint(record)
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.cache_dir.join(format!("{key}.cache"))
    }

    /// Loads the entry under `key`, or `None` on a miss.
    ///
    /// An inactive store always misses.
    pub fn load(&self, key: &str) -> Result<Option<Value>> {
        if !self.is_active() {
            return Ok(None);
        }

        let path = self.entry_path(key);
        if !path.is_file() {
            return Ok(None);
        }

        let bytes = fs::read(&path).map_err(|e| {
            PipelineError::cache_with_source(&path, "failed to read cache entry", e)
        })?;
        let value = self.codec.decode(&bytes)?;
        Ok(Some(value))
    }

    /// Stores `value` under `key`.
    ///
    /// The entry is written to a temp file named `.{key}.{pid}.tmp` and
    /// renamed onto the canonical path. Concurrent writers of the same key
    /// race on the rename, but both write equivalent content, so the lost
    /// update is harmless. An inactive store skips the write.
    pub fn store(&self, key: &str, value: &Value) -> Result<()> {
        if !self.is_active() {
            tracing::debug!(key, "cache directory absent, skipping store");
            return Ok(());
        }

        let entry = self.codec.encode(value)?;

        let temp_path = self
            .cache_dir
            .join(format!(".{key}.{}.tmp", std::process::id()));
        let final_path = self.entry_path(key);

        write_all_synced(&temp_path, &entry)?;

        fs::rename(&temp_path, &final_path).map_err(|e| {
            PipelineError::cache_with_source(
                &temp_path,
                format!("failed to rename to {}", final_path.display()),
                e,
            )
        })?;

        tracing::debug!(key, bytes = entry.len(), "cache entry stored");
        Ok(())
    }
}

/// Writes a file fully and syncs it to disk before returning.
fn write_all_synced(path: &Path, data: &[u8]) -> Result<()> {
    let file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
        .map_err(|e| PipelineError::cache_with_source(path, "failed to create temp file", e))?;

    let mut writer = BufWriter::new(file);
    writer
        .write_all(data)
        .map_err(|e| PipelineError::cache_with_source(path, "failed to write cache entry", e))?;
    writer
        .flush()
        .map_err(|e| PipelineError::cache_with_source(path, "failed to flush cache entry", e))?;

    writer
        .get_ref()
        .sync_all()
        .map_err(|e| PipelineError::cache_with_source(path, "failed to sync cache entry", e))?;

    Ok(())
}

impl std::fmt::Debug for DiskCacheStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiskCacheStore")
            .field("cache_dir", &self.cache_dir)
            .field("active", &self.is_active())
            .finish()
    }
}
