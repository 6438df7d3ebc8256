// src/lib.rs

//! Caching data pipeline primitives for training workloads.
//!
//! A pipeline is a [`Compose`] of [`Transform`]s split at its first random
//! member: the deterministic head produces a cacheable intermediate, the
//! random tail re-runs on every access. Dataset variants decide where that
//! intermediate lives:
//!
//! - [`Dataset`]: no caching, full pipeline per access.
//! - [`PersistentDataset`]: content-addressed intermediates on disk, written
//!   atomically and shared across processes and runs.
//! - [`CacheDataset`]: intermediates warmed into memory at construction,
//!   optionally across worker threads.
//! - [`ZipDataset`] / [`ArrayDataset`]: index-wise combination of datasets,
//!   with [`ArrayDataset`] seeding member pipelines in lockstep so paired
//!   augmentations agree.

pub mod cache;
pub mod config;
pub mod dataset;
pub mod error;
pub mod transform;
pub mod value;

pub use cache::{fingerprint, DiskCacheStore, EntryCodec};
pub use config::{CacheConfig, PipelineConfig, WarmupConfig};
pub use dataset::{
    ArrayDataset, ArrayDatasetBuilder, CacheDataset, Dataset, IndexedDataset, PersistentDataset,
    RecordSource, VecSource, ZipDataset,
};
pub use error::{PipelineError, Result};
pub use transform::{Compose, Transform};
pub use value::{Array, Record, Value};
