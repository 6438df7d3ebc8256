// src/cache/mod.rs

//! Content-addressed persistent cache for pre-random pipeline results.
//!
//! Entries are keyed by a fingerprint of the serialized raw record, not
//! of the pipeline definition. Two records with identical content share a
//! fingerprint even under different pipelines, so a changed pipeline with
//! an uncleared cache directory serves stale results; callers manage this
//! by clearing the directory.

mod entry;
mod fingerprint;
mod store;

pub use entry::{CacheEntryHeader, EntryCodec};
pub use fingerprint::fingerprint;
pub use store::DiskCacheStore;
