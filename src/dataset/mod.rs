// src/dataset/mod.rs

//! Dataset variants over a shared record source abstraction.
//!
//! Every dataset resolves an index to a source record and runs it through a
//! transform pipeline. The variants differ in where the deterministic head of
//! the pipeline is evaluated: per access ([`Dataset`]), against a persistent
//! on-disk cache ([`PersistentDataset`]), or eagerly into memory at
//! construction ([`CacheDataset`]). [`ZipDataset`] and [`ArrayDataset`]
//! combine datasets of equal (or truncated-to-shortest) length index-wise.

mod array;
mod cache;
mod persistent;
mod plain;
mod traits;
mod zip;

pub use array::{ArrayDataset, ArrayDatasetBuilder};
pub use cache::CacheDataset;
pub use persistent::PersistentDataset;
pub use plain::Dataset;
pub use traits::{IndexedDataset, RecordSource, VecSource};
pub use zip::ZipDataset;
