// src/dataset/zip.rs

use std::sync::Arc;

use crate::error::Result;
use crate::transform::Compose;
use crate::value::Value;

use super::traits::IndexedDataset;

/// Combines several datasets index-wise into one.
///
/// `get(i)` collects member outputs into a single [`Value::List`], flattening
/// exactly one level: a member that itself yields a list contributes its
/// elements, any other value contributes itself. The combined length is the
/// shortest member length, so ragged members are truncated rather than
/// erroring.
pub struct ZipDataset {
    datasets: Vec<Arc<dyn IndexedDataset>>,
    transform: Option<Compose>,
    len: usize,
}

impl ZipDataset {
    pub fn new(datasets: Vec<Arc<dyn IndexedDataset>>) -> Self {
        let len = datasets.iter().map(|d| d.len()).min().unwrap_or(0);
        Self { datasets, transform: None, len }
    }

    /// Apply `transform` to the combined list after zipping.
    pub fn with_transform(mut self, transform: Compose) -> Self {
        self.transform = Some(transform);
        self
    }
}

impl IndexedDataset for ZipDataset {
    fn len(&self) -> usize {
        self.len
    }

    fn get(&self, index: usize) -> Result<Value> {
        let mut items = Vec::with_capacity(self.datasets.len());
        for dataset in &self.datasets {
            match dataset.get(index)? {
                Value::List(members) => items.extend(members),
                value => items.push(value),
            }
        }
        let combined = Value::List(items);
        match &self.transform {
            Some(transform) => transform.apply(combined),
            None => Ok(combined),
        }
    }
}

impl std::fmt::Debug for ZipDataset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZipDataset")
            .field("members", &self.datasets.len())
            .field("len", &self.len)
            .finish()
    }
}
