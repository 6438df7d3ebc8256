// src/dataset/traits.rs

use std::sync::Arc;

use crate::error::{PipelineError, Result};
use crate::value::Value;

/// Supplies raw, untransformed records by index.
///
/// Implementations must be safe to call from several warm-up workers at once;
/// `get` takes `&self` and returns an owned record.
pub trait RecordSource: Send + Sync {
    /// Number of records available.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Fetch the record at `index`. Out-of-range indices are an error.
    fn get(&self, index: usize) -> Result<Value>;
}

/// In-memory record source backed by a `Vec`.
#[derive(Debug, Clone)]
pub struct VecSource {
    records: Vec<Value>,
}

impl VecSource {
    pub fn new(records: Vec<Value>) -> Self {
        Self { records }
    }
}

impl RecordSource for VecSource {
    fn len(&self) -> usize {
        self.records.len()
    }

    fn get(&self, index: usize) -> Result<Value> {
        self.records.get(index).cloned().ok_or_else(|| {
            PipelineError::dataset(
                "VecSource",
                format!("index {} out of range for {} records", index, self.records.len()),
            )
        })
    }
}

impl From<Vec<Value>> for VecSource {
    fn from(records: Vec<Value>) -> Self {
        Self::new(records)
    }
}

/// Indexed access to fully transformed values.
///
/// All dataset variants implement this, which lets [`super::ZipDataset`]
/// combine them behind `Arc<dyn IndexedDataset>` without caring which
/// caching strategy each member uses.
pub trait IndexedDataset: Send + Sync {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Resolve `index` through the full transform pipeline.
    fn get(&self, index: usize) -> Result<Value>;
}

impl<T: IndexedDataset + ?Sized> IndexedDataset for Arc<T> {
    fn len(&self) -> usize {
        (**self).len()
    }

    fn get(&self, index: usize) -> Result<Value> {
        (**self).get(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec_source_get() {
        let source = VecSource::new(vec![Value::Int(1), Value::Int(2)]);
        assert_eq!(source.len(), 2);
        assert!(!source.is_empty());
        assert_eq!(source.get(1).unwrap(), Value::Int(2));
    }

    #[test]
    fn test_vec_source_out_of_range() {
        let source = VecSource::new(vec![Value::Int(1)]);
        let err = source.get(5).unwrap_err();
        assert!(err.to_string().contains("out of range"));
    }

    #[test]
    fn test_empty_source() {
        let source = VecSource::new(vec![]);
        assert_eq!(source.len(), 0);
        assert!(source.is_empty());
    }
}
