// src/dataset/plain.rs

use std::sync::Arc;

use crate::error::Result;
use crate::transform::Compose;
use crate::value::Value;

use super::traits::{IndexedDataset, RecordSource};

/// The simplest dataset: every access fetches the source record and runs the
/// whole transform pipeline over it. Nothing is cached.
#[derive(Clone)]
pub struct Dataset {
    source: Arc<dyn RecordSource>,
    transform: Compose,
}

impl Dataset {
    pub fn new(source: Arc<dyn RecordSource>, transform: Compose) -> Self {
        Self { source, transform }
    }

    /// The pipeline applied on each access. Cloning a [`Compose`] shares the
    /// underlying transform instances, so reseeding via the returned handle
    /// affects this dataset.
    pub fn transform(&self) -> &Compose {
        &self.transform
    }

    pub fn source(&self) -> &Arc<dyn RecordSource> {
        &self.source
    }
}

impl IndexedDataset for Dataset {
    fn len(&self) -> usize {
        self.source.len()
    }

    fn get(&self, index: usize) -> Result<Value> {
        let record = self.source.get(index)?;
        self.transform.apply(record)
    }
}

impl std::fmt::Debug for Dataset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dataset")
            .field("len", &self.source.len())
            .field("transform", &self.transform)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::traits::VecSource;
    use crate::transform::ScaleIntensity;
    use crate::value::Array;

    fn array_record(data: Vec<f32>) -> Value {
        Value::Array(Array::new(vec![data.len()], data).unwrap())
    }

    #[test]
    fn test_get_applies_pipeline() {
        let source = Arc::new(VecSource::new(vec![array_record(vec![1.0, 2.0])]));
        let transform = Compose::new(vec![Arc::new(ScaleIntensity::new(Vec::<&str>::new(), 3.0))]);
        let dataset = Dataset::new(source, transform);

        assert_eq!(dataset.len(), 1);
        let out = dataset.get(0).unwrap();
        match out {
            Value::Array(a) => assert_eq!(a.data, vec![3.0, 6.0]),
            other => panic!("expected array, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_pipeline_is_identity() {
        let record = array_record(vec![5.0]);
        let source = Arc::new(VecSource::new(vec![record.clone()]));
        let dataset = Dataset::new(source, Compose::new(vec![]));
        assert_eq!(dataset.get(0).unwrap(), record);
    }

    #[test]
    fn test_out_of_range_propagates() {
        let source = Arc::new(VecSource::new(vec![]));
        let dataset = Dataset::new(source, Compose::new(vec![]));
        assert!(dataset.is_empty());
        assert!(dataset.get(0).is_err());
    }
}
