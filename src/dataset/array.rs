// src/dataset/array.rs

use std::sync::{Arc, Mutex};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::{PipelineError, Result};
use crate::transform::{Compose, Transform};
use crate::value::Value;

use super::plain::Dataset;
use super::traits::{IndexedDataset, RecordSource};
use super::zip::ZipDataset;

/// Zips parallel array sources (images, segmentations, labels) through
/// per-member pipelines whose random transforms share a seed.
///
/// Before each access one seed is drawn and pushed into every member
/// pipeline, so a random crop applied to the image and to its segmentation
/// lands on the same region even though the pipelines run independently.
pub struct ArrayDataset {
    zip: ZipDataset,
    transforms: Vec<Compose>,
    rng: Mutex<StdRng>,
}

/// Builder for [`ArrayDataset`]. Members are zipped in the order added.
#[derive(Default)]
pub struct ArrayDatasetBuilder {
    members: Vec<(Arc<dyn RecordSource>, Compose)>,
}

impl ArrayDatasetBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn member(mut self, source: Arc<dyn RecordSource>, transform: Compose) -> Self {
        self.members.push((source, transform));
        self
    }

    pub fn build(self) -> Result<ArrayDataset> {
        if self.members.is_empty() {
            return Err(PipelineError::dataset(
                "ArrayDataset",
                "at least one member source is required",
            ));
        }
        let mut transforms = Vec::with_capacity(self.members.len());
        let mut datasets: Vec<Arc<dyn IndexedDataset>> = Vec::with_capacity(self.members.len());
        for (source, transform) in self.members {
            // Clones share the underlying transform instances, so reseeding
            // through `transforms` reaches the pipeline inside the dataset.
            transforms.push(transform.clone());
            datasets.push(Arc::new(Dataset::new(source, transform)));
        }
        Ok(ArrayDataset {
            zip: ZipDataset::new(datasets),
            transforms,
            rng: Mutex::new(StdRng::from_entropy()),
        })
    }
}

impl ArrayDataset {
    pub fn builder() -> ArrayDatasetBuilder {
        ArrayDatasetBuilder::new()
    }

    /// Reseed the per-access seed stream, making the sequence of member
    /// seeds (and therefore all member augmentations) reproducible.
    pub fn set_seed(&self, seed: u64) {
        *self.rng.lock().unwrap() = StdRng::seed_from_u64(seed);
    }
}

impl IndexedDataset for ArrayDataset {
    fn len(&self) -> usize {
        self.zip.len()
    }

    fn get(&self, index: usize) -> Result<Value> {
        let seed = self.rng.lock().unwrap().gen::<u64>();
        for transform in &self.transforms {
            transform.set_seed(seed);
        }
        self.zip.get(index)
    }
}

impl std::fmt::Debug for ArrayDataset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArrayDataset")
            .field("members", &self.transforms.len())
            .field("len", &self.zip.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::traits::VecSource;
    use crate::transform::{RandShiftIntensity, ScaleIntensity};
    use crate::value::Array;

    fn array_record(data: Vec<f32>) -> Value {
        Value::Array(Array::new(vec![data.len()], data).unwrap())
    }

    fn member_source(values: Vec<f32>) -> Arc<dyn RecordSource> {
        Arc::new(VecSource::new(
            values.into_iter().map(|v| array_record(vec![v])).collect(),
        ))
    }

    fn rand_pipeline() -> Compose {
        Compose::new(vec![Arc::new(RandShiftIntensity::new(
            Vec::<&str>::new(),
            (0.0, 100.0),
        ))])
    }

    fn expect_pair(value: Value) -> (f32, f32) {
        match value {
            Value::List(items) => {
                let scalar = |v: &Value| match v {
                    Value::Array(a) => a.data[0],
                    other => panic!("expected array, got {other:?}"),
                };
                (scalar(&items[0]), scalar(&items[1]))
            }
            other => panic!("expected list, got {other:?}"),
        }
    }

    #[test]
    fn test_members_share_random_draws() {
        let dataset = ArrayDataset::builder()
            .member(member_source(vec![0.0, 0.0]), rand_pipeline())
            .member(member_source(vec![0.0, 0.0]), rand_pipeline())
            .build()
            .unwrap();

        // Both members start from 0.0; identical shifts mean identical seeds
        // reached both pipelines.
        let (img, seg) = expect_pair(dataset.get(0).unwrap());
        assert_eq!(img, seg);
        let (img, seg) = expect_pair(dataset.get(1).unwrap());
        assert_eq!(img, seg);
    }

    #[test]
    fn test_set_seed_reproduces_sequence() {
        let build = || {
            ArrayDataset::builder()
                .member(member_source(vec![0.0, 0.0, 0.0]), rand_pipeline())
                .build()
                .unwrap()
        };
        let first = build();
        let second = build();
        first.set_seed(42);
        second.set_seed(42);
        for i in 0..3 {
            assert_eq!(first.get(i).unwrap(), second.get(i).unwrap());
        }
    }

    #[test]
    fn test_deterministic_members_unaffected() {
        let dataset = ArrayDataset::builder()
            .member(
                member_source(vec![1.0]),
                Compose::new(vec![Arc::new(ScaleIntensity::new(Vec::<&str>::new(), 4.0))]),
            )
            .member(member_source(vec![2.0]), rand_pipeline())
            .build()
            .unwrap();
        let (img, _) = expect_pair(dataset.get(0).unwrap());
        assert_eq!(img, 4.0);
    }

    #[test]
    fn test_length_is_shortest_member() {
        let dataset = ArrayDataset::builder()
            .member(member_source(vec![0.0, 0.0, 0.0]), rand_pipeline())
            .member(member_source(vec![0.0]), rand_pipeline())
            .build()
            .unwrap();
        assert_eq!(dataset.len(), 1);
    }

    #[test]
    fn test_requires_a_member() {
        assert!(ArrayDataset::builder().build().is_err());
    }
}
