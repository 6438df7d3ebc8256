// src/dataset/cache.rs

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tracing::{debug, info};

use crate::config::WarmupConfig;
use crate::error::{PipelineError, Result};
use crate::transform::Compose;
use crate::value::Value;

use super::traits::{IndexedDataset, RecordSource};

/// Dataset that eagerly evaluates the deterministic transform head for the
/// first `cache_num` records at construction and holds the intermediates in
/// memory.
///
/// Accesses below `cache_num` clone the cached intermediate and run only the
/// random tail of the pipeline; accesses at or past it run the full pipeline
/// against the source. Warm-up cost is paid once, up front, optionally across
/// several worker threads.
pub struct CacheDataset {
    source: Arc<dyn RecordSource>,
    transform: Compose,
    slots: Vec<Value>,
}

impl CacheDataset {
    /// Warm the cache for `min(requested, floor(len * cache_rate), len)`
    /// records. `cache_num` of `None` means "as many as the rate allows".
    /// `num_workers` of 0 or 1 warms serially.
    pub fn new(
        source: Arc<dyn RecordSource>,
        transform: Compose,
        cache_num: Option<usize>,
        cache_rate: f64,
        num_workers: usize,
    ) -> Result<Self> {
        let total = source.len();
        let by_rate = (total as f64 * cache_rate).floor() as usize;
        let n = cache_num.unwrap_or(usize::MAX).min(by_rate).min(total);

        info!(cache_num = n, total, num_workers, "warming in-memory cache");
        let slots = if num_workers > 1 {
            warm_parallel(source.as_ref(), &transform, n, num_workers)?
        } else {
            warm_serial(source.as_ref(), &transform, n)?
        };

        Ok(Self { source, transform, slots })
    }

    pub fn from_config(
        source: Arc<dyn RecordSource>,
        transform: Compose,
        config: &WarmupConfig,
    ) -> Result<Self> {
        Self::new(source, transform, config.cache_num, config.cache_rate, config.num_workers)
    }

    /// Number of records whose intermediates are held in memory.
    pub fn cache_num(&self) -> usize {
        self.slots.len()
    }
}

fn warm_serial(source: &dyn RecordSource, transform: &Compose, n: usize) -> Result<Vec<Value>> {
    let mut slots = Vec::with_capacity(n);
    for index in 0..n {
        let record = source.get(index)?;
        slots.push(transform.apply_prefix(record)?);
        debug!(completed = index + 1, total = n, "cache warm-up progress");
    }
    Ok(slots)
}

/// Warm-up across scoped threads. Each worker owns a disjoint, contiguous
/// range of slots via `chunks_mut`, so no slot is written twice and no
/// synchronization beyond the shared progress counter is needed.
fn warm_parallel(
    source: &dyn RecordSource,
    transform: &Compose,
    n: usize,
    num_workers: usize,
) -> Result<Vec<Value>> {
    if n == 0 {
        return Ok(Vec::new());
    }
    let mut slots: Vec<Option<Value>> = vec![None; n];
    let chunk_size = n.div_ceil(num_workers.min(n));
    let completed = AtomicUsize::new(0);

    std::thread::scope(|scope| -> Result<()> {
        let mut handles = Vec::new();
        for (worker, chunk) in slots.chunks_mut(chunk_size).enumerate() {
            let start = worker * chunk_size;
            let completed = &completed;
            handles.push(scope.spawn(move || -> Result<()> {
                for (offset, slot) in chunk.iter_mut().enumerate() {
                    let record = source.get(start + offset)?;
                    *slot = Some(transform.apply_prefix(record)?);
                    let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
                    debug!(completed = done, total = n, "cache warm-up progress");
                }
                Ok(())
            }));
        }
        for handle in handles {
            handle
                .join()
                .map_err(|_| PipelineError::dataset("CacheDataset", "warm-up worker panicked"))??;
        }
        Ok(())
    })?;

    slots
        .into_iter()
        .map(|slot| {
            slot.ok_or_else(|| PipelineError::dataset("CacheDataset", "warm-up slot left empty"))
        })
        .collect()
}

impl IndexedDataset for CacheDataset {
    fn len(&self) -> usize {
        self.source.len()
    }

    fn get(&self, index: usize) -> Result<Value> {
        match self.slots.get(index) {
            Some(intermediate) => self.transform.apply_suffix(intermediate.clone()),
            None => {
                let record = self.source.get(index)?;
                self.transform.apply(record)
            }
        }
    }
}

impl std::fmt::Debug for CacheDataset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheDataset")
            .field("len", &self.source.len())
            .field("cache_num", &self.slots.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::traits::VecSource;
    use crate::transform::{ScaleIntensity, ShiftIntensity};
    use crate::value::Array;

    fn array_record(data: Vec<f32>) -> Value {
        Value::Array(Array::new(vec![data.len()], data).unwrap())
    }

    fn sources(n: usize) -> Arc<dyn RecordSource> {
        Arc::new(VecSource::new(
            (0..n).map(|i| array_record(vec![i as f32])).collect(),
        ))
    }

    fn pipeline() -> Compose {
        Compose::new(vec![
            Arc::new(ScaleIntensity::new(Vec::<&str>::new(), 2.0)),
            Arc::new(ShiftIntensity::new(Vec::<&str>::new(), 1.0)),
        ])
    }

    fn expect_scalar(value: Value) -> f32 {
        match value {
            Value::Array(a) => a.data[0],
            other => panic!("expected array, got {other:?}"),
        }
    }

    #[test]
    fn test_cache_num_clamping() {
        let ds = CacheDataset::new(sources(10), pipeline(), Some(100), 1.0, 0).unwrap();
        assert_eq!(ds.cache_num(), 10);

        let ds = CacheDataset::new(sources(10), pipeline(), Some(4), 1.0, 0).unwrap();
        assert_eq!(ds.cache_num(), 4);

        let ds = CacheDataset::new(sources(10), pipeline(), None, 0.5, 0).unwrap();
        assert_eq!(ds.cache_num(), 5);

        let ds = CacheDataset::new(sources(10), pipeline(), Some(8), 0.25, 0).unwrap();
        assert_eq!(ds.cache_num(), 2);
    }

    #[test]
    fn test_cached_and_uncached_accesses_agree() {
        let ds = CacheDataset::new(sources(6), pipeline(), Some(3), 1.0, 0).unwrap();
        for i in 0..6 {
            assert_eq!(expect_scalar(ds.get(i).unwrap()), i as f32 * 2.0 + 1.0);
        }
    }

    #[test]
    fn test_zero_cache_num_runs_full_pipeline() {
        let ds = CacheDataset::new(sources(3), pipeline(), Some(0), 1.0, 0).unwrap();
        assert_eq!(ds.cache_num(), 0);
        assert_eq!(expect_scalar(ds.get(2).unwrap()), 5.0);
    }

    #[test]
    fn test_parallel_matches_serial() {
        for workers in [1, 2, 8] {
            let ds = CacheDataset::new(sources(17), pipeline(), None, 1.0, workers).unwrap();
            assert_eq!(ds.cache_num(), 17);
            for i in 0..17 {
                assert_eq!(expect_scalar(ds.get(i).unwrap()), i as f32 * 2.0 + 1.0);
            }
        }
    }

    #[test]
    fn test_more_workers_than_records() {
        let ds = CacheDataset::new(sources(2), pipeline(), None, 1.0, 16).unwrap();
        assert_eq!(ds.cache_num(), 2);
        assert_eq!(expect_scalar(ds.get(1).unwrap()), 3.0);
    }

    #[test]
    fn test_empty_source() {
        let ds = CacheDataset::new(sources(0), pipeline(), None, 1.0, 4).unwrap();
        assert_eq!(ds.cache_num(), 0);
        assert!(ds.is_empty());
    }

    #[test]
    fn test_from_config() {
        let config = WarmupConfig { cache_num: None, cache_rate: 1.0, num_workers: 2 };
        let ds = CacheDataset::from_config(sources(4), pipeline(), &config).unwrap();
        assert_eq!(ds.cache_num(), 4);
    }
}
