// src/transform/spatial.rs

//! Spatial transforms for array-valued samples.

use std::sync::Mutex;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::compose::Transform;
use super::keyed::for_each_array;
use crate::error::{PipelineError, Result};
use crate::value::{Array, Value};

/// Crops a region of interest out of a row-major array.
///
/// Dimension count of `origin` and `roi` must match the array; the region
/// must lie inside the array bounds.
fn crop(array: &Array, origin: &[usize], roi: &[usize]) -> Result<Array> {
    let ndim = array.ndim();
    if origin.len() != ndim || roi.len() != ndim {
        return Err(PipelineError::transform(
            "crop",
            format!(
                "roi rank {} does not match array rank {}",
                roi.len(),
                ndim
            ),
        ));
    }
    for d in 0..ndim {
        if origin[d] + roi[d] > array.shape[d] {
            return Err(PipelineError::transform(
                "crop",
                format!(
                    "roi {:?} at origin {:?} exceeds array shape {:?}",
                    roi, origin, array.shape
                ),
            ));
        }
    }

    // Row-major strides for the source array
    let mut strides = vec![1usize; ndim];
    for d in (0..ndim.saturating_sub(1)).rev() {
        strides[d] = strides[d + 1] * array.shape[d + 1];
    }

    let out_len: usize = roi.iter().product();
    let mut data = Vec::with_capacity(out_len);
    let mut coord = vec![0usize; ndim];

    for _ in 0..out_len {
        let offset: usize = coord
            .iter()
            .zip(origin)
            .zip(&strides)
            .map(|((c, o), s)| (c + o) * s)
            .sum();
        data.push(array.data[offset]);

        // Odometer increment over the roi coordinates
        for d in (0..ndim).rev() {
            coord[d] += 1;
            if coord[d] < roi[d] {
                break;
            }
            coord[d] = 0;
        }
    }

    Array::new(roi.to_vec(), data)
}

/// Crops a fixed-size region centered in the array.
pub struct CenterSpatialCrop {
    keys: Vec<String>,
    roi_size: Vec<usize>,
}

impl CenterSpatialCrop {
    pub fn new(
        keys: impl IntoIterator<Item = impl Into<String>>,
        roi_size: Vec<usize>,
    ) -> Self {
        Self {
            keys: keys.into_iter().map(Into::into).collect(),
            roi_size,
        }
    }
}

impl Transform for CenterSpatialCrop {
    fn apply(&self, value: Value) -> Result<Value> {
        for_each_array(self.name(), value, &self.keys, &mut |array| {
            if self.roi_size.len() != array.ndim() {
                return Err(PipelineError::transform(
                    "CenterSpatialCrop",
                    format!(
                        "roi rank {} does not match array rank {}",
                        self.roi_size.len(),
                        array.ndim()
                    ),
                ));
            }
            let origin: Vec<usize> = array
                .shape
                .iter()
                .zip(&self.roi_size)
                .map(|(dim, roi)| dim.saturating_sub(*roi) / 2)
                .collect();
            *array = crop(array, &origin, &self.roi_size)?;
            Ok(())
        })
    }

    fn name(&self) -> &'static str {
        "CenterSpatialCrop"
    }
}

/// Crops a fixed-size region at a random origin.
///
/// One crop origin is drawn per sample access, from the first targeted
/// array's shape, and applied identically to every configured key. Paired
/// fields (e.g. an image and its label mask) therefore receive the same
/// spatial window within one access.
pub struct RandSpatialCrop {
    keys: Vec<String>,
    roi_size: Vec<usize>,
    rng: Mutex<StdRng>,
}

impl RandSpatialCrop {
    pub fn new(
        keys: impl IntoIterator<Item = impl Into<String>>,
        roi_size: Vec<usize>,
    ) -> Self {
        Self {
            keys: keys.into_iter().map(Into::into).collect(),
            roi_size,
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    fn draw_origin(&self, shape: &[usize]) -> Result<Vec<usize>> {
        if self.roi_size.len() != shape.len() {
            return Err(PipelineError::transform(
                "RandSpatialCrop",
                format!(
                    "roi rank {} does not match array rank {}",
                    self.roi_size.len(),
                    shape.len()
                ),
            ));
        }
        let mut rng = self.rng.lock().unwrap();
        shape
            .iter()
            .zip(&self.roi_size)
            .map(|(dim, roi)| {
                if roi > dim {
                    return Err(PipelineError::transform(
                        "RandSpatialCrop",
                        format!("roi {:?} exceeds array shape {:?}", self.roi_size, shape),
                    ));
                }
                Ok(rng.gen_range(0..=(dim - roi)))
            })
            .collect()
    }
}

impl Transform for RandSpatialCrop {
    fn apply(&self, value: Value) -> Result<Value> {
        // The origin is drawn from the first targeted array and reused for
        // the rest, so all keys see the same spatial window.
        let mut origin: Option<Vec<usize>> = None;
        for_each_array(self.name(), value, &self.keys, &mut |array| {
            if origin.is_none() {
                origin = Some(self.draw_origin(&array.shape)?);
            }
            if let Some(origin) = &origin {
                *array = crop(array, origin, &self.roi_size)?;
            }
            Ok(())
        })
    }

    fn is_random(&self) -> bool {
        true
    }

    fn name(&self) -> &'static str {
        "RandSpatialCrop"
    }

    fn set_seed(&self, seed: u64) {
        *self.rng.lock().unwrap() = StdRng::seed_from_u64(seed);
    }
}
