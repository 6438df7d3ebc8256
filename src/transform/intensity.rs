// src/transform/intensity.rs

//! Intensity transforms for array-valued samples.

use std::sync::Mutex;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::compose::Transform;
use super::keyed::for_each_array;
use crate::error::Result;
use crate::value::Value;

/// Multiplies array intensities by a constant factor.
pub struct ScaleIntensity {
    keys: Vec<String>,
    factor: f32,
}

impl ScaleIntensity {
    pub fn new(keys: impl IntoIterator<Item = impl Into<String>>, factor: f32) -> Self {
        Self {
            keys: keys.into_iter().map(Into::into).collect(),
            factor,
        }
    }
}

impl Transform for ScaleIntensity {
    fn apply(&self, value: Value) -> Result<Value> {
        for_each_array(self.name(), value, &self.keys, &mut |array| {
            for x in &mut array.data {
                *x *= self.factor;
            }
            Ok(())
        })
    }

    fn name(&self) -> &'static str {
        "ScaleIntensity"
    }
}

/// Adds a constant offset to array intensities.
pub struct ShiftIntensity {
    keys: Vec<String>,
    offset: f32,
}

impl ShiftIntensity {
    pub fn new(keys: impl IntoIterator<Item = impl Into<String>>, offset: f32) -> Self {
        Self {
            keys: keys.into_iter().map(Into::into).collect(),
            offset,
        }
    }
}

impl Transform for ShiftIntensity {
    fn apply(&self, value: Value) -> Result<Value> {
        for_each_array(self.name(), value, &self.keys, &mut |array| {
            for x in &mut array.data {
                *x += self.offset;
            }
            Ok(())
        })
    }

    fn name(&self) -> &'static str {
        "ShiftIntensity"
    }
}

/// Standardizes array intensities to zero mean and unit variance.
pub struct NormalizeIntensity {
    keys: Vec<String>,
}

impl NormalizeIntensity {
    pub fn new(keys: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            keys: keys.into_iter().map(Into::into).collect(),
        }
    }
}

impl Transform for NormalizeIntensity {
    fn apply(&self, value: Value) -> Result<Value> {
        for_each_array(self.name(), value, &self.keys, &mut |array| {
            let n = array.data.len() as f32;
            if n == 0.0 {
                return Ok(());
            }
            let mean: f32 = array.data.iter().sum::<f32>() / n;
            let var: f32 = array.data.iter().map(|x| (x - mean).powi(2)).sum::<f32>() / n;
            let std = var.sqrt().max(1e-8);
            for x in &mut array.data {
                *x = (*x - mean) / std;
            }
            Ok(())
        })
    }

    fn name(&self) -> &'static str {
        "NormalizeIntensity"
    }
}

/// Adds a uniformly drawn offset to array intensities.
///
/// One offset is drawn per sample access and applied identically to every
/// configured key, so paired fields shift together.
pub struct RandShiftIntensity {
    keys: Vec<String>,
    offsets: (f32, f32),
    rng: Mutex<StdRng>,
}

impl RandShiftIntensity {
    pub fn new(
        keys: impl IntoIterator<Item = impl Into<String>>,
        offsets: (f32, f32),
    ) -> Self {
        Self {
            keys: keys.into_iter().map(Into::into).collect(),
            offsets,
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }
}

impl Transform for RandShiftIntensity {
    fn apply(&self, value: Value) -> Result<Value> {
        let offset = {
            let mut rng = self.rng.lock().unwrap();
            rng.gen_range(self.offsets.0..=self.offsets.1)
        };
        for_each_array(self.name(), value, &self.keys, &mut |array| {
            for x in &mut array.data {
                *x += offset;
            }
            Ok(())
        })
    }

    fn is_random(&self) -> bool {
        true
    }

    fn name(&self) -> &'static str {
        "RandShiftIntensity"
    }

    fn set_seed(&self, seed: u64) {
        *self.rng.lock().unwrap() = StdRng::seed_from_u64(seed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{Array, Record};

    fn sample(values: Vec<f32>) -> Value {
        let len = values.len();
        Value::Record(
            Record::new().with("img", Value::Array(Array::new(vec![len], values).unwrap())),
        )
    }

    fn img(value: &Value) -> Vec<f32> {
        value
            .as_record()
            .unwrap()
            .array("img")
            .unwrap()
            .data
            .clone()
    }

    #[test]
    fn test_scale_intensity() {
        let t = ScaleIntensity::new(["img"], 2.0);
        let out = t.apply(sample(vec![1.0, 2.0, 3.0])).unwrap();
        assert_eq!(img(&out), vec![2.0, 4.0, 6.0]);
        assert!(!t.is_random());
    }

    #[test]
    fn test_shift_intensity() {
        let t = ShiftIntensity::new(["img"], -1.0);
        let out = t.apply(sample(vec![1.0, 2.0])).unwrap();
        assert_eq!(img(&out), vec![0.0, 1.0]);
    }

    #[test]
    fn test_normalize_intensity() {
        let t = NormalizeIntensity::new(["img"]);
        let out = t.apply(sample(vec![1.0, 2.0, 3.0, 4.0])).unwrap();
        let data = img(&out);

        let mean: f32 = data.iter().sum::<f32>() / data.len() as f32;
        assert!(mean.abs() < 1e-6);
        // Values equidistant from the mean keep their symmetry
        assert!((data[0] + data[3]).abs() < 1e-6);
    }

    #[test]
    fn test_rand_shift_same_seed_same_offset() {
        let t = RandShiftIntensity::new(["img"], (0.0, 10.0));
        assert!(t.is_random());

        t.set_seed(42);
        let a = t.apply(sample(vec![0.0, 0.0])).unwrap();
        t.set_seed(42);
        let b = t.apply(sample(vec![0.0, 0.0])).unwrap();

        assert_eq!(img(&a), img(&b));
    }

    #[test]
    fn test_rand_shift_applies_same_offset_to_all_keys() {
        let t = RandShiftIntensity::new(["img", "seg"], (0.0, 5.0));
        let value = Value::Record(
            Record::new()
                .with("img", Value::Array(Array::from_elem(vec![2], 0.0)))
                .with("seg", Value::Array(Array::from_elem(vec![2], 0.0))),
        );

        let out = t.apply(value).unwrap();
        let record = out.as_record().unwrap();
        assert_eq!(
            record.array("img").unwrap().data,
            record.array("seg").unwrap().data
        );
    }
}
