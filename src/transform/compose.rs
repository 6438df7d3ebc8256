// src/transform/compose.rs

use std::sync::Arc;

use crate::error::Result;
use crate::value::Value;

/// A single transform step in a pipeline.
///
/// Transforms take one sample value and produce one sample value; they are
/// free to replace, augment, or pass through the input. Random transforms
/// report `is_random() == true` and hold their own random state, which
/// `set_seed` re-seeds; deterministic transforms ignore `set_seed`.
pub trait Transform: Send + Sync {
    /// Applies the transform to a sample.
    fn apply(&self, value: Value) -> Result<Value>;

    /// Whether this transform draws random parameters.
    fn is_random(&self) -> bool {
        false
    }

    /// Name of this transform, used in error messages.
    fn name(&self) -> &'static str;

    /// Re-seeds the transform's random state. No-op for deterministic
    /// transforms.
    fn set_seed(&self, seed: u64) {
        let _ = seed;
    }
}

/// An ordered pipeline of transforms with a derived cache boundary.
///
/// The boundary sits at the first transform whose `is_random()` flag is
/// set: `apply_prefix` runs everything strictly before it, `apply_suffix`
/// runs it and everything after. Once any transform is random, all
/// subsequent transforms are treated as random-dependent regardless of
/// their own tag.
///
/// `Compose` implements `Transform` itself, so a nested pipeline or a
/// single bare transform can be used anywhere a pipeline is expected.
#[derive(Clone, Default)]
pub struct Compose {
    transforms: Vec<Arc<dyn Transform>>,
}

impl Compose {
    /// Creates a pipeline from an ordered list of transforms.
    pub fn new(transforms: Vec<Arc<dyn Transform>>) -> Self {
        Self { transforms }
    }

    /// Wraps a single transform as a one-element pipeline.
    pub fn single(transform: Arc<dyn Transform>) -> Self {
        Self {
            transforms: vec![transform],
        }
    }

    /// Adds a transform to the end of the pipeline.
    #[must_use]
    pub fn push(mut self, transform: Arc<dyn Transform>) -> Self {
        self.transforms.push(transform);
        self
    }

    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }

    /// Index of the first random transform, or `len()` if none is random.
    pub fn split_index(&self) -> usize {
        self.transforms
            .iter()
            .position(|t| t.is_random())
            .unwrap_or(self.transforms.len())
    }

    /// Runs the full pipeline.
    pub fn apply(&self, mut value: Value) -> Result<Value> {
        for transform in &self.transforms {
            value = transform.apply(value)?;
        }
        Ok(value)
    }

    /// Runs the transforms strictly before the first random one.
    ///
    /// This is the cacheable part of the pipeline: for a fixed input it
    /// always produces the same output.
    pub fn apply_prefix(&self, mut value: Value) -> Result<Value> {
        for transform in &self.transforms[..self.split_index()] {
            value = transform.apply(value)?;
        }
        Ok(value)
    }

    /// Runs the first random transform and everything after it.
    ///
    /// Expects a value already processed by `apply_prefix`.
    pub fn apply_suffix(&self, mut value: Value) -> Result<Value> {
        for transform in &self.transforms[self.split_index()..] {
            value = transform.apply(value)?;
        }
        Ok(value)
    }
}

impl Transform for Compose {
    fn apply(&self, value: Value) -> Result<Value> {
        Compose::apply(self, value)
    }

    fn is_random(&self) -> bool {
        self.transforms.iter().any(|t| t.is_random())
    }

    fn name(&self) -> &'static str {
        "Compose"
    }

    fn set_seed(&self, seed: u64) {
        for transform in &self.transforms {
            transform.set_seed(seed);
        }
    }
}

impl std::fmt::Debug for Compose {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Compose")
            .field("len", &self.transforms.len())
            .field("split_index", &self.split_index())
            .finish()
    }
}

impl From<Arc<dyn Transform>> for Compose {
    fn from(transform: Arc<dyn Transform>) -> Self {
        Self::single(transform)
    }
}
