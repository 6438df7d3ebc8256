// src/transform/mod.rs

//! Composable sample transforms.
//!
//! A pipeline is an ordered sequence of transforms, each tagged as
//! deterministic or random through the `Transform::is_random` capability
//! flag. `Compose` derives the cache boundary from that tag: everything
//! strictly before the first random transform is cacheable, the first
//! random transform and everything after it must re-run on every access.

mod compose;
mod intensity;
mod keyed;
mod spatial;

pub use compose::{Compose, Transform};
pub use intensity::{NormalizeIntensity, RandShiftIntensity, ScaleIntensity, ShiftIntensity};
pub use spatial::{CenterSpatialCrop, RandSpatialCrop};
