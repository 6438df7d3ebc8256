// src/cache/fingerprint.rs

use std::hash::Hasher;

use twox_hash::XxHash64;

use crate::error::{PipelineError, Result};
use crate::value::Value;

/// Computes the cache fingerprint of a raw record.
///
/// The record is serialized to canonical JSON (record fields always
/// serialize in sorted key order) and hashed with XXHash64; the result is
/// a 16-character hex digest used as the cache filename stem.
///
/// # Errors
///
/// Serialization failure is fatal; there is no fallback key.
pub fn fingerprint(value: &Value) -> Result<String> {
    let serialized = serde_json::to_vec(value).map_err(|e| {
        PipelineError::serialization(format!("record not serializable for fingerprinting: {e}"))
    })?;

    let mut hasher = XxHash64::with_seed(0);
    hasher.write(&serialized);
    Ok(format!("{:016x}", hasher.finish()))
}
