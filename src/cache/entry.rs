// src/cache/entry.rs

//! Cache entry encoding.
//!
//! The on-disk entry format is:
//! ```text
//! +--------------------+
//! | Header length (u32)|  <- little-endian
//! +--------------------+
//! | Header (bincode)   |  <- CacheEntryHeader
//! +--------------------+
//! | Compressed payload |  <- bincode-serialized Value, per header
//! +--------------------+
//! ```

use std::hash::Hasher;

use serde::{Deserialize, Serialize};
use twox_hash::XxHash64;

use crate::error::{PipelineError, Result};
use crate::value::Value;

/// Header for a persisted cache entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntryHeader {
    /// Magic bytes identifying this as a cache entry ("MDPC")
    pub magic: [u8; 4],
    /// Format version number
    pub version: u32,
    /// Compression algorithm used ("none", "lz4", or "zstd")
    pub compression: String,
    /// Size of the payload before compression
    pub uncompressed_size: u64,
    /// XXHash64 checksum of the uncompressed payload
    pub checksum: u64,
}

impl CacheEntryHeader {
    /// Magic bytes for cache entry files
    pub const MAGIC: [u8; 4] = *b"MDPC";

    /// Current format version
    pub const VERSION: u32 = 1;

    pub fn new(compression: String, uncompressed_size: u64, checksum: u64) -> Self {
        Self {
            magic: Self::MAGIC,
            version: Self::VERSION,
            compression,
            uncompressed_size,
            checksum,
        }
    }

    pub fn validate_magic(&self) -> bool {
        self.magic == Self::MAGIC
    }

    pub fn validate_version(&self) -> bool {
        self.version == Self::VERSION
    }
}

/// Encodes and decodes cache entries with optional compression and
/// integrity verification.
#[derive(Debug, Clone)]
pub struct EntryCodec {
    compression: String,
    compression_level: i32,
}

impl EntryCodec {
    pub fn new(compression: impl Into<String>, compression_level: i32) -> Self {
        Self {
            compression: compression.into(),
            compression_level,
        }
    }

    /// Encodes a value into the on-disk entry format.
    pub fn encode(&self, value: &Value) -> Result<Vec<u8>> {
        let payload = bincode::serialize(value).map_err(|e| {
            PipelineError::serialization(format!("failed to serialize cache payload: {e}"))
        })?;

        let checksum = calculate_checksum(&payload);
        let compressed = self.compress(&payload)?;

        let header =
            CacheEntryHeader::new(self.compression.clone(), payload.len() as u64, checksum);
        let header_bytes = bincode::serialize(&header).map_err(|e| {
            PipelineError::serialization(format!("failed to serialize entry header: {e}"))
        })?;

        let header_len = header_bytes.len() as u32;
        let mut entry = Vec::with_capacity(4 + header_bytes.len() + compressed.len());
        entry.extend_from_slice(&header_len.to_le_bytes());
        entry.extend_from_slice(&header_bytes);
        entry.extend_from_slice(&compressed);
        Ok(entry)
    }

    /// Decodes an on-disk entry, verifying the checksum.
    pub fn decode(&self, bytes: &[u8]) -> Result<Value> {
        if bytes.len() < 4 {
            return Err(PipelineError::serialization(
                "cache entry too short for header length",
            ));
        }
        let header_len = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as usize;
        if bytes.len() < 4 + header_len {
            return Err(PipelineError::serialization(
                "cache entry truncated inside header",
            ));
        }

        let header: CacheEntryHeader = bincode::deserialize(&bytes[4..4 + header_len])
            .map_err(|e| {
                PipelineError::serialization(format!("failed to deserialize entry header: {e}"))
            })?;

        if !header.validate_magic() {
            return Err(PipelineError::serialization("invalid cache entry magic"));
        }
        if !header.validate_version() {
            return Err(PipelineError::serialization(format!(
                "unsupported cache entry version: {}",
                header.version
            )));
        }

        let payload = decompress(&header.compression, &bytes[4 + header_len..])?;

        if payload.len() as u64 != header.uncompressed_size {
            return Err(PipelineError::serialization(format!(
                "cache payload size mismatch: expected {}, got {}",
                header.uncompressed_size,
                payload.len()
            )));
        }
        if calculate_checksum(&payload) != header.checksum {
            return Err(PipelineError::serialization(
                "cache payload checksum mismatch",
            ));
        }

        bincode::deserialize(&payload).map_err(|e| {
            PipelineError::serialization(format!("failed to deserialize cache payload: {e}"))
        })
    }

    fn compress(&self, data: &[u8]) -> Result<Vec<u8>> {
        match self.compression.as_str() {
            "none" => Ok(data.to_vec()),
            "lz4" => Ok(lz4_flex::compress_prepend_size(data)),
            "zstd" => zstd::encode_all(data, self.compression_level).map_err(|e| {
                PipelineError::serialization(format!("zstd compression failed: {e}"))
            }),
            other => Err(PipelineError::serialization(format!(
                "unknown compression algorithm: {other}"
            ))),
        }
    }
}

fn decompress(compression: &str, data: &[u8]) -> Result<Vec<u8>> {
    match compression {
        "none" => Ok(data.to_vec()),
        "lz4" => lz4_flex::decompress_size_prepended(data).map_err(|e| {
            PipelineError::serialization(format!("lz4 decompression failed: {e}"))
        }),
        "zstd" => zstd::decode_all(data).map_err(|e| {
            PipelineError::serialization(format!("zstd decompression failed: {e}"))
        }),
        other => Err(PipelineError::serialization(format!(
            "unknown compression algorithm: {other}"
        ))),
    }
}

/// Calculates the XXHash64 checksum of a payload.
fn calculate_checksum(data: &[u8]) -> u64 {
    let mut hasher = XxHash64::with_seed(0);
    hasher.write(data);
    hasher.finish()
}
