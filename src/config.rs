// src/config.rs

//! Configuration management for the data pipeline.
//!
//! This module provides configuration parsing from TOML files, environment
//! variable overrides, and validation of configuration values.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{PipelineError, Result};

// Top-level pipeline configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub cache: CacheConfig,
    pub warmup: WarmupConfig,
}

// Persistent cache configuration options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    // Directory for persistent cache entries.
    pub cache_dir: PathBuf,
    // Compression algorithm for cache entries: "none", "lz4", or "zstd".
    pub compression: String,
    // Compression level (algorithm-specific).
    pub compression_level: i32,
}

/// Eager warm-up configuration options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WarmupConfig {
    /// Upper bound on the number of items to cache. `None` means no bound;
    /// the effective count is always clamped by `cache_rate` and the
    /// dataset length.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_num: Option<usize>,
    /// Fraction of the dataset to cache, in `[0.0, 1.0]`.
    pub cache_rate: f64,
    /// Number of warm-up worker threads. 0 runs the warm-up serially on
    /// the calling thread.
    pub num_workers: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            cache_dir: PathBuf::from("./cache"),
            compression: "none".to_string(),
            compression_level: 1,
        }
    }
}

impl Default for WarmupConfig {
    fn default() -> Self {
        Self {
            cache_num: None,
            cache_rate: 1.0,
            num_workers: 0,
        }
    }
}

impl FromStr for PipelineConfig {
    type Err = PipelineError;

    /// Parse configuration from a TOML string.
    fn from_str(s: &str) -> Result<Self> {
        toml::from_str(s)
            .map_err(|e| PipelineError::config_with_source("failed to parse TOML config", e))
    }
}

impl PipelineConfig {
    // Load configuration from a TOML file.
    //
    // # Errors
    //
    // Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            PipelineError::cache_with_source(path, "failed to read config file", e)
        })?;
        let config: Self = content.parse()?;
        config.validate()?;
        Ok(config)
    }

    // Apply environment variable overrides.
    //
    // Environment variables are prefixed with `MDP_` and use underscores
    // to separate nested fields. For example:
    // - `MDP_CACHE_DIR` overrides `cache.cache_dir`
    // - `MDP_CACHE_COMPRESSION` overrides `cache.compression`
    // - `MDP_WARMUP_CACHE_RATE` overrides `warmup.cache_rate`
    #[must_use]
    pub fn with_env_overrides(mut self) -> Self {
        // Cache overrides
        if let Ok(val) = std::env::var("MDP_CACHE_DIR") {
            self.cache.cache_dir = PathBuf::from(val);
        }
        if let Ok(val) = std::env::var("MDP_CACHE_COMPRESSION") {
            self.cache.compression = val;
        }
        if let Ok(val) = std::env::var("MDP_CACHE_COMPRESSION_LEVEL") {
            if let Ok(v) = val.parse() {
                self.cache.compression_level = v;
            }
        }

        // Warm-up overrides
        if let Ok(val) = std::env::var("MDP_WARMUP_CACHE_NUM") {
            if let Ok(v) = val.parse() {
                self.warmup.cache_num = Some(v);
            }
        }
        if let Ok(val) = std::env::var("MDP_WARMUP_CACHE_RATE") {
            if let Ok(v) = val.parse() {
                self.warmup.cache_rate = v;
            }
        }
        if let Ok(val) = std::env::var("MDP_WARMUP_NUM_WORKERS") {
            if let Ok(v) = val.parse() {
                self.warmup.num_workers = v;
            }
        }

        self
    }

    // Validate all configuration values.
    //
    // # Errors
    //
    // Returns an error if any configuration value is invalid.
    pub fn validate(&self) -> Result<()> {
        // Cache validation
        let valid_compression = ["none", "lz4", "zstd"];
        if !valid_compression.contains(&self.cache.compression.as_str()) {
            return Err(PipelineError::config(format!(
                "cache.compression must be one of: {}",
                valid_compression.join(", ")
            )));
        }

        // Warm-up validation
        if !(0.0..=1.0).contains(&self.warmup.cache_rate) {
            return Err(PipelineError::config(
                "warmup.cache_rate must be in [0.0, 1.0]",
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = PipelineConfig::default();

        assert_eq!(config.cache.cache_dir, PathBuf::from("./cache"));
        assert_eq!(config.cache.compression, "none");
        assert_eq!(config.cache.compression_level, 1);

        assert!(config.warmup.cache_num.is_none());
        assert_eq!(config.warmup.cache_rate, 1.0);
        assert_eq!(config.warmup.num_workers, 0);
    }

    #[test]
    fn test_default_validates() {
        let config = PipelineConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_str_empty() {
        let config: PipelineConfig = "".parse().unwrap();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_str_partial() {
        let toml = r#"
            [cache]
            cache_dir = "/custom/cache"
        "#;
        let config: PipelineConfig = toml.parse().unwrap();

        assert_eq!(config.cache.cache_dir, PathBuf::from("/custom/cache"));
        // Other fields should be defaults
        assert_eq!(config.cache.compression, "none");
        assert_eq!(config.warmup.cache_rate, 1.0);
    }

    #[test]
    fn test_from_str_full() {
        let toml = r#"
            [cache]
            cache_dir = "/data/cache"
            compression = "zstd"
            compression_level = 3

            [warmup]
            cache_num = 128
            cache_rate = 0.5
            num_workers = 4
        "#;

        let config: PipelineConfig = toml.parse().unwrap();

        assert_eq!(config.cache.cache_dir, PathBuf::from("/data/cache"));
        assert_eq!(config.cache.compression, "zstd");
        assert_eq!(config.cache.compression_level, 3);

        assert_eq!(config.warmup.cache_num, Some(128));
        assert_eq!(config.warmup.cache_rate, 0.5);
        assert_eq!(config.warmup.num_workers, 4);
    }

    #[test]
    fn test_from_str_invalid_toml() {
        let result: std::result::Result<PipelineConfig, _> = "invalid = [".parse();
        assert!(result.is_err());
    }

    #[test]
    fn test_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
            [cache]
            cache_dir = "/tmp/test-cache"
            "#
        )
        .unwrap();

        let config = PipelineConfig::from_file(file.path()).unwrap();
        assert_eq!(config.cache.cache_dir, PathBuf::from("/tmp/test-cache"));
    }

    #[test]
    fn test_from_file_not_found() {
        let result = PipelineConfig::from_file("/nonexistent/config.toml");
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_invalid_compression() {
        let mut config = PipelineConfig::default();
        config.cache.compression = "gzip".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_valid_compression_lz4() {
        let mut config = PipelineConfig::default();
        config.cache.compression = "lz4".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_cache_rate_out_of_range() {
        let mut config = PipelineConfig::default();
        config.warmup.cache_rate = 1.5;
        assert!(config.validate().is_err());

        config.warmup.cache_rate = -0.1;
        assert!(config.validate().is_err());

        config.warmup.cache_rate = 0.0;
        assert!(config.validate().is_ok());
    }

    // Helper to clear all MDP_ environment variables for test isolation
    fn clear_mdp_env_vars() {
        for (key, _) in std::env::vars() {
            if key.starts_with("MDP_") {
                std::env::remove_var(&key);
            }
        }
    }

    // Environment variable tests are combined into a single test to avoid
    // race conditions when tests run in parallel, since env vars are global state.
    #[test]
    fn test_env_overrides() {
        clear_mdp_env_vars();

        std::env::set_var("MDP_CACHE_DIR", "/env/cache");
        std::env::set_var("MDP_CACHE_COMPRESSION", "lz4");
        std::env::set_var("MDP_WARMUP_CACHE_NUM", "64");
        std::env::set_var("MDP_WARMUP_CACHE_RATE", "0.25");
        std::env::set_var("MDP_WARMUP_NUM_WORKERS", "8");

        let config = PipelineConfig::default().with_env_overrides();

        assert_eq!(config.cache.cache_dir, PathBuf::from("/env/cache"));
        assert_eq!(config.cache.compression, "lz4");
        assert_eq!(config.warmup.cache_num, Some(64));
        assert_eq!(config.warmup.cache_rate, 0.25);
        assert_eq!(config.warmup.num_workers, 8);

        clear_mdp_env_vars();

        // Invalid values should be ignored (keep defaults)
        std::env::set_var("MDP_WARMUP_NUM_WORKERS", "not_a_number");

        let config = PipelineConfig::default().with_env_overrides();
        assert_eq!(config.warmup.num_workers, 0);

        clear_mdp_env_vars();
    }

    #[test]
    fn test_serialize_roundtrip() {
        let original = PipelineConfig::default();
        let toml_str = toml::to_string(&original).unwrap();
        let parsed: PipelineConfig = toml_str.parse().unwrap();

        assert_eq!(original.cache.cache_dir, parsed.cache.cache_dir);
        assert_eq!(original.cache.compression, parsed.cache.compression);
        assert_eq!(original.warmup.cache_rate, parsed.warmup.cache_rate);
    }
}
