//! TOML configuration parsing and validation.
//!
//! ```toml
//! [db]
//! path = "./data/shx.sqlite"
//!
//! [inference]
//! sample_size = 30
//! array_sample_cap = 3
//!
//! [logging]
//! level = "warn"
//! ```
//!
//! Only `[db]` is required; the values above are the defaults.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use schema_harness_core::EngineConfig;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    #[serde(default)]
    pub inference: InferenceConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct InferenceConfig {
    /// Number of most recent raw records sampled per inference pass.
    #[serde(default = "default_sample_size")]
    pub sample_size: usize,
    /// Leading array elements profiled per array.
    #[serde(default = "default_array_sample_cap")]
    pub array_sample_cap: usize,
    #[serde(default = "default_max_conflict_retries")]
    pub max_conflict_retries: u32,
    /// Pending background inference jobs before new ones are dropped.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            sample_size: 30,
            array_sample_cap: 3,
            max_conflict_retries: 5,
            queue_capacity: 64,
        }
    }
}

fn default_sample_size() -> usize {
    30
}
fn default_array_sample_cap() -> usize {
    3
}
fn default_max_conflict_retries() -> u32 {
    5
}
fn default_queue_capacity() -> usize {
    64
}

impl InferenceConfig {
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            default_sample_size: self.sample_size,
            array_sample_cap: self.array_sample_cap,
            max_conflict_retries: self.max_conflict_retries,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    /// A level (`"info"`) or a full filter directive
    /// (`"info,schema_harness=debug,sqlx=warn"`). `RUST_LOG` wins if set.
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Emit JSON lines instead of human-readable text.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_log_level() -> String {
    "warn".to_string()
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    if config.inference.sample_size == 0 {
        anyhow::bail!("inference.sample_size must be > 0");
    }
    if config.inference.array_sample_cap == 0 {
        anyhow::bail!("inference.array_sample_cap must be > 0");
    }
    if config.inference.queue_capacity == 0 {
        anyhow::bail!("inference.queue_capacity must be > 0");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let cfg: Config = toml::from_str("[db]\npath = \"/tmp/x.sqlite\"\n").unwrap();
        assert_eq!(cfg.inference.sample_size, 30);
        assert_eq!(cfg.inference.array_sample_cap, 3);
        assert_eq!(cfg.inference.queue_capacity, 64);
        assert_eq!(cfg.logging.level, "warn");
        assert!(!cfg.logging.json);
        assert!(validate(&cfg).is_ok());
    }

    #[test]
    fn test_engine_config_mapping() {
        let cfg: Config = toml::from_str(
            "[db]\npath = \"x\"\n[inference]\nsample_size = 10\narray_sample_cap = 5\n",
        )
        .unwrap();
        let engine = cfg.inference.engine_config();
        assert_eq!(engine.default_sample_size, 10);
        assert_eq!(engine.array_sample_cap, 5);
        assert_eq!(engine.max_conflict_retries, 5);
    }

    #[test]
    fn test_rejects_zero_values() {
        let cfg: Config =
            toml::from_str("[db]\npath = \"x\"\n[inference]\nsample_size = 0\n").unwrap();
        assert!(validate(&cfg).is_err());

        let cfg: Config =
            toml::from_str("[db]\npath = \"x\"\n[inference]\narray_sample_cap = 0\n").unwrap();
        assert!(validate(&cfg).is_err());
    }

    #[test]
    fn test_example_config_matches_defaults() {
        let cfg: Config = toml::from_str(include_str!("../config/shx.example.toml")).unwrap();
        let defaults = InferenceConfig::default();
        assert_eq!(cfg.inference.sample_size, defaults.sample_size);
        assert_eq!(cfg.inference.array_sample_cap, defaults.array_sample_cap);
        assert_eq!(cfg.inference.max_conflict_retries, defaults.max_conflict_retries);
        assert_eq!(cfg.inference.queue_capacity, defaults.queue_capacity);
        assert_eq!(cfg.logging.level, LoggingConfig::default().level);
        assert_eq!(cfg.logging.json, LoggingConfig::default().json);
        assert!(validate(&cfg).is_ok());
    }

    #[test]
    fn test_missing_file_errors() {
        let err = load_config(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
