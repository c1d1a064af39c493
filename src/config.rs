//! Configuration for recall
//!
//! Loaded from a TOML file; every field has a default so a missing file
//! means a fully usable configuration.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Top-level configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Path to the SQLite database
    pub db_path: PathBuf,
    pub embedding: EmbeddingConfig,
    pub agent: AgentConfig,
    pub retry: RetryConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Vector dimensionality of the hashing encoder
    pub dim: usize,
}

/// Learning parameters for the adaptation agent
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Weight assigned to a component never seen before
    pub initial_weight: f64,
    /// Scales the per-run adjustment
    pub learning_rate: f64,
    /// Hard cap on how far one run can move a single weight
    pub max_delta: f64,
    /// Lower bound for any weight
    pub min_weight: f64,
    /// Upper bound for any weight
    pub max_weight: f64,
    /// Below this a component gets an improvement recommendation
    pub focus_threshold: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Attempts before a storage failure is surfaced
    pub max_attempts: u32,
    /// First backoff delay; doubles per attempt
    pub base_delay_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("recall.db"),
            embedding: EmbeddingConfig::default(),
            agent: AgentConfig::default(),
            retry: RetryConfig::default(),
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self { dim: 64 }
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            initial_weight: 0.5,
            learning_rate: 0.1,
            max_delta: 0.1,
            min_weight: 0.0,
            max_weight: 2.0,
            focus_threshold: 0.4,
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 100,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file. A missing file yields defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config from {}", path.display()))?;
        Ok(config)
    }
}
