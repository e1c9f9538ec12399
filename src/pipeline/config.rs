//! Pipeline configuration
//!
//! Values come from three layers, later ones winning: built-in defaults, an
//! optional JSON file, then `TRANSLATOR_*` environment variables. The CLI
//! applies its flags on top.
//!
//! ```json
//! {
//!     "max_chunk_chars": 1000,
//!     "concurrency": 2,
//!     "max_retries": 2,
//!     "backoff": { "kind": "fixed", "delay_ms": 1000 },
//!     "providers": ["google", "lingva", "mymemory"]
//! }
//! ```

use crate::mt::error::ProviderError;
use crate::pipeline::cache::DEFAULT_CACHE_CAPACITY;
use crate::pipeline::error::PipelineError;
use crate::pipeline::segmenter::DEFAULT_MAX_CHUNK_CHARS;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file '{path}': {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid value for {key}: '{value}'")]
    InvalidValue { key: String, value: String },

    #[error("Unknown translation provider: {0}")]
    UnknownProvider(String),

    #[error("Missing credential: {0}")]
    MissingCredential(String),

    #[error("Failed to set up provider '{name}': {source}")]
    Provider {
        name: String,
        #[source]
        source: ProviderError,
    },
}

/// Delay between failed retry rounds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Backoff {
    /// Same delay before every retry round
    Fixed { delay_ms: u64 },
    /// `round * step_ms`
    Linear { step_ms: u64 },
    /// `base_ms * 2^(round - 1)`, capped at `max_ms`
    Exponential { base_ms: u64, max_ms: u64 },
}

impl Backoff {
    /// Delay before retry round `round` (1 for the first retry)
    pub fn delay(&self, round: u32) -> Duration {
        let round = round.max(1);
        let millis = match *self {
            Backoff::Fixed { delay_ms } => delay_ms,
            Backoff::Linear { step_ms } => step_ms.saturating_mul(round as u64),
            Backoff::Exponential { base_ms, max_ms } => {
                let factor = 1u64.checked_shl(round - 1).unwrap_or(u64::MAX);
                base_ms.saturating_mul(factor).min(max_ms)
            }
        };
        Duration::from_millis(millis)
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Backoff::Fixed { delay_ms: 1000 }
    }
}

/// Everything a translation session needs to know besides its providers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Maximum chunk length in characters
    pub max_chunk_chars: usize,
    /// Number of chunks translated concurrently
    pub concurrency: usize,
    /// Extra rounds over all providers after the first one fails
    pub max_retries: u32,
    pub backoff: Backoff,
    /// Upper bound for a single provider request
    pub request_timeout_ms: u64,
    pub cache_capacity: usize,
    /// Pause a worker takes after each chunk while more chunks are queued
    pub pacing_ms: u64,
    /// Provider names in priority order
    pub providers: Vec<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_chunk_chars: DEFAULT_MAX_CHUNK_CHARS,
            concurrency: 2,
            max_retries: 2,
            backoff: Backoff::default(),
            request_timeout_ms: 15_000,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            pacing_ms: 100,
            providers: vec![
                "google".to_string(),
                "lingva".to_string(),
                "mymemory".to_string(),
            ],
        }
    }
}

impl PipelineConfig {
    /// Load a JSON config file; missing fields keep their defaults
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Json {
            path: path.display().to_string(),
            source,
        })
    }

    /// Defaults overridden by the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Apply `TRANSLATOR_*` overrides read through `lookup`
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("TRANSLATOR_MAX_CHUNK_CHARS") {
            self.max_chunk_chars = parse_number("TRANSLATOR_MAX_CHUNK_CHARS", &v)?;
        }
        if let Some(v) = lookup("TRANSLATOR_CONCURRENCY") {
            self.concurrency = parse_number("TRANSLATOR_CONCURRENCY", &v)?;
        }
        if let Some(v) = lookup("TRANSLATOR_MAX_RETRIES") {
            self.max_retries = parse_number("TRANSLATOR_MAX_RETRIES", &v)?;
        }
        if let Some(v) = lookup("TRANSLATOR_BACKOFF_MS") {
            self.backoff = Backoff::Fixed {
                delay_ms: parse_number("TRANSLATOR_BACKOFF_MS", &v)?,
            };
        }
        if let Some(v) = lookup("TRANSLATOR_REQUEST_TIMEOUT_MS") {
            self.request_timeout_ms = parse_number("TRANSLATOR_REQUEST_TIMEOUT_MS", &v)?;
        }
        if let Some(v) = lookup("TRANSLATOR_CACHE_CAPACITY") {
            self.cache_capacity = parse_number("TRANSLATOR_CACHE_CAPACITY", &v)?;
        }
        if let Some(v) = lookup("TRANSLATOR_PACING_MS") {
            self.pacing_ms = parse_number("TRANSLATOR_PACING_MS", &v)?;
        }
        if let Some(v) = lookup("TRANSLATOR_PROVIDERS") {
            self.providers = parse_provider_list(&v);
        }
        Ok(())
    }

    /// Reject values the pipeline cannot run with
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.max_chunk_chars == 0 {
            return Err(PipelineError::InvalidInput(
                "max_chunk_chars must be greater than zero".to_string(),
            ));
        }
        if self.concurrency == 0 {
            return Err(PipelineError::InvalidInput(
                "concurrency must be greater than zero".to_string(),
            ));
        }
        if self.cache_capacity == 0 {
            return Err(PipelineError::InvalidInput(
                "cache_capacity must be greater than zero".to_string(),
            ));
        }
        if self.request_timeout_ms == 0 {
            return Err(PipelineError::InvalidInput(
                "request_timeout_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn pacing(&self) -> Duration {
        Duration::from_millis(self.pacing_ms)
    }
}

/// Split a comma separated provider list, dropping blanks
pub fn parse_provider_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    })
}
