//! Configuration for the ingestion pipeline

use serde::Deserialize;
use std::env;

/// Default maximum file size: 50 MiB
pub const DEFAULT_MAX_FILE_SIZE: u64 = 50 * 1024 * 1024;

/// Default number of pages to build text layers for
pub const DEFAULT_TEXT_LAYER_PAGE_LIMIT: usize = 20;

/// What to do when a candidate file matches a stored file by name and size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicateStrategy {
    /// Return a `duplicate` result referencing the existing book
    #[default]
    Skip,
    /// Ingest the file again regardless
    Allow,
}

/// Recognized ingestion options
#[derive(Debug, Clone, Deserialize)]
pub struct IngestConfig {
    /// Maximum accepted file size in bytes
    pub max_file_size: u64,
    /// Duplicate handling strategy
    pub duplicate_strategy: DuplicateStrategy,
    /// Upper bound on per-page text layers
    pub text_layer_page_limit: usize,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            duplicate_strategy: DuplicateStrategy::default(),
            text_layer_page_limit: DEFAULT_TEXT_LAYER_PAGE_LIMIT,
        }
    }
}

impl IngestConfig {
    /// Build a configuration from environment variables, falling back to
    /// the defaults for anything unset or unparsable.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_file_size: env::var("INGEST_MAX_FILE_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_file_size),
            duplicate_strategy: match env::var("INGEST_DUPLICATE_STRATEGY").as_deref() {
                Ok("allow") => DuplicateStrategy::Allow,
                Ok("skip") => DuplicateStrategy::Skip,
                _ => defaults.duplicate_strategy,
            },
            text_layer_page_limit: env::var("INGEST_TEXT_LAYER_PAGE_LIMIT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.text_layer_page_limit),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = IngestConfig::default();
        assert_eq!(config.max_file_size, 50 * 1024 * 1024);
        assert_eq!(config.duplicate_strategy, DuplicateStrategy::Skip);
        assert_eq!(config.text_layer_page_limit, 20);
    }
}
