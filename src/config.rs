use std::env;

use thiserror::Error;

use crate::processing::{
    ChunkingError, TokenizerKind, WindowConfig,
    chunking::{DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE},
    language::DEFAULT_LANGUAGE_KEY,
};

/// Errors encountered while loading configuration from environment variables.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Environment variable contained a value that could not be parsed.
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}

/// Runtime configuration for the chunking pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Maximum tokens per window.
    pub chunk_size: usize,
    /// Tokens repeated at the start of the next window.
    pub chunk_overlap: usize,
    /// Default tokenizer strategy.
    pub tokenizer: TokenizerKind,
    /// Whether chunks record their source document.
    pub track_parent: bool,
    /// Metadata key holding a document's language tag.
    pub language_key: String,
    /// Whether untagged documents are routed by detected script.
    pub auto_detect_language: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
            tokenizer: TokenizerKind::Whitespace,
            track_parent: true,
            language_key: DEFAULT_LANGUAGE_KEY.to_string(),
            auto_detect_language: true,
        }
    }
}

impl Config {
    /// Load configuration from environment variables, after reading `.env` when present.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        let config = Self::from_env()?;
        tracing::debug!(
            chunk_size = config.chunk_size,
            chunk_overlap = config.chunk_overlap,
            tokenizer = %config.tokenizer,
            track_parent = config.track_parent,
            "Loaded configuration"
        );
        Ok(config)
    }

    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            chunk_size: parse_optional("TEXT_SPLITTER_CHUNK_SIZE")?
                .unwrap_or(defaults.chunk_size),
            chunk_overlap: parse_optional("TEXT_SPLITTER_CHUNK_OVERLAP")?
                .unwrap_or(defaults.chunk_overlap),
            tokenizer: load_env_optional("TEXT_SPLITTER_TOKENIZER")
                .map(|value| {
                    value.parse().map_err(|()| {
                        ConfigError::InvalidValue("TEXT_SPLITTER_TOKENIZER".to_string())
                    })
                })
                .transpose()?
                .unwrap_or(defaults.tokenizer),
            track_parent: parse_bool("TEXT_SPLITTER_TRACK_PARENT")?
                .unwrap_or(defaults.track_parent),
            language_key: load_env_optional("TEXT_SPLITTER_LANGUAGE_KEY")
                .unwrap_or(defaults.language_key),
            auto_detect_language: parse_bool("TEXT_SPLITTER_AUTO_DETECT")?
                .unwrap_or(defaults.auto_detect_language),
        })
    }

    /// Validate the configured window geometry.
    pub fn window(&self) -> Result<WindowConfig, ChunkingError> {
        WindowConfig::new(self.chunk_size, self.chunk_overlap)
    }
}

fn load_env_optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_optional(key: &str) -> Result<Option<usize>, ConfigError> {
    load_env_optional(key)
        .map(|value| {
            value
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue(key.to_string()))
        })
        .transpose()
}

fn parse_bool(key: &str) -> Result<Option<bool>, ConfigError> {
    load_env_optional(key)
        .map(|value| match value.trim().to_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::InvalidValue(key.to_string())),
        })
        .transpose()
}
