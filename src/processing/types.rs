//! Core data types and error definitions for the chunking pipeline.

use anyhow::Error as TokenizerError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use uuid::Uuid;

/// Free-form metadata carried from a source document onto its chunks.
pub type Metadata = Map<String, Value>;

/// Errors produced while configuring or running the chunker.
#[derive(Debug, Error)]
pub enum ChunkingError {
    /// A window must hold at least one token.
    #[error("chunk size must be greater than zero")]
    InvalidChunkSize,
    /// The cursor would never advance with this overlap.
    #[error("chunk overlap {overlap} must be smaller than chunk size {size}")]
    InvalidOverlap {
        /// Configured maximum tokens per window.
        size: usize,
        /// Configured overlap between consecutive windows.
        overlap: usize,
    },
    /// Tokenizer resources were unavailable for the configured model.
    #[error("failed to initialize tokenizer for model '{model}': {source}")]
    Tokenizer {
        /// Model or encoding we attempted to load.
        model: String,
        /// Underlying error raised by the tokenizer library.
        #[source]
        source: TokenizerError,
    },
}

/// Source document handed to the pipeline by a loader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Lineage identifier copied onto every chunk as `parent_id`.
    #[serde(default = "new_id")]
    pub id: String,
    /// Raw text; `None` is treated as an empty token sequence.
    #[serde(default)]
    pub text: Option<String>,
    /// Loader-provided metadata.
    #[serde(default)]
    pub metadata: Metadata,
}

impl Document {
    /// Build a document with a fresh id and no metadata.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            text: Some(text.into()),
            metadata: Metadata::new(),
        }
    }

    /// Build a document with a fresh id and the supplied metadata.
    pub fn with_metadata(text: impl Into<String>, metadata: Metadata) -> Self {
        Self {
            metadata,
            ..Self::new(text)
        }
    }

    /// Replace the generated id with a loader-supplied one.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Text to tokenize, empty when the loader supplied none.
    pub fn text(&self) -> &str {
        self.text.as_deref().unwrap_or_default()
    }
}

/// One token window re-materialized as text, ready for embedding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextChunk {
    /// Unique identifier for this chunk.
    pub id: String,
    /// Window text.
    pub text: String,
    /// Id of the originating document when lineage tracking is enabled.
    pub parent_id: Option<String>,
    /// Copy of the source document's metadata.
    pub metadata: Metadata,
}

pub(crate) fn new_id() -> String {
    Uuid::new_v4().to_string()
}
