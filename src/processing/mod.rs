//! Document chunking pipeline: tokenization, sliding windows, and metadata propagation.

pub mod chunking;
pub mod language;
pub mod mappers;
mod service;
pub mod tokenizer;
pub mod types;

pub use chunking::WindowConfig;
pub use language::TokenizerRouter;
pub use service::{ChunkPipeline, ChunkPipelineBuilder};
pub use tokenizer::{Tokenizer, TokenizerKind, build_tokenizer};
pub use types::{ChunkingError, Document, Metadata, TextChunk};
