//! Sliding token windows.
//!
//! A document's tokens are cut into windows of at most `chunk_size` tokens. Each window starts
//! `chunk_size - chunk_overlap` tokens after the previous one, so consecutive windows share
//! `chunk_overlap` tokens. Highlights:
//!
//! - Fail fast: [`WindowConfig::new`] rejects a zero size or an overlap that would stall the
//!   cursor, before any windowing starts.
//! - No padding: the final window may be shorter than `chunk_size`.
//! - No dropping: a window whose joined text is empty or whitespace is still emitted, so
//!   chunk counts depend only on token counts.

use std::ops::Range;

use super::types::ChunkingError;

/// Default maximum tokens per window.
pub const DEFAULT_CHUNK_SIZE: usize = 800;
/// Default tokens shared between consecutive windows.
pub const DEFAULT_CHUNK_OVERLAP: usize = 0;

/// Validated window geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowConfig {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl WindowConfig {
    /// Validate `chunk_size >= 1` and `chunk_overlap < chunk_size`.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self, ChunkingError> {
        if chunk_size == 0 {
            return Err(ChunkingError::InvalidChunkSize);
        }
        if chunk_overlap >= chunk_size {
            return Err(ChunkingError::InvalidOverlap {
                size: chunk_size,
                overlap: chunk_overlap,
            });
        }
        Ok(Self {
            chunk_size,
            chunk_overlap,
        })
    }

    /// Maximum tokens per window.
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Tokens repeated at the start of the next window.
    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    /// Distance the cursor moves between window starts; always positive.
    pub fn step(&self) -> usize {
        self.chunk_size - self.chunk_overlap
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
        }
    }
}

/// Token index ranges covered by each window over a sequence of `len` tokens.
pub fn token_windows(len: usize, config: &WindowConfig) -> impl Iterator<Item = Range<usize>> {
    let size = config.chunk_size();
    (0..len)
        .step_by(config.step())
        .map(move |start| start..(start + size).min(len))
}

/// Join each window of `tokens` with `separator` and trim the result.
pub fn chunk_tokens<S: AsRef<str>>(
    tokens: &[S],
    separator: &str,
    config: &WindowConfig,
) -> Vec<String> {
    token_windows(tokens.len(), config)
        .map(|range| join_window(&tokens[range], separator))
        .collect()
}

fn join_window<S: AsRef<str>>(window: &[S], separator: &str) -> String {
    let capacity = window.iter().map(|token| token.as_ref().len()).sum::<usize>()
        + separator.len() * window.len().saturating_sub(1);
    let mut joined = String::with_capacity(capacity);
    for (idx, token) in window.iter().enumerate() {
        if idx > 0 {
            joined.push_str(separator);
        }
        joined.push_str(token.as_ref());
    }
    let trimmed = joined.trim();
    if trimmed.len() == joined.len() {
        joined
    } else {
        trimmed.to_string()
    }
}
