//! Mapping helpers that turn window texts into lineage-tracked chunks.

use serde_json::Value;

use super::types::{Document, TextChunk, new_id};

/// Metadata key holding a chunk's 0-based position within its document.
pub const CHUNK_INDEX_KEY: &str = "chunk_index";
/// Metadata key holding the number of chunks produced for the document.
pub const CHUNK_COUNT_KEY: &str = "chunk_count";

/// Wrap each window of `document` in a [`TextChunk`].
///
/// Every chunk receives a fresh id and its own copy of the document metadata. With
/// `track_parent` set, chunks also carry `parent_id` plus `chunk_index`/`chunk_count` in their
/// metadata copy. The document is never modified.
pub(crate) fn propagate(
    document: &Document,
    windows: Vec<String>,
    track_parent: bool,
) -> Vec<TextChunk> {
    let chunk_count = windows.len();
    windows
        .into_iter()
        .enumerate()
        .map(|(chunk_index, text)| {
            let mut metadata = document.metadata.clone();
            let parent_id = if track_parent {
                metadata.insert(CHUNK_INDEX_KEY.into(), Value::from(chunk_index));
                metadata.insert(CHUNK_COUNT_KEY.into(), Value::from(chunk_count));
                Some(document.id.clone())
            } else {
                None
            };
            TextChunk {
                id: new_id(),
                text,
                parent_id,
                metadata,
            }
        })
        .collect()
}
