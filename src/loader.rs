//! Filesystem front-end that turns files into [`Document`]s.
//!
//! Plain files become one document each, tagged with `source` (full path) and `file_name`.
//! `.jsonl` files are read as one serialized [`Document`] per line, so pre-split corpora can
//! be fed straight to the pipeline. Directories are walked recursively in file-name order.

use std::{
    fs,
    path::{Path, PathBuf},
};

use serde_json::Value;
use thiserror::Error;
use walkdir::WalkDir;

use crate::processing::{Document, Metadata};

/// Metadata key holding the path a document was read from.
pub const SOURCE_KEY: &str = "source";
/// Metadata key holding the file name a document was read from.
pub const FILE_NAME_KEY: &str = "file_name";

/// Errors raised while reading documents from disk.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The file or directory could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Read {
        /// Path that failed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// A `.jsonl` line was not a valid document record.
    #[error("invalid document at {}:{line}: {source}", path.display())]
    Parse {
        /// File containing the record.
        path: PathBuf,
        /// 1-based line number.
        line: usize,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },
}

/// Load every file under `paths`, merging `extra` into each document's metadata.
///
/// Files that are not valid UTF-8 are skipped with a warning.
pub fn load_documents(paths: &[PathBuf], extra: &Metadata) -> Result<Vec<Document>, LoadError> {
    let mut documents = Vec::new();
    for root in paths {
        for entry in WalkDir::new(root).sort_by_file_name() {
            let entry = entry.map_err(|err| LoadError::Read {
                path: err.path().unwrap_or(root.as_path()).to_path_buf(),
                source: err.into(),
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            documents.extend(load_file(entry.path(), extra)?);
        }
    }
    tracing::info!(
        roots = paths.len(),
        documents = documents.len(),
        "Loaded documents"
    );
    Ok(documents)
}

fn load_file(path: &Path, extra: &Metadata) -> Result<Vec<Document>, LoadError> {
    let bytes = fs::read(path).map_err(|source| LoadError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let Ok(content) = String::from_utf8(bytes) else {
        tracing::warn!(path = %path.display(), "Skipping non UTF-8 file");
        return Ok(Vec::new());
    };

    if path.extension().is_some_and(|ext| ext == "jsonl") {
        return parse_json_lines(path, &content, extra);
    }

    let mut metadata = Metadata::new();
    metadata.insert(
        SOURCE_KEY.into(),
        Value::String(path.display().to_string()),
    );
    if let Some(name) = path.file_name() {
        metadata.insert(
            FILE_NAME_KEY.into(),
            Value::String(name.to_string_lossy().into_owned()),
        );
    }
    merge(&mut metadata, extra);
    Ok(vec![Document::with_metadata(content, metadata)])
}

fn parse_json_lines(
    path: &Path,
    content: &str,
    extra: &Metadata,
) -> Result<Vec<Document>, LoadError> {
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(idx, line)| {
            let mut document: Document =
                serde_json::from_str(line).map_err(|source| LoadError::Parse {
                    path: path.to_path_buf(),
                    line: idx + 1,
                    source,
                })?;
            merge(&mut document.metadata, extra);
            Ok(document)
        })
        .collect()
}

fn merge(metadata: &mut Metadata, extra: &Metadata) {
    for (key, value) in extra {
        metadata.insert(key.clone(), value.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn loads_text_and_jsonl_files_in_name_order() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.txt"), "second file").unwrap();
        fs::write(dir.path().join("a.txt"), "first file").unwrap();
        fs::write(
            dir.path().join("c.jsonl"),
            "{\"id\":\"x\",\"text\":\"from json\",\"metadata\":{\"language\":\"en\"}}\n\n{\"text\":null}\n",
        )
        .unwrap();

        let mut extra = Metadata::new();
        extra.insert("knowledge".into(), json!("kb-1"));
        let documents = load_documents(&[dir.path().to_path_buf()], &extra).unwrap();

        let texts: Vec<_> = documents.iter().map(Document::text).collect();
        assert_eq!(texts, vec!["first file", "second file", "from json", ""]);
        assert_eq!(documents[0].metadata[FILE_NAME_KEY], json!("a.txt"));
        assert_eq!(documents[2].id, "x");
        assert_eq!(documents[2].metadata["language"], json!("en"));
        assert!(documents.iter().all(|doc| doc.metadata["knowledge"] == json!("kb-1")));
    }

    #[test]
    fn reports_bad_json_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.jsonl");
        fs::write(&path, "{\"text\":\"ok\"}\nnot json\n").unwrap();

        let error = load_documents(&[path], &Metadata::new()).unwrap_err();
        assert!(matches!(error, LoadError::Parse { line: 2, .. }));
    }

    #[test]
    fn missing_path_is_a_read_error() {
        let error =
            load_documents(&[PathBuf::from("/definitely/not/here")], &Metadata::new()).unwrap_err();
        assert!(matches!(error, LoadError::Read { .. }));
    }

    #[test]
    fn skips_non_utf8_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("blob.bin"), [0xff, 0xfe, 0x00]).unwrap();
        let documents = load_documents(&[dir.path().to_path_buf()], &Metadata::new()).unwrap();
        assert!(documents.is_empty());
    }
}
