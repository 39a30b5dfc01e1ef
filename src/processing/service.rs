//! Pipeline service coordinating tokenization, windowing, and metadata propagation.

use std::sync::Arc;

use rayon::prelude::*;

use crate::{
    config::Config,
    metrics::{MetricsSnapshot, PipelineMetrics},
};

use super::{
    chunking::{WindowConfig, chunk_tokens},
    language::TokenizerRouter,
    mappers::propagate,
    tokenizer::{Tokenizer, TokenizerKind, build_tokenizer},
    types::{ChunkingError, Document, TextChunk},
};

/// Turns documents into overlapping token-window chunks.
///
/// The pipeline owns the validated window geometry, the tokenizer router, and a metrics
/// registry. Construct it once and share it; `split` and `split_parallel` take `&self`.
pub struct ChunkPipeline {
    window: WindowConfig,
    router: TokenizerRouter,
    track_parent: bool,
    metrics: Arc<PipelineMetrics>,
}

/// Builder for [`ChunkPipeline`].
#[derive(Debug, Default)]
pub struct ChunkPipelineBuilder {
    window: WindowConfig,
    router: TokenizerRouter,
    track_parent: Option<bool>,
}

impl ChunkPipelineBuilder {
    /// Use a validated window geometry.
    pub fn window(mut self, window: WindowConfig) -> Self {
        self.window = window;
        self
    }

    /// Route every document to a single tokenizer.
    pub fn tokenizer(mut self, tokenizer: Arc<dyn Tokenizer>) -> Self {
        self.router = TokenizerRouter::new(tokenizer);
        self
    }

    /// Route documents by language or script.
    pub fn router(mut self, router: TokenizerRouter) -> Self {
        self.router = router;
        self
    }

    /// Record `parent_id` and chunk position on each chunk (on by default).
    pub fn track_parent(mut self, enabled: bool) -> Self {
        self.track_parent = Some(enabled);
        self
    }

    /// Finish building.
    pub fn build(self) -> ChunkPipeline {
        ChunkPipeline {
            window: self.window,
            router: self.router,
            track_parent: self.track_parent.unwrap_or(true),
            metrics: Arc::new(PipelineMetrics::new()),
        }
    }
}

impl ChunkPipeline {
    /// Start configuring a pipeline.
    pub fn builder() -> ChunkPipelineBuilder {
        ChunkPipelineBuilder::default()
    }

    /// Pipeline with a single tokenizer and the given geometry.
    pub fn new(window: WindowConfig, tokenizer: Arc<dyn Tokenizer>) -> Self {
        Self::builder().window(window).tokenizer(tokenizer).build()
    }

    /// Build a pipeline from runtime configuration.
    ///
    /// The configured tokenizer is the default route. With a whitespace or unicode default,
    /// Chinese documents (tagged or detected) go to the jieba segmenter when the crate is built
    /// with it. A BPE default handles every document, so `chunk_size` always counts model
    /// tokens. Window geometry is validated first, so a bad configuration fails before any
    /// tokenizer is loaded.
    pub fn from_config(config: &Config) -> Result<Self, ChunkingError> {
        let window = config.window()?;
        let default = build_tokenizer(&config.tokenizer)?;
        let mut router = TokenizerRouter::new(default)
            .with_language_key(config.language_key.clone())
            .with_script_detection(config.auto_detect_language);
        let routes_chinese = matches!(
            config.tokenizer,
            TokenizerKind::Whitespace | TokenizerKind::Unicode
        );
        if cfg!(feature = "jieba") && routes_chinese {
            router = router.with_language("zh", build_tokenizer(&TokenizerKind::Jieba)?);
        }
        tracing::info!(
            chunk_size = window.chunk_size(),
            chunk_overlap = window.chunk_overlap(),
            tokenizer = %config.tokenizer,
            router = ?router,
            "Chunk pipeline ready"
        );
        Ok(Self::builder()
            .window(window)
            .router(router)
            .track_parent(config.track_parent)
            .build())
    }

    /// Window geometry applied to every document.
    pub fn window(&self) -> WindowConfig {
        self.window
    }

    /// Chunk every document in order; windows never span two documents.
    pub fn split(&self, documents: &[Document]) -> Vec<TextChunk> {
        let chunks: Vec<TextChunk> = documents
            .iter()
            .flat_map(|document| self.split_document(document))
            .collect();
        tracing::info!(
            documents = documents.len(),
            chunks = chunks.len(),
            "Split documents"
        );
        chunks
    }

    /// Same output as [`ChunkPipeline::split`], with documents chunked in parallel.
    pub fn split_parallel(&self, documents: &[Document]) -> Vec<TextChunk> {
        let per_document: Vec<Vec<TextChunk>> = documents
            .par_iter()
            .map(|document| self.split_document(document))
            .collect();
        let chunks: Vec<TextChunk> = per_document.into_iter().flatten().collect();
        tracing::info!(
            documents = documents.len(),
            chunks = chunks.len(),
            "Split documents in parallel"
        );
        chunks
    }

    /// Chunk a single document.
    pub fn split_document(&self, document: &Document) -> Vec<TextChunk> {
        let tokenizer = self.router.select(document);
        let tokens = tokenizer.tokenize(document.text());
        let windows = chunk_tokens(&tokens, tokenizer.separator(), &self.window);
        let chunks = propagate(document, windows, self.track_parent);

        if chunks.is_empty() {
            tracing::debug!(document = %document.id, "Document produced no tokens; skipping");
        } else {
            tracing::debug!(
                document = %document.id,
                tokens = tokens.len(),
                chunks = chunks.len(),
                chunk_size = self.window.chunk_size(),
                chunk_overlap = self.window.chunk_overlap(),
                "Chunked document"
            );
        }
        self.metrics
            .record_document(tokens.len() as u64, chunks.len() as u64);
        chunks
    }

    /// Return the current pipeline metrics snapshot.
    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::tokenizer::WhitespaceTokenizer;
    use serde_json::{Map, json};

    fn pipeline(size: usize, overlap: usize) -> ChunkPipeline {
        ChunkPipeline::new(
            WindowConfig::new(size, overlap).unwrap(),
            Arc::new(WhitespaceTokenizer),
        )
    }

    fn texts(chunks: &[TextChunk]) -> Vec<&str> {
        chunks.iter().map(|chunk| chunk.text.as_str()).collect()
    }

    #[test]
    fn documents_are_windowed_independently() {
        let documents = vec![
            Document::new("a b c d e").with_id("first"),
            Document::new("f g").with_id("second"),
        ];
        let chunks = pipeline(3, 1).split(&documents);

        assert_eq!(texts(&chunks), vec!["a b c", "c d e", "e", "f g"]);
        let parents: Vec<_> = chunks
            .iter()
            .map(|chunk| chunk.parent_id.as_deref().unwrap())
            .collect();
        assert_eq!(parents, vec!["first", "first", "first", "second"]);
    }

    #[test]
    fn empty_and_missing_text_produce_no_chunks() {
        let mut missing = Document::new("ignored");
        missing.text = None;
        let documents = vec![
            Document::new("one two"),
            Document::new(""),
            missing,
            Document::new("three"),
        ];
        let pipeline = pipeline(5, 0);
        let chunks = pipeline.split(&documents);

        assert_eq!(texts(&chunks), vec!["one two", "three"]);
        let snapshot = pipeline.metrics_snapshot();
        assert_eq!(snapshot.documents_processed, 4);
        assert_eq!(snapshot.empty_documents, 2);
        assert_eq!(snapshot.chunks_produced, 2);
        assert_eq!(snapshot.last_token_count, 1);
    }

    #[test]
    fn metrics_track_tokens_of_latest_document() {
        let pipeline = pipeline(2, 0);
        pipeline.split_document(&Document::new("a b c d e f g"));
        assert_eq!(pipeline.metrics_snapshot().last_token_count, 7);
        pipeline.split_document(&Document::new("x y"));
        assert_eq!(pipeline.metrics_snapshot().last_token_count, 2);
    }

    #[test]
    fn parallel_split_matches_sequential_order() {
        let documents: Vec<Document> = (0..50)
            .map(|idx| Document::new(format!("doc{idx} alpha beta gamma delta")))
            .collect();
        let pipeline = pipeline(2, 1);
        let sequential = pipeline.split(&documents);
        let parallel = pipeline.split_parallel(&documents);

        assert_eq!(texts(&sequential), texts(&parallel));
        let parents = |chunks: &[TextChunk]| -> Vec<Option<String>> {
            chunks.iter().map(|chunk| chunk.parent_id.clone()).collect()
        };
        assert_eq!(parents(&sequential), parents(&parallel));
    }

    #[test]
    fn untracked_pipeline_omits_lineage() {
        let mut metadata = Map::new();
        metadata.insert("source".into(), json!("notes.md"));
        let document = Document::with_metadata("x y", metadata.clone());
        let pipeline = ChunkPipeline::builder()
            .tokenizer(Arc::new(WhitespaceTokenizer))
            .track_parent(false)
            .build();
        let chunks = pipeline.split_document(&document);

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].parent_id, None);
        assert_eq!(chunks[0].metadata, metadata);
    }

    #[test]
    fn from_config_rejects_bad_geometry_before_loading_tokenizers() {
        let config = Config {
            chunk_size: 2,
            chunk_overlap: 2,
            tokenizer: TokenizerKind::Bpe("cl100k_base".into()),
            ..Config::default()
        };
        assert!(matches!(
            ChunkPipeline::from_config(&config),
            Err(ChunkingError::InvalidOverlap {
                size: 2,
                overlap: 2
            })
        ));
    }

    #[test]
    fn from_config_applies_settings() {
        let config = Config {
            chunk_size: 3,
            chunk_overlap: 1,
            track_parent: false,
            ..Config::default()
        };
        let pipeline = ChunkPipeline::from_config(&config).unwrap();
        let chunks = pipeline.split(&[Document::new("a b c d e")]);
        assert_eq!(texts(&chunks), vec!["a b c", "c d e", "e"]);
        assert!(chunks.iter().all(|chunk| chunk.parent_id.is_none()));
    }

    #[cfg(feature = "jieba")]
    #[test]
    fn from_config_routes_chinese_to_jieba() {
        let config = Config {
            chunk_size: 2,
            chunk_overlap: 0,
            ..Config::default()
        };
        let pipeline = ChunkPipeline::from_config(&config).unwrap();
        let chunks = pipeline.split_document(&Document::new("我来到北京清华大学"));
        assert_eq!(texts(&chunks), vec!["我来到", "北京清华大学"]);
    }

    #[test]
    fn from_config_keeps_chinese_on_bpe_default() {
        let config = Config {
            chunk_size: 4,
            chunk_overlap: 0,
            tokenizer: TokenizerKind::Bpe("cl100k_base".into()),
            ..Config::default()
        };
        let pipeline = ChunkPipeline::from_config(&config).unwrap();
        let text = "我来到北京清华大学，研究自然语言处理";
        let chunks = pipeline.split_document(&Document::new(text));

        let counter = build_tokenizer(&config.tokenizer).unwrap();
        let expected = counter.tokenize(text).len().div_ceil(4);
        assert_eq!(chunks.len(), expected);
        assert_eq!(
            chunks.iter().map(|chunk| chunk.text.as_str()).collect::<String>(),
            text
        );
    }

    #[test]
    fn default_pipeline_uses_default_window() {
        let pipeline = ChunkPipeline::builder().build();
        assert_eq!(pipeline.window(), WindowConfig::default());
    }
}
