use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters describing chunking activity.
#[derive(Default)]
pub struct PipelineMetrics {
    documents_processed: AtomicU64,
    empty_documents: AtomicU64,
    chunks_produced: AtomicU64,
    last_token_count: AtomicU64,
}

impl PipelineMetrics {
    /// Create an empty metrics accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a processed document with its token and chunk counts.
    pub fn record_document(&self, token_count: u64, chunk_count: u64) {
        self.documents_processed.fetch_add(1, Ordering::Relaxed);
        if chunk_count == 0 {
            self.empty_documents.fetch_add(1, Ordering::Relaxed);
        }
        self.chunks_produced
            .fetch_add(chunk_count, Ordering::Relaxed);
        self.last_token_count.store(token_count, Ordering::Relaxed);
    }

    /// Return a snapshot of the current counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            documents_processed: self.documents_processed.load(Ordering::Relaxed),
            empty_documents: self.empty_documents.load(Ordering::Relaxed),
            chunks_produced: self.chunks_produced.load(Ordering::Relaxed),
            last_token_count: self.last_token_count.load(Ordering::Relaxed),
        }
    }
}

/// Immutable view of pipeline counters used for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct MetricsSnapshot {
    /// Documents run through the pipeline since construction.
    pub documents_processed: u64,
    /// Documents that produced no chunks.
    pub empty_documents: u64,
    /// Total chunks emitted across all documents.
    pub chunks_produced: u64,
    /// Tokens in the most recently chunked document.
    pub last_token_count: u64,
}
