#![deny(missing_docs)]

//! Core library for Rusty Knowledge: document chunking and MCP tool-provider deduplication.

/// Environment-driven configuration management.
pub mod config;
/// Filesystem document loading.
pub mod loader;
/// Structured logging and tracing setup.
pub mod logging;
/// Deduplicated registry of MCP tool providers.
pub mod mcp;
/// Chunking pipeline counters.
pub mod metrics;
/// Document chunking pipeline.
pub mod processing;
