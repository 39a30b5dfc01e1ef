//! Command-line front-end: load documents from disk, chunk them, and emit JSON Lines.
use std::{
    io::{self, BufWriter, Write},
    path::PathBuf,
};

use anyhow::{Context, Result, anyhow};
use clap::{Args, Parser, Subcommand};
use rustykb::{
    config::Config,
    loader, logging,
    mcp::dedupe_clients,
    processing::{ChunkPipeline, Metadata, TokenizerKind},
};
use serde_json::Value;

#[derive(Parser)]
#[command(
    name = "rustykb",
    version,
    about = "Split documents into overlapping token windows for retrieval"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Chunk files or directories and print one JSON chunk per line.
    Chunk(ChunkArgs),
    /// Deduplicate tool-provider names, keeping the first occurrence of each.
    Dedupe {
        /// Provider names in discovery order.
        names: Vec<String>,
    },
}

#[derive(Args)]
struct ChunkArgs {
    /// Files or directories to load.
    #[arg(required = true)]
    paths: Vec<PathBuf>,
    /// Maximum tokens per chunk (overrides TEXT_SPLITTER_CHUNK_SIZE).
    #[arg(long)]
    chunk_size: Option<usize>,
    /// Tokens shared between consecutive chunks (overrides TEXT_SPLITTER_CHUNK_OVERLAP).
    #[arg(long)]
    chunk_overlap: Option<usize>,
    /// Default tokenizer: whitespace, unicode, jieba, or a tiktoken model/encoding.
    #[arg(long)]
    tokenizer: Option<String>,
    /// Do not record parent ids or chunk positions.
    #[arg(long)]
    no_parent: bool,
    /// Chunk documents in parallel.
    #[arg(long)]
    parallel: bool,
    /// Extra metadata attached to every document, as key=value.
    #[arg(long = "meta", value_parser = parse_key_value)]
    meta: Vec<(String, String)>,
}

fn main() {
    logging::init_tracing();
    if let Err(err) = run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Command::Chunk(args) => chunk(args),
        Command::Dedupe { names } => dedupe(names),
    }
}

fn chunk(args: ChunkArgs) -> Result<()> {
    let mut config = Config::load().context("failed to load configuration")?;
    if let Some(size) = args.chunk_size {
        config.chunk_size = size;
    }
    if let Some(overlap) = args.chunk_overlap {
        config.chunk_overlap = overlap;
    }
    if let Some(tokenizer) = args.tokenizer.as_deref() {
        config.tokenizer = tokenizer
            .parse::<TokenizerKind>()
            .map_err(|()| anyhow!("tokenizer name must not be empty"))?;
    }
    if args.no_parent {
        config.track_parent = false;
    }

    let pipeline = ChunkPipeline::from_config(&config).context("invalid chunking configuration")?;

    let extra: Metadata = args
        .meta
        .into_iter()
        .map(|(key, value)| (key, Value::String(value)))
        .collect();
    let documents =
        loader::load_documents(&args.paths, &extra).context("failed to load documents")?;

    let chunks = if args.parallel {
        pipeline.split_parallel(&documents)
    } else {
        pipeline.split(&documents)
    };

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    for chunk in &chunks {
        serde_json::to_writer(&mut out, chunk).context("failed to serialize chunk")?;
        out.write_all(b"\n").context("failed to write chunk")?;
    }
    out.flush().context("failed to flush output")?;

    let snapshot = pipeline.metrics_snapshot();
    tracing::info!(
        documents = snapshot.documents_processed,
        empty_documents = snapshot.empty_documents,
        chunks = snapshot.chunks_produced,
        "Chunking finished"
    );
    Ok(())
}

fn dedupe(names: Vec<String>) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    for name in dedupe_clients(names) {
        writeln!(out, "{name}").context("failed to write name")?;
    }
    Ok(())
}

fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{raw}'"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("metadata key is empty in '{raw}'"));
    }
    Ok((key.to_string(), value.to_string()))
}
