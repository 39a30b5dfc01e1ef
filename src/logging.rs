//! Tracing setup for the `rustykb` binary.
//!
//! Stdout is reserved for JSON Lines chunk output, so human-readable logs always go to stderr.
//! Setting [`LOG_FILE_ENV`] adds a second sink without ANSI colours, appended through a
//! non-blocking writer. Missing parent directories of that file are created.
use std::{fs, path::Path, sync::OnceLock};

use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Environment variable naming an optional log file.
pub const LOG_FILE_ENV: &str = "RUSTYKB_LOG_FILE";

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// Install the global subscriber: `RUST_LOG` filtering (default `info`), a compact stderr
/// layer, and the optional file layer.
///
/// Calling it again after a subscriber is installed only reports the conflict on stderr.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact();
    let file_layer = std::env::var_os(LOG_FILE_ENV)
        .and_then(|path| open_log_file(Path::new(&path)))
        .map(|writer| fmt::layer().with_writer(writer).with_ansi(false).compact());

    if let Err(err) = tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
    {
        eprintln!("Tracing already initialised: {err}");
    }
}

/// Open `path` for appending and wrap it in a non-blocking writer.
///
/// Returns `None`, after printing the reason, when the file cannot be opened.
fn open_log_file(path: &Path) -> Option<NonBlocking> {
    if let Some(parent) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        if let Err(err) = fs::create_dir_all(parent) {
            eprintln!("Failed to create log directory {}: {err}", parent.display());
            return None;
        }
    }
    match fs::OpenOptions::new().create(true).append(true).open(path) {
        Ok(file) => {
            let (writer, guard) = tracing_appender::non_blocking(file);
            let _ = LOG_GUARD.set(guard);
            Some(writer)
        }
        Err(err) => {
            eprintln!("Failed to open log file {}: {err}", path.display());
            None
        }
    }
}
