//! Tracing setup for the server and the `legal-ask` CLI.
//!
//! The server writes request and ingestion logs to stdout and to a log file, so a long PDF
//! ingestion can be inspected after the fact. `LEGAL_ASSISTANT_LOG_FILE` names the file to
//! append to; without it the server writes `logs/legal-assistant.log`. The CLI logs to stderr
//! only, keeping stdout for the answer.
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

const LOG_FILE_VAR: &str = "LEGAL_ASSISTANT_LOG_FILE";
const LOG_DIR: &str = "logs";
const LOG_FILE_NAME: &str = "legal-assistant.log";

/// `lopdf` parser diagnostics stay out of the default output.
const SERVER_FILTER: &str = "info,lopdf=error";
const CLI_FILTER: &str = "warn,lopdf=error";

/// Where the server's file layer writes.
#[derive(Debug, PartialEq, Eq)]
enum LogFile {
    /// Append to an explicit path.
    Append(PathBuf),
    /// `logs/legal-assistant.log` under the working directory.
    Default,
}

impl LogFile {
    fn resolve(override_path: Option<String>) -> Self {
        match override_path.filter(|path| !path.trim().is_empty()) {
            Some(path) => Self::Append(PathBuf::from(path.trim())),
            None => Self::Default,
        }
    }
}

fn env_filter(default: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

/// Install the server subscriber: `RUST_LOG` filtering, compact stdout, and a file layer
/// when the log file can be opened.
pub fn init_tracing() {
    let registry = tracing_subscriber::registry()
        .with(env_filter(SERVER_FILTER))
        .with(fmt::layer().with_target(false).compact());

    let target = LogFile::resolve(std::env::var(LOG_FILE_VAR).ok());
    match open_log_writer(&target) {
        Some(writer) => registry
            .with(
                fmt::layer()
                    .with_writer(writer)
                    .with_target(true)
                    .with_ansi(false)
                    .compact(),
            )
            .init(),
        None => registry.init(),
    }
}

/// Install a stderr-only subscriber for short-lived command line runs.
pub fn init_cli_tracing() {
    tracing_subscriber::registry()
        .with(env_filter(CLI_FILTER))
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .compact(),
        )
        .init();
}

fn open_log_writer(target: &LogFile) -> Option<NonBlocking> {
    let (writer, guard) = match target {
        LogFile::Append(path) => match append_file(path) {
            Ok(file) => tracing_appender::non_blocking(file),
            Err(err) => {
                eprintln!("Failed to open log file {}: {err}", path.display());
                return None;
            }
        },
        LogFile::Default => {
            if let Err(err) = std::fs::create_dir_all(LOG_DIR) {
                eprintln!("Failed to create {LOG_DIR} directory: {err}");
                return None;
            }
            tracing_appender::non_blocking(tracing_appender::rolling::never(
                LOG_DIR,
                LOG_FILE_NAME,
            ))
        }
    };
    let _ = LOG_GUARD.set(guard);
    Some(writer)
}

fn append_file(path: &Path) -> std::io::Result<std::fs::File> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
}
