//! Logging initialisation via tracing-subscriber.
//!
//! Stdout carries the JSON-RPC stream, so logs only ever go to stderr or to
//! an append-mode file.

use std::path::Path;

use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::EnvFilter;

#[derive(Debug, thiserror::Error)]
pub enum LoggerError {
    #[error("invalid log level '{level}': {reason}")]
    Level { level: String, reason: String },

    #[error("failed to open log file '{path}': {source}")]
    File {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to set subscriber: {0}")]
    Install(String),
}

/// Build the filter from a level or directive string.
///
/// Accepts Python-style upper-case levels (`INFO`) as well as `tracing`
/// directives (`pipelex_mcp_server=debug`). `RUST_LOG` wins when set.
pub fn build_filter(level: &str) -> Result<EnvFilter, LoggerError> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    let directive = match level.to_ascii_lowercase().as_str() {
        "warning" => "warn".to_string(),
        "critical" => "error".to_string(),
        other => other.to_string(),
    };
    if directive.is_empty() {
        return Err(LoggerError::Level {
            level: level.to_string(),
            reason: "must not be empty".to_string(),
        });
    }
    EnvFilter::try_new(&directive).map_err(|e| LoggerError::Level {
        level: level.to_string(),
        reason: e.to_string(),
    })
}

/// Initialise the global tracing subscriber.
pub fn init(level: &str, log_file: Option<&Path>) -> Result<(), LoggerError> {
    let filter = build_filter(level)?;

    let writer = if let Some(path) = log_file {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| LoggerError::File {
                path: path.display().to_string(),
                source,
            })?;
        }
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|source| LoggerError::File {
                path: path.display().to_string(),
                source,
            })?;
        BoxMakeWriter::new(file)
    } else {
        BoxMakeWriter::new(std::io::stderr)
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(log_file.is_none())
        .try_init()
        .map_err(|e| LoggerError::Install(e.to_string()))
}
