//! Files written next to the server: built bundles and run outputs.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tokio::fs;

use crate::protocol::{McpErrorCode, McpErrorResponse};

/// Upper bound on numbered output directories per base name.
const MAX_INCREMENTAL_DIRS: u32 = 9999;

#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("no free directory slot for {0}")]
    Exhausted(PathBuf),
}

impl OutputError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

impl From<OutputError> for McpErrorResponse {
    fn from(err: OutputError) -> Self {
        tracing::error!("output write failed: {err}");
        match err {
            OutputError::Io { .. } | OutputError::Exhausted(_) => {
                McpErrorResponse::canonical(McpErrorCode::IoError)
            }
            OutputError::Serialize(_) => McpErrorResponse::canonical(McpErrorCode::InternalError),
        }
    }
}

/// Create and return `{base}/{name}_{NN}` for the first counter (from 01)
/// whose directory does not exist yet.
///
/// Creation claims the slot, so two concurrent callers never share a
/// directory.
pub async fn create_incremental_dir(base: &Path, name: &str) -> Result<PathBuf, OutputError> {
    fs::create_dir_all(base)
        .await
        .map_err(|e| OutputError::io(base, e))?;

    for counter in 1..=MAX_INCREMENTAL_DIRS {
        let candidate = base.join(format!("{name}_{counter:02}"));
        match fs::create_dir(&candidate).await {
            Ok(()) => return Ok(candidate),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(OutputError::io(&candidate, e)),
        }
    }

    Err(OutputError::Exhausted(base.join(name)))
}

/// Write text to a file, creating parent directories.
pub async fn save_text(path: &Path, text: &str) -> Result<(), OutputError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| OutputError::io(parent, e))?;
    }
    fs::write(path, text)
        .await
        .map_err(|e| OutputError::io(path, e))
}

/// Write a value as pretty-printed JSON (two-space indent, UTF-8 kept as is).
pub async fn save_json<T: Serialize>(path: &Path, value: &T) -> Result<(), OutputError> {
    let text = serde_json::to_string_pretty(value)?;
    save_text(path, &text).await
}
