//! Boundary to the external pipeline engine.
//!
//! PLX parsing, validation, dry runs and execution all happen on the other
//! side of [`PipelineEngine`]. The server only moves JSON across it.
//!
//! # Implementations
//!
//! - [`HttpEngine`]: talks to a Pipelex API service over HTTP

pub mod http;
pub mod types;

use async_trait::async_trait;

use crate::protocol::{McpErrorCode, McpErrorResponse};
use crate::stuff::{PipeOutput, WorkingMemory};

pub use http::HttpEngine;
pub use types::{BuiltBundle, BundleHandle, ConceptRef, InputRequirement, LoadedBundle, PipeInfo};

/// Errors surfaced by an engine implementation.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("pipe definition error: {0}")]
    PipeDefinition(String),

    #[error("dry run error: {0}")]
    DryRun(String),

    #[error("pipe not found: {0}")]
    PipeNotFound(String),

    #[error("engine unavailable: {0}")]
    Unavailable(String),

    #[error("engine returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("invalid engine response: {0}")]
    Decode(String),
}

impl From<EngineError> for McpErrorResponse {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::PipeDefinition(msg) => {
                McpErrorResponse::new(McpErrorCode::PipeDefinitionError, msg)
            }
            EngineError::DryRun(msg) => McpErrorResponse::new(McpErrorCode::DryRunError, msg),
            EngineError::PipeNotFound(code) => McpErrorResponse::new(
                McpErrorCode::PipeNotFound,
                format!("Pipe not found: {code}"),
            ),
            EngineError::Unavailable(_) => {
                McpErrorResponse::canonical(McpErrorCode::EngineUnavailable)
            }
            EngineError::Status { message, .. } => {
                McpErrorResponse::new(McpErrorCode::EngineError, message)
            }
            EngineError::Decode(_) => McpErrorResponse::canonical(McpErrorCode::EngineError),
        }
    }
}

/// Operations the server needs from the pipeline engine.
#[async_trait]
pub trait PipelineEngine: Send + Sync {
    /// Backend name for diagnostics.
    fn name(&self) -> &str;

    /// Check that the engine is reachable and initialized.
    async fn probe(&self) -> Result<(), EngineError>;

    /// Run the engine's pipeline builder on a natural-language brief.
    ///
    /// The returned bundle is not left loaded in the library.
    async fn build_bundle(&self, brief: &str) -> Result<BuiltBundle, EngineError>;

    /// Parse, load, validate and dry-run PLX content.
    ///
    /// On success the bundle stays loaded until [`remove_bundle`] is called.
    /// On failure nothing is left loaded.
    ///
    /// [`remove_bundle`]: PipelineEngine::remove_bundle
    async fn load_bundle(&self, plx_content: &str) -> Result<LoadedBundle, EngineError>;

    /// Unload a bundle previously returned by [`load_bundle`].
    ///
    /// [`load_bundle`]: PipelineEngine::load_bundle
    async fn remove_bundle(&self, handle: &BundleHandle) -> Result<(), EngineError>;

    /// Execute a pipe by code with the given working memory.
    async fn execute(
        &self,
        pipe_code: &str,
        inputs: &WorkingMemory,
    ) -> Result<PipeOutput, EngineError>;

    /// All pipes currently registered.
    async fn list_pipes(&self) -> Result<Vec<PipeInfo>, EngineError>;
}
