//! MCP server for Pipelex.
//!
//! Exposes `pipe_builder`, `pipe_runner`, `list_available_pipes`,
//! `validate_pipeline` and `health` tools over JSON-RPC 2.0 (stdio or HTTP).
//! Pipeline parsing, validation and execution are delegated to a Pipelex
//! engine through [`engine::PipelineEngine`].

pub mod config;
pub mod context;
pub mod engine;
pub mod handlers;
pub mod http_transport;
pub mod inputs;
pub mod logging;
pub mod output;
pub mod protocol;
pub mod schema;
pub mod server;
pub mod state;
pub mod structures;
pub mod stuff;
pub mod tools;
