use std::sync::Arc;

use clap::Parser;
use pipelex_mcp_server::config::{Cli, ServerConfig, Transport};
use pipelex_mcp_server::engine::{HttpEngine, PipelineEngine};
use pipelex_mcp_server::server::McpServer;
use pipelex_mcp_server::state::ServerState;
use pipelex_mcp_server::{http_transport, logging};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let config = match ServerConfig::from_cli(Cli::parse()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("pipelex-mcp-server: configuration error: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = logging::init(&config.log_level, config.log_file.as_deref()) {
        eprintln!("pipelex-mcp-server: {e}");
        std::process::exit(1);
    }

    let engine = match HttpEngine::new(config.engine_url.clone(), config.engine_token.clone()) {
        Ok(e) => e,
        Err(e) => {
            tracing::error!("cannot create engine client: {e}");
            std::process::exit(1);
        }
    };

    // Tools report engine failures per call, so an engine that is still
    // starting up does not keep the server from coming up.
    match engine.probe().await {
        Ok(()) => tracing::info!(engine = engine.name(), url = engine.base_url(), "engine reachable"),
        Err(e) => tracing::warn!(engine = engine.name(), url = engine.base_url(), "engine probe failed: {e}"),
    }

    let state = ServerState::new(config.clone(), Arc::new(engine));

    let result = match config.transport {
        Transport::Stdio => McpServer::new(state).run().await,
        Transport::Http => http_transport::serve(&config.host, config.port, state).await,
    };

    if let Err(e) = result {
        tracing::error!("fatal error: {e}");
        eprintln!("pipelex-mcp-server: fatal error: {e}");
        std::process::exit(1);
    }
}
