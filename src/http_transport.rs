//! HTTP transport: one JSON-RPC message per `POST /mcp`.
//!
//! ```text
//! POST /mcp      → JSON-RPC response (202 for notifications)
//! GET  /health   → {"status":"ok","server":"pipelex"}
//! ```
//!
//! Requests are stateless, so there is no initialization gate and progress
//! notifications are only logged.

use axum::body::Bytes;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use tokio::net::TcpListener;

use crate::context::ToolContext;
use crate::handlers;
use crate::protocol::{JsonRpcError, JsonRpcRequest, JsonRpcResponse};
use crate::server::MAX_MESSAGE_BYTES;
use crate::state::ServerState;

pub fn build_router(state: ServerState) -> Router {
    Router::new()
        .route("/mcp", post(mcp))
        .route("/health", get(health))
        .layer(DefaultBodyLimit::max(MAX_MESSAGE_BYTES))
        .with_state(state)
}

/// Bind `host:port` (host names are resolved here) and serve until error.
pub async fn serve(host: &str, port: u16, state: ServerState) -> std::io::Result<()> {
    let listener = TcpListener::bind((host, port)).await?;
    tracing::info!(addr = %listener.local_addr()?, "HTTP transport listening");
    axum::serve(listener, build_router(state)).await
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok", "server": "pipelex" }))
}

async fn mcp(State(state): State<ServerState>, body: Bytes) -> Response {
    let req: JsonRpcRequest = match serde_json::from_slice(&body) {
        Ok(r) => r,
        Err(e) => {
            tracing::warn!("Parse error: {e}");
            return (
                StatusCode::BAD_REQUEST,
                Json(JsonRpcResponse::error(None, JsonRpcError::parse_error())),
            )
                .into_response();
        }
    };

    if req.jsonrpc != "2.0" {
        return (
            StatusCode::BAD_REQUEST,
            Json(JsonRpcResponse::error(req.id.clone(), JsonRpcError::invalid_request())),
        )
            .into_response();
    }

    let ctx = ToolContext::detached();
    match handlers::dispatch(&req, &state, &ctx).await {
        Some(resp) => Json(resp).into_response(),
        None => StatusCode::ACCEPTED.into_response(),
    }
}
