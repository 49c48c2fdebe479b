pub mod health;
pub mod list_pipes;
pub mod pipe_builder;
pub mod pipe_runner;
pub mod validate_pipeline;

use std::future::Future;
use std::time::Duration;

use serde::de::DeserializeOwned;

use crate::context::ToolContext;
use crate::engine::{BundleHandle, EngineError, PipelineEngine};
use crate::protocol::{
    InitializeParams, JsonRpcError, JsonRpcRequest, JsonRpcResponse, McpErrorCode, McpErrorResponse,
    PipeBuilderParams, PipeRunnerParams, ToolCallParams, ToolResult, ValidatePipelineParams,
};
use crate::state::ServerState;
use crate::tools::{self, ToolSpec};

/// MCP protocol revision implemented by this server.
pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// Dispatch a JSON-RPC request to the appropriate handler.
///
/// Returns `None` for notifications (no response required).
pub async fn dispatch(
    req: &JsonRpcRequest,
    state: &ServerState,
    ctx: &ToolContext,
) -> Option<JsonRpcResponse> {
    if req.is_notification() {
        tracing::debug!(method = %req.method, "notification received");
        return None;
    }

    match req.method.as_str() {
        "initialize" => {
            if let Some(params) = req
                .params
                .as_ref()
                .and_then(|v| serde_json::from_value::<InitializeParams>(v.clone()).ok())
            {
                let client = params.client_info.as_ref();
                tracing::info!(
                    protocol_version = params.protocol_version.as_deref().unwrap_or("unknown"),
                    client = client.and_then(|c| c.name.as_deref()).unwrap_or("unknown"),
                    client_version = client.and_then(|c| c.version.as_deref()).unwrap_or("unknown"),
                    "client initializing"
                );
            }
            let result = serde_json::json!({
                "protocolVersion": PROTOCOL_VERSION,
                "capabilities": {
                    "tools": {},
                    "logging": {}
                },
                "serverInfo": {
                    "name": "pipelex",
                    "version": env!("CARGO_PKG_VERSION")
                },
                "instructions": "Build and run Pipelex pipelines."
            });
            Some(JsonRpcResponse::success(req.id.clone(), result))
        }

        "ping" => Some(JsonRpcResponse::success(req.id.clone(), serde_json::json!({}))),

        "tools/list" => {
            let result = serde_json::json!({ "tools": tools::catalog() });
            Some(JsonRpcResponse::success(req.id.clone(), result))
        }

        "tools/call" => {
            let params: ToolCallParams = match &req.params {
                Some(v) => match serde_json::from_value(v.clone()) {
                    Ok(p) => p,
                    Err(e) => {
                        let err = McpErrorResponse::new(
                            McpErrorCode::InvalidArguments,
                            format!("Invalid tools/call params: {e}"),
                        );
                        return Some(JsonRpcResponse::error(req.id.clone(), err.into()));
                    }
                },
                None => {
                    return Some(JsonRpcResponse::error(
                        req.id.clone(),
                        JsonRpcError::invalid_params("Missing params for tools/call"),
                    ));
                }
            };

            // Unknown tools are a protocol error, not a failed tool run.
            let Some(spec) = tools::find(&params.name) else {
                let err = McpErrorResponse::new(
                    McpErrorCode::InvalidArguments,
                    format!("Unknown tool: {}", params.name),
                );
                return Some(JsonRpcResponse::error(req.id.clone(), err.into()));
            };

            let tool_result = dispatch_tool_call(spec, params.arguments, state, ctx).await;
            match serde_json::to_value(&tool_result) {
                Ok(result_json) => Some(JsonRpcResponse::success(req.id.clone(), result_json)),
                Err(e) => {
                    tracing::error!("tool result serialization failed: {e}");
                    let err = McpErrorResponse::canonical(McpErrorCode::InternalError);
                    Some(JsonRpcResponse::error(req.id.clone(), err.into()))
                }
            }
        }

        _ => Some(JsonRpcResponse::error(
            req.id.clone(),
            JsonRpcError::method_not_found(&req.method),
        )),
    }
}

async fn dispatch_tool_call(
    spec: ToolSpec,
    arguments: Option<serde_json::Value>,
    state: &ServerState,
    ctx: &ToolContext,
) -> ToolResult {
    let arguments = arguments.unwrap_or_else(|| serde_json::json!({}));
    if let Err(err) = tools::validate_arguments(&spec, &arguments) {
        return err.into();
    }

    tracing::info!(tool = spec.name, "tool call");

    match spec.name {
        tools::PIPE_BUILDER => match parse_arguments::<PipeBuilderParams>(spec.name, arguments) {
            Ok(p) => pipe_builder::handle(p, state, ctx).await,
            Err(result) => result,
        },
        tools::PIPE_RUNNER => match parse_arguments::<PipeRunnerParams>(spec.name, arguments) {
            Ok(p) => pipe_runner::handle(p, state, ctx).await,
            Err(result) => result,
        },
        tools::VALIDATE_PIPELINE => {
            match parse_arguments::<ValidatePipelineParams>(spec.name, arguments) {
                Ok(p) => validate_pipeline::handle(p, state).await,
                Err(result) => result,
            }
        }
        tools::LIST_AVAILABLE_PIPES => list_pipes::handle(state).await,
        tools::HEALTH => health::handle().await,
        other => ToolResult::error(format!("Unknown tool: {other}")),
    }
}

fn parse_arguments<T: DeserializeOwned>(
    tool: &str,
    arguments: serde_json::Value,
) -> Result<T, ToolResult> {
    serde_json::from_value(arguments).map_err(|e| {
        McpErrorResponse::new(
            McpErrorCode::InvalidArguments,
            format!("Invalid arguments for {tool}: {e}"),
        )
        .into()
    })
}

/// Run one engine call under the configured timeout.
///
/// The limit is per engine call, so a tool making several calls can run
/// longer than one limit. Bundle cleanup after a timed-out call still runs
/// under its own limit.
pub(crate) async fn engine_call<T, F>(
    timeout: Duration,
    operation: &str,
    fut: F,
) -> Result<T, McpErrorResponse>
where
    F: Future<Output = Result<T, EngineError>>,
{
    match tokio::time::timeout(timeout, fut).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(err)) => {
            tracing::error!(operation, "engine call failed: {err}");
            Err(err.into())
        }
        Err(_) => {
            tracing::error!(operation, "engine call timed out after {timeout:?}");
            Err(McpErrorResponse::new(
                McpErrorCode::Timeout,
                format!("{operation} timed out after {timeout:?}"),
            ))
        }
    }
}

/// Unload a bundle, logging instead of failing.
///
/// Used on cleanup paths where the original error must win.
pub(crate) async fn remove_bundle_quietly(
    engine: &dyn PipelineEngine,
    handle: &BundleHandle,
    timeout: Duration,
) {
    match tokio::time::timeout(timeout, engine.remove_bundle(handle)).await {
        Ok(Ok(())) => tracing::debug!(bundle = %handle, "bundle removed"),
        Ok(Err(e)) => tracing::error!(bundle = %handle, "Error during cleanup: {e}"),
        Err(_) => tracing::error!(bundle = %handle, "Error during cleanup: timed out"),
    }
}
