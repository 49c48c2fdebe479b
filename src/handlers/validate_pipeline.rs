use super::{engine_call, remove_bundle_quietly};
use crate::protocol::{ToolResult, ValidatePipelineParams};
use crate::state::ServerState;
use crate::structures::extract_pipe_structures;

/// Handle a `validate_pipeline` tool call.
///
/// Loading performs parsing, static validation and a dry run of every pipe.
/// The bundle never outlives the call.
pub async fn handle(params: ValidatePipelineParams, state: &ServerState) -> ToolResult {
    let timeout = state.config.tool_timeout;
    let bundle = match engine_call(timeout, "load", state.engine.load_bundle(&params.plx_content)).await {
        Ok(b) => b,
        Err(err) => return err.into(),
    };

    let structures = extract_pipe_structures(&bundle.pipes);
    remove_bundle_quietly(state.engine.as_ref(), &bundle.handle, timeout).await;

    tracing::info!(pipes = structures.len(), domain = %bundle.domain, "pipeline validated");
    ToolResult::json(&structures)
}
