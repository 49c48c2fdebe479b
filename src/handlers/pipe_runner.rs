use serde_json::json;

use super::{engine_call, remove_bundle_quietly};
use crate::context::ToolContext;
use crate::inputs::{coerce_inputs, working_memory_from_inputs, InputsSource};
use crate::output::save_json;
use crate::protocol::{McpErrorCode, McpErrorResponse, PipeRunnerParams, ToolResult};
use crate::state::ServerState;
use crate::stuff::{PipeOutput, WorkingMemory};

/// File name of the last run's output inside the results directory.
pub const PIPE_OUTPUT_FILE: &str = "pipe_output.json";

/// Handle a `pipe_runner` tool call.
///
/// With PLX content, the bundle is loaded for the duration of the run and
/// removed afterwards whatever the outcome. Without it, the pipe must already
/// be in the engine's library.
pub async fn handle(params: PipeRunnerParams, state: &ServerState, ctx: &ToolContext) -> ToolResult {
    let specific_code = params
        .specific_pipe_code_if_plx_content_has_no_main_pipe
        .filter(|c| !c.trim().is_empty());

    ctx.info(
        "Starting pipeline execution",
        json!({
            "specific_pipe_code_if_plx_content_has_no_main_pipe": specific_code,
            "has_inputs": params.inputs_json.as_ref().map_or(false, |v| !v.is_null()),
        }),
    );

    let (inputs, source) = match coerce_inputs(params.inputs_json.as_ref()) {
        Ok(v) => v,
        Err(err) => {
            ctx.error(&format!("Failed to parse inputs_json: {}", err.error.message));
            return err.into();
        }
    };
    if source == InputsSource::String {
        if let Some(raw) = params.inputs_json.as_ref().and_then(|v| v.as_str()) {
            ctx.info("Converted string inputs to JSON", json!({ "input_length": raw.len() }));
        }
    }
    let memory = working_memory_from_inputs(inputs);

    let plx_content = params.plx_content.unwrap_or_default();
    let output = if plx_content.is_empty() {
        let Some(pipe_code) = specific_code.as_deref() else {
            return missing_pipe_code(ctx).into();
        };
        engine_call(
            state.config.tool_timeout,
            "execute",
            state.engine.execute(pipe_code, &memory),
        )
        .await
    } else {
        run_with_bundle(&plx_content, specific_code.as_deref(), &memory, state, ctx).await
    };

    let output = match output {
        Ok(o) => o,
        Err(err) => {
            ctx.error(&format!("Pipeline execution failed: {}", err.error.message));
            return err.into();
        }
    };

    let path = state.config.results_dir.join(PIPE_OUTPUT_FILE);
    if let Err(err) = save_json(&path, &output).await {
        return McpErrorResponse::from(err).into();
    }

    ctx.info(
        "Pipeline execution completed",
        json!({ "specific_pipe_code_if_plx_content_has_no_main_pipe": specific_code }),
    );
    ToolResult::json(&output)
}

async fn run_with_bundle(
    plx_content: &str,
    specific_code: Option<&str>,
    memory: &WorkingMemory,
    state: &ServerState,
    ctx: &ToolContext,
) -> Result<PipeOutput, McpErrorResponse> {
    let timeout = state.config.tool_timeout;
    let bundle = engine_call(timeout, "load", state.engine.load_bundle(plx_content)).await?;

    let result = match bundle.main_pipe.as_deref().or(specific_code) {
        Some(pipe_code) => {
            engine_call(timeout, "execute", state.engine.execute(pipe_code, memory)).await
        }
        None => Err(missing_pipe_code(ctx)),
    };

    remove_bundle_quietly(state.engine.as_ref(), &bundle.handle, timeout).await;
    result
}

fn missing_pipe_code(ctx: &ToolContext) -> McpErrorResponse {
    let msg = "No pipe to run: plx_content has no main_pipe and \
               specific_pipe_code_if_plx_content_has_no_main_pipe is empty";
    ctx.error(msg);
    McpErrorResponse::new(McpErrorCode::InvalidArguments, msg)
}
