use serde::Serialize;
use serde_json::json;

use super::{engine_call, remove_bundle_quietly};
use crate::context::ToolContext;
use crate::engine::LoadedBundle;
use crate::inputs::inputs_template_json;
use crate::output::{create_incremental_dir, save_text};
use crate::protocol::{McpErrorCode, McpErrorResponse, PipeBuilderParams, ToolResult};
use crate::state::ServerState;

#[derive(Debug, Serialize)]
struct PipeBuilderResponse {
    plx_content: String,
    inputs_format_to_run: String,
}

/// Handle a `pipe_builder` tool call.
///
/// Asks the engine to build a bundle from the brief, reloads it to validate
/// it and learn its main pipe's inputs, saves the PLX and an inputs template
/// under a fresh numbered directory, and returns both. The reloaded bundle
/// stays in the library on success so it can be run by code; on failure it
/// is removed.
pub async fn handle(params: PipeBuilderParams, state: &ServerState, ctx: &ToolContext) -> ToolResult {
    let brief = params.untouched_user_request;
    ctx.info(
        "Starting pipeline build",
        json!({ "brief_length": brief.len() }),
    );

    let timeout = state.config.tool_timeout;
    let built = match engine_call(timeout, "build", state.engine.build_bundle(&brief)).await {
        Ok(b) => b,
        Err(err) => {
            ctx.error(&format!("Pipeline build failed: {}", err.error.message));
            return err.into();
        }
    };

    let bundle = match engine_call(timeout, "load", state.engine.load_bundle(&built.plx_content)).await {
        Ok(b) => b,
        Err(err) => {
            ctx.error(&format!("Built pipeline failed validation: {}", err.error.message));
            return err.into();
        }
    };

    match finish(&built.plx_content, built.main_pipe.as_deref(), &bundle, state).await {
        Ok(response) => {
            ctx.info(
                "Pipeline built successfully",
                json!({ "plx_content_length": response.plx_content.len() }),
            );
            ToolResult::json(&response)
        }
        Err(err) => {
            ctx.error(&err.error.message);
            remove_bundle_quietly(state.engine.as_ref(), &bundle.handle, timeout).await;
            err.into()
        }
    }
}

async fn finish(
    plx_content: &str,
    built_main_pipe: Option<&str>,
    bundle: &LoadedBundle,
    state: &ServerState,
) -> Result<PipeBuilderResponse, McpErrorResponse> {
    let main_pipe_code = bundle
        .main_pipe
        .as_deref()
        .or(built_main_pipe)
        .ok_or_else(|| McpErrorResponse::new(McpErrorCode::PipeNotFound, "Main pipe not found"))?;

    let main_pipe = bundle
        .pipe(main_pipe_code)
        .ok_or_else(|| McpErrorResponse::new(McpErrorCode::PipeNotFound, "Main pipe not found"))?;

    let inputs_json = inputs_template_json(main_pipe).map_err(|e| {
        tracing::error!("inputs template serialization failed: {e}");
        McpErrorResponse::canonical(McpErrorCode::InternalError)
    })?;

    let builder = &state.config.builder;
    let dir = create_incremental_dir(&builder.output_dir, &builder.dir_base_name).await?;
    let plx_path = dir.join(format!("{}.plx", builder.bundle_file_name));
    save_text(&plx_path, plx_content).await?;
    save_text(&dir.join("inputs.json"), &inputs_json).await?;
    tracing::info!(path = %plx_path.display(), "saved built bundle");

    Ok(PipeBuilderResponse {
        plx_content: plx_content.to_string(),
        inputs_format_to_run: inputs_json,
    })
}
