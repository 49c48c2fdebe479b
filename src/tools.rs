//! Tool catalog advertised through `tools/list`.

use serde::Serialize;
use serde_json::{json, Value};

use crate::protocol::{McpErrorCode, McpErrorResponse};
use crate::schema::{validate_value, SchemaValidationError};

pub const PIPE_BUILDER: &str = "pipe_builder";
pub const PIPE_RUNNER: &str = "pipe_runner";
pub const LIST_AVAILABLE_PIPES: &str = "list_available_pipes";
pub const VALIDATE_PIPELINE: &str = "validate_pipeline";
pub const HEALTH: &str = "health";

/// One entry of the `tools/list` result.
#[derive(Debug, Clone, Serialize)]
pub struct ToolSpec {
    pub name: &'static str,
    pub description: &'static str,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

pub fn catalog() -> Vec<ToolSpec> {
    vec![
        ToolSpec {
            name: PIPE_BUILDER,
            description: "Build a Pipelex pipeline from a natural language request, do not modify it",
            input_schema: json!({
                "type": "object",
                "required": ["untouched_user_request"],
                "properties": {
                    "untouched_user_request": {
                        "type": "string",
                        "minLength": 1,
                        "description": "The user's request, passed verbatim"
                    }
                }
            }),
        },
        ToolSpec {
            name: PIPE_RUNNER,
            description: "Run a Pipelex pipeline (optionally with PLX content)",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "plx_content": {
                        "type": ["string", "null"],
                        "description": "PLX code defining the pipeline(s) and concepts. Leave empty to run a pipe already in the library."
                    },
                    "specific_pipe_code_if_plx_content_has_no_main_pipe": {
                        "type": ["string", "null"],
                        "description": "Pipe to execute. Optional if plx_content defines a main_pipe, required otherwise."
                    },
                    "inputs_json": {
                        "type": ["object", "string", "null"],
                        "description": "Pipeline inputs as an object or a JSON string. See inputs_format_to_run from pipe_builder for the expected shape."
                    }
                }
            }),
        },
        ToolSpec {
            name: LIST_AVAILABLE_PIPES,
            description: "List all available pipes in the Pipelex library",
            input_schema: json!({ "type": "object", "properties": {} }),
        },
        ToolSpec {
            name: VALIDATE_PIPELINE,
            description: "Validate PLX content with a dry run and report the input and output structures of its pipes",
            input_schema: json!({
                "type": "object",
                "required": ["plx_content"],
                "properties": {
                    "plx_content": {
                        "type": "string",
                        "minLength": 1,
                        "description": "PLX code to validate"
                    }
                }
            }),
        },
        ToolSpec {
            name: HEALTH,
            description: "Simple health check",
            input_schema: json!({ "type": "object", "properties": {} }),
        },
    ]
}

pub fn find(name: &str) -> Option<ToolSpec> {
    catalog().into_iter().find(|t| t.name == name)
}

/// Check call arguments against the tool's input schema.
///
/// Missing arguments are treated as an empty object.
pub fn validate_arguments(spec: &ToolSpec, arguments: &Value) -> Result<(), McpErrorResponse> {
    validate_value(&spec.input_schema, arguments).map_err(|e| match e {
        SchemaValidationError::ValidationFailed(problems) => McpErrorResponse::new(
            McpErrorCode::InvalidArguments,
            format!("Invalid arguments for {}: {}", spec.name, problems.join("; ")),
        ),
        other => {
            tracing::error!(tool = spec.name, "tool schema unusable: {other}");
            McpErrorResponse::canonical(McpErrorCode::InternalError)
        }
    })
}
