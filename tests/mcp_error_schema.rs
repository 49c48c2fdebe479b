use jsonschema::validator_for;
use serde_json::Value;

use pipelex_mcp_server::protocol::{JsonRpcError, McpErrorCode, McpErrorResponse, ToolResult};

const ERROR_SCHEMA: &str = r#"{
  "$schema": "https://json-schema.org/draft/2020-12/schema",
  "title": "Pipelex MCP Error Response",
  "type": "object",
  "required": ["error"],
  "additionalProperties": false,
  "properties": {
    "error": {
      "type": "object",
      "required": ["code", "message"],
      "additionalProperties": false,
      "properties": {
        "code": {
          "type": "string",
          "enum": [
            "invalid_arguments",
            "invalid_inputs",
            "pipe_definition_error",
            "dry_run_error",
            "pipe_not_found",
            "engine_unavailable",
            "engine_error",
            "timeout",
            "io_error",
            "internal_error"
          ]
        },
        "message": {
          "type": "string",
          "minLength": 1
        }
      }
    }
  }
}"#;

const ALL_CODES: [McpErrorCode; 10] = [
    McpErrorCode::InvalidArguments,
    McpErrorCode::InvalidInputs,
    McpErrorCode::PipeDefinitionError,
    McpErrorCode::DryRunError,
    McpErrorCode::PipeNotFound,
    McpErrorCode::EngineUnavailable,
    McpErrorCode::EngineError,
    McpErrorCode::Timeout,
    McpErrorCode::IoError,
    McpErrorCode::InternalError,
];

#[test]
fn golden_mcp_error_schema_validation() {
    let response = McpErrorResponse::canonical(McpErrorCode::DryRunError);

    let json_str = serde_json::to_string_pretty(&response).unwrap();
    let json_value: Value = serde_json::from_str(&json_str).unwrap();

    let schema_json: Value = serde_json::from_str(ERROR_SCHEMA).unwrap();
    let validator = validator_for(&schema_json).unwrap();
    assert!(validator.is_valid(&json_value), "MCP error JSON must satisfy schema");

    // Golden snapshot (byte-identical, stable)
    let expected = r#"{
  "error": {
    "code": "dry_run_error",
    "message": "Pipeline dry run failed"
  }
}"#;

    assert_eq!(json_str.trim(), expected.trim(), "MCP error JSON snapshot mismatch");
}

#[test]
fn every_canonical_error_satisfies_schema() {
    let schema_json: Value = serde_json::from_str(ERROR_SCHEMA).unwrap();
    let validator = validator_for(&schema_json).unwrap();

    for code in ALL_CODES {
        let value = serde_json::to_value(McpErrorResponse::canonical(code)).unwrap();
        assert!(validator.is_valid(&value), "{code:?} must satisfy schema");
    }
}

#[test]
fn tool_result_carries_error_json() {
    let result: ToolResult =
        McpErrorResponse::new(McpErrorCode::PipeNotFound, "Main pipe not found").into();
    assert!(result.is_error);

    let parsed: Value = serde_json::from_str(&result.content[0].text).unwrap();
    assert_eq!(parsed["error"]["code"], "pipe_not_found");

    let wire = serde_json::to_value(&result).unwrap();
    assert_eq!(wire["isError"], true);
}

#[test]
fn json_rpc_error_codes_follow_blame() {
    let caller: JsonRpcError = McpErrorResponse::canonical(McpErrorCode::InvalidInputs).into();
    assert_eq!(caller.code, -32602);
    assert_eq!(caller.data.unwrap()["error"]["code"], "invalid_inputs");

    let server: JsonRpcError = McpErrorResponse::canonical(McpErrorCode::EngineUnavailable).into();
    assert_eq!(server.code, -32603);
}
