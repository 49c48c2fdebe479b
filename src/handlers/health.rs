use crate::protocol::ToolResult;

/// Liveness only; does not touch the engine.
pub async fn handle() -> ToolResult {
    ToolResult::text(r#"{"status":"ok","server":"pipelex"}"#)
}
