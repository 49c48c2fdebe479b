pub mod request;
pub mod response;

pub use request::{
    InitializeParams, JsonRpcRequest, PipeBuilderParams, PipeRunnerParams, RpcId, ToolCallParams,
    ValidatePipelineParams,
};
pub use response::{
    JsonRpcError, JsonRpcNotification, JsonRpcResponse, LogLevel, McpError, McpErrorCode,
    McpErrorResponse, ToolResult, ToolResultContent,
};
