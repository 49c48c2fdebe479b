use serde::{Deserialize, Serialize};

/// JSON-RPC 2.0 ID: a number or a string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RpcId {
    Number(i64),
    Str(String),
}

/// JSON-RPC 2.0 request envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub id: Option<RpcId>,
    pub method: String,
    pub params: Option<serde_json::Value>,
}

impl JsonRpcRequest {
    /// Requests without an id are notifications and never get a response.
    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }
}

/// Arguments for the `pipe_builder` tool.
#[derive(Debug, Clone, Deserialize)]
pub struct PipeBuilderParams {
    /// The user's brief, passed through verbatim.
    pub untouched_user_request: String,
}

/// Arguments for the `pipe_runner` tool.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PipeRunnerParams {
    #[serde(default)]
    pub plx_content: Option<String>,
    #[serde(default)]
    pub specific_pipe_code_if_plx_content_has_no_main_pipe: Option<String>,
    /// Either an object, a JSON string encoding an object, or null.
    #[serde(default)]
    pub inputs_json: Option<serde_json::Value>,
}

/// Arguments for the `validate_pipeline` tool.
#[derive(Debug, Clone, Deserialize)]
pub struct ValidatePipelineParams {
    pub plx_content: String,
}

/// MCP `initialize` params.
#[derive(Debug, Clone, Deserialize)]
pub struct InitializeParams {
    #[serde(rename = "protocolVersion")]
    pub protocol_version: Option<String>,
    #[serde(rename = "clientInfo")]
    pub client_info: Option<ClientInfo>,
}

/// Client information sent during `initialize`.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientInfo {
    pub name: Option<String>,
    pub version: Option<String>,
}

/// Parameters for `tools/call`.
#[derive(Debug, Clone, Deserialize)]
pub struct ToolCallParams {
    pub name: String,
    pub arguments: Option<serde_json::Value>,
}
