//! Per-call context handed to tool handlers.

use serde_json::{json, Value};
use tokio::sync::mpsc::UnboundedSender;

use crate::protocol::{JsonRpcNotification, LogLevel};

/// Logger name used in MCP log notifications.
const LOGGER: &str = "pipelex";

/// Progress reporting for a single tool call.
///
/// Every message is recorded through `tracing`. When the transport can push
/// notifications (stdio), it is also sent to the client as an MCP
/// `notifications/message` ahead of the tool response.
#[derive(Debug, Clone, Default)]
pub struct ToolContext {
    notifier: Option<UnboundedSender<JsonRpcNotification>>,
}

impl ToolContext {
    pub fn new(notifier: UnboundedSender<JsonRpcNotification>) -> Self {
        Self {
            notifier: Some(notifier),
        }
    }

    /// Context with no client channel; messages only reach the log.
    pub fn detached() -> Self {
        Self::default()
    }

    pub fn info(&self, message: &str, extra: Value) {
        tracing::info!(extra = %extra, "{message}");
        self.notify(LogLevel::Info, message, extra);
    }

    pub fn error(&self, message: &str) {
        tracing::error!("{message}");
        self.notify(LogLevel::Error, message, Value::Null);
    }

    fn notify(&self, level: LogLevel, message: &str, extra: Value) {
        let Some(tx) = &self.notifier else {
            return;
        };
        let data = if extra.is_null() {
            json!({ "msg": message })
        } else {
            json!({ "msg": message, "extra": extra })
        };
        // Receiver gone means the request already finished; nothing to do.
        let _ = tx.send(JsonRpcNotification::log_message(level, LOGGER, data));
    }
}
