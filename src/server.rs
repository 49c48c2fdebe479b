use serde::Serialize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc::{self, UnboundedSender};

use crate::context::ToolContext;
use crate::handlers;
use crate::protocol::{JsonRpcError, JsonRpcNotification, JsonRpcRequest, JsonRpcResponse};
use crate::state::ServerState;

/// Maximum bytes per JSON-RPC message (16 MiB; PLX bundles and inputs travel inline).
pub const MAX_MESSAGE_BYTES: usize = 16 * 1024 * 1024;

/// A message queued for the client.
#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Outgoing {
    Response(JsonRpcResponse),
    Notification(JsonRpcNotification),
}

/// One line read from the client.
enum Line {
    Message(Vec<u8>),
    TooLarge,
    Eof,
}

/// MCP server that communicates over stdio using newline-delimited JSON-RPC 2.0.
///
/// Requests run concurrently; a single writer owns stdout, and logging goes
/// elsewhere.
pub struct McpServer {
    state: ServerState,
    initialized: bool,
}

impl McpServer {
    pub fn new(state: ServerState) -> Self {
        Self {
            state,
            initialized: false,
        }
    }

    pub async fn run(&mut self) -> std::io::Result<()> {
        let stdin = BufReader::new(tokio::io::stdin());
        let stdout = tokio::io::stdout();
        self.serve(stdin, stdout).await
    }

    /// Serve requests from `reader` until EOF, writing to `writer`.
    ///
    /// Returns once the input is closed and every in-flight request has
    /// been answered.
    pub async fn serve<R, W>(&mut self, reader: R, mut writer: W) -> std::io::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let (out_tx, mut out_rx) = mpsc::unbounded_channel::<Outgoing>();

        let read = self.read_loop(reader, out_tx);
        let write = async {
            while let Some(message) = out_rx.recv().await {
                write_message(&mut writer, &message).await?;
            }
            Ok::<(), std::io::Error>(())
        };

        tokio::try_join!(read, write)?;
        Ok(())
    }

    async fn read_loop<R>(&mut self, mut reader: R, out: UnboundedSender<Outgoing>) -> std::io::Result<()>
    where
        R: AsyncBufRead + Unpin,
    {
        let reply = |resp: JsonRpcResponse| {
            // Writer gone means the session is over.
            let _ = out.send(Outgoing::Response(resp));
        };

        loop {
            let raw = match read_line(&mut reader).await? {
                Line::Eof => {
                    tracing::info!("stdin closed, shutting down");
                    break;
                }
                Line::TooLarge => {
                    tracing::warn!("Message too large (limit {MAX_MESSAGE_BYTES} bytes)");
                    reply(JsonRpcResponse::error(None, JsonRpcError::parse_error()));
                    continue;
                }
                Line::Message(raw) => raw,
            };

            let trimmed = match std::str::from_utf8(&raw) {
                Ok(s) => s.trim(),
                Err(_) => {
                    reply(JsonRpcResponse::error(None, JsonRpcError::parse_error()));
                    continue;
                }
            };

            if trimmed.is_empty() {
                continue;
            }

            let req: JsonRpcRequest = match serde_json::from_str(trimmed) {
                Ok(r) => r,
                Err(e) => {
                    tracing::warn!("Parse error: {e}");
                    reply(JsonRpcResponse::error(None, JsonRpcError::parse_error()));
                    continue;
                }
            };

            // Validate jsonrpc version
            if req.jsonrpc != "2.0" {
                reply(JsonRpcResponse::error(req.id.clone(), JsonRpcError::invalid_request()));
                continue;
            }

            // Initialization gate: only `initialize` is allowed before handshake completes
            if !self.initialized && req.method != "initialize" {
                if !req.is_notification() {
                    reply(JsonRpcResponse::error(
                        req.id.clone(),
                        JsonRpcError::invalid_request_with("Server not initialized"),
                    ));
                }
                continue;
            }

            if req.method == "initialize" {
                self.initialized = true;
            }

            tokio::spawn(handle_request(req, self.state.clone(), out.clone()));
        }

        Ok(())
    }
}

/// Read one newline-terminated line, holding at most `MAX_MESSAGE_BYTES + 1`
/// bytes of it in memory.
async fn read_line<R>(reader: &mut R) -> std::io::Result<Line>
where
    R: AsyncBufRead + Unpin,
{
    let mut raw = Vec::new();
    let n = (&mut *reader)
        .take(MAX_MESSAGE_BYTES as u64 + 1)
        .read_until(b'\n', &mut raw)
        .await?;

    if n == 0 {
        return Ok(Line::Eof);
    }
    if n > MAX_MESSAGE_BYTES {
        if raw.last() != Some(&b'\n') {
            discard_line(reader).await?;
        }
        return Ok(Line::TooLarge);
    }
    Ok(Line::Message(raw))
}

/// Skip input up to and including the next newline (or EOF).
async fn discard_line<R>(reader: &mut R) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
{
    loop {
        let buf = reader.fill_buf().await?;
        if buf.is_empty() {
            return Ok(());
        }
        match buf.iter().position(|b| *b == b'\n') {
            Some(i) => {
                reader.consume(i + 1);
                return Ok(());
            }
            None => {
                let len = buf.len();
                reader.consume(len);
            }
        }
    }
}

/// Dispatch one request, forwarding its log notifications ahead of the
/// response.
async fn handle_request(req: JsonRpcRequest, state: ServerState, out: UnboundedSender<Outgoing>) {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let ctx = ToolContext::new(tx);

    let dispatch = handlers::dispatch(&req, &state, &ctx);
    tokio::pin!(dispatch);

    let resp = loop {
        tokio::select! {
            resp = &mut dispatch => break resp,
            Some(note) = rx.recv() => {
                let _ = out.send(Outgoing::Notification(note));
            }
        }
    };

    while let Ok(note) = rx.try_recv() {
        let _ = out.send(Outgoing::Notification(note));
    }

    if let Some(resp) = resp {
        let _ = out.send(Outgoing::Response(resp));
    }
}

async fn write_message<W, T>(writer: &mut W, message: &T) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
    T: Serialize,
{
    let out = serde_json::to_string(message)?;
    writer.write_all(out.as_bytes()).await?;
    writer.write_all(b"\n").await?;
    writer.flush().await?;
    Ok(())
}
