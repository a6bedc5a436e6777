//! Line-delimited JSON-RPC server over stdio.
//!
//! Stdout carries protocol messages only; logging goes to stderr.

use super::protocol::{JSONRPC_VERSION, JsonRpcError, JsonRpcRequest, JsonRpcResponse};
use super::tools::ToolHandler;
use anyhow::{Context, Result};
use serde_json::{Value, json};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, error, info};

const PROTOCOL_VERSION: &str = "2024-11-05";
const SERVER_NAME: &str = "manta-review";

pub struct McpServer {
    tool_handler: ToolHandler,
}

impl McpServer {
    pub fn new(tool_handler: ToolHandler) -> Self {
        Self { tool_handler }
    }

    /// Serve on the process's stdin/stdout until EOF.
    pub async fn run(&self) -> Result<()> {
        let reader = BufReader::new(tokio::io::stdin());
        self.serve(reader, tokio::io::stdout()).await
    }

    /// Serve requests read from `reader`, one JSON object per line.
    pub async fn serve<R, W>(&self, mut reader: R, mut writer: W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        info!("MCP server started, listening on stdin");
        let mut line = String::new();

        loop {
            line.clear();
            let read = reader
                .read_line(&mut line)
                .await
                .context("Failed to read from stdin")?;
            if read == 0 {
                debug!("Received EOF, shutting down");
                break;
            }

            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            debug!(request = trimmed, "Received message");

            let Some(response) = self.process_message(trimmed).await else {
                continue;
            };

            let payload = match serde_json::to_string(&response) {
                Ok(payload) => payload,
                Err(e) => {
                    error!(error = %e, "Failed to serialize response");
                    continue;
                }
            };
            debug!(response = %payload, "Sending response");

            writer.write_all(payload.as_bytes()).await?;
            writer.write_all(b"\n").await?;
            writer.flush().await?;
        }

        info!("MCP server shutting down");
        Ok(())
    }

    /// Handle one message. Notifications get no response.
    async fn process_message(&self, line: &str) -> Option<JsonRpcResponse> {
        let request: JsonRpcRequest = match serde_json::from_str(line) {
            Ok(req) => req,
            Err(e) => {
                return Some(JsonRpcResponse::error(
                    None,
                    JsonRpcError::parse_error(format!("Invalid JSON: {}", e)),
                ));
            }
        };

        if request.is_notification() {
            debug!(method = %request.method, "Ignoring notification");
            return None;
        }

        if request.jsonrpc != JSONRPC_VERSION {
            return Some(JsonRpcResponse::error(
                request.id,
                JsonRpcError::invalid_request("jsonrpc must be '2.0'"),
            ));
        }

        Some(match request.method.as_str() {
            "initialize" => self.handle_initialize(request),
            "ping" => JsonRpcResponse::success(request.id, json!({})),
            "tools/list" => self.handle_tools_list(request),
            "tools/call" => self.handle_tools_call(request).await,
            _ => JsonRpcResponse::error(
                request.id,
                JsonRpcError::method_not_found(&request.method),
            ),
        })
    }

    fn handle_initialize(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        JsonRpcResponse::success(
            request.id,
            json!({
                "protocolVersion": PROTOCOL_VERSION,
                "serverInfo": {
                    "name": SERVER_NAME,
                    "version": env!("CARGO_PKG_VERSION")
                },
                "capabilities": {
                    "tools": {}
                }
            }),
        )
    }

    fn handle_tools_list(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        JsonRpcResponse::success(
            request.id,
            json!({ "tools": self.tool_handler.list_tools() }),
        )
    }

    async fn handle_tools_call(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        let Some(params) = request.params.as_object() else {
            return JsonRpcResponse::error(
                request.id,
                JsonRpcError::invalid_params("params must be an object"),
            );
        };

        let Some(tool_name) = params.get("name").and_then(Value::as_str) else {
            return JsonRpcResponse::error(
                request.id,
                JsonRpcError::invalid_params("missing 'name' field"),
            );
        };

        let arguments = params
            .get("arguments")
            .cloned()
            .unwrap_or_else(|| Value::Object(serde_json::Map::new()));

        match self.tool_handler.execute(tool_name, arguments).await {
            Ok(reply) => JsonRpcResponse::success(
                request.id,
                json!({
                    "content": [{ "type": "text", "text": reply.text }],
                    "isError": reply.is_error
                }),
            ),
            Err(e) => {
                JsonRpcResponse::error(request.id, JsonRpcError::invalid_params(e.to_string()))
            }
        }
    }
}
