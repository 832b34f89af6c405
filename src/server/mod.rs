//! MCP server over stdio.
//!
//! Reads newline-delimited JSON-RPC from stdin and writes responses to
//! stdout. Logs go to stderr so they never corrupt the protocol stream.

pub mod handler;
pub mod protocol;

mod tests;

use crate::tools::fetch::Ladder;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use protocol::*;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub const SERVER_NAME: &str = env!("CARGO_PKG_NAME");
pub const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Clone)]
pub struct Server {
    ladder: Arc<Ladder>,
    /// Cancellation handles for in-flight `tools/call` requests, keyed by request id.
    in_flight: Arc<DashMap<String, CancellationToken>>,
}

impl Server {
    pub fn new(ladder: Ladder) -> Self {
        Self {
            ladder: Arc::new(ladder),
            in_flight: Arc::new(DashMap::new()),
        }
    }

    /// Serve stdin/stdout until stdin closes.
    pub async fn run_stdio(&self) -> crate::Result<()> {
        let stdin = BufReader::new(tokio::io::stdin());
        let stdout = tokio::io::stdout();
        eprintln!("{}", ready_message(self.ladder.backend_name()));
        self.serve(stdin, stdout).await
    }

    /// Serve one connection until `reader` hits EOF and every in-flight call
    /// has answered.
    pub async fn serve<R, W>(&self, reader: R, writer: W) -> crate::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let (tx, mut rx) = mpsc::unbounded_channel::<JsonRpcResponse>();

        let writer_task = tokio::spawn(async move {
            let mut writer = writer;
            while let Some(response) = rx.recv().await {
                let mut line = serde_json::to_string(&response)?;
                line.push('\n');
                writer.write_all(line.as_bytes()).await?;
                writer.flush().await?;
            }
            Ok::<(), crate::error::TierfetchError>(())
        });

        let mut lines = reader.lines();
        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }

            let request: JsonRpcRequest = match serde_json::from_str(&line) {
                Ok(request) => request,
                Err(e) => {
                    warn!(error = %e, "unparseable message");
                    let _ = tx.send(JsonRpcResponse::failure(
                        Value::Null,
                        PARSE_ERROR,
                        format!("parse error: {e}"),
                    ));
                    continue;
                }
            };

            if request.method == METHOD_TOOLS_CALL
                && !request.is_notification()
                && request.jsonrpc == JSONRPC_VERSION
            {
                debug!(method = %request.method, id = ?request.id, "received");
                // Tool calls can take a while; don't block other messages.
                // Register before spawning so a cancel right behind the call is seen.
                let id = request.id.unwrap_or(Value::Null);
                match self.begin_call(&id, request.params) {
                    Ok((params, call)) => {
                        let server = self.clone();
                        let tx = tx.clone();
                        tokio::spawn(async move {
                            let _ = tx.send(server.finish_call(id, params, call).await);
                        });
                    }
                    Err(response) => {
                        let _ = tx.send(response);
                    }
                }
            } else if let Some(response) = self.respond(request).await {
                let _ = tx.send(response);
            }
        }

        drop(tx);
        writer_task.await??;
        Ok(())
    }

    /// Handle one message. Returns `None` for notifications.
    pub async fn respond(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        debug!(method = %request.method, id = ?request.id, "received");

        if request.is_notification() {
            self.handle_notification(&request);
            return None;
        }
        let id = request.id.clone().unwrap_or(Value::Null);

        if request.jsonrpc != JSONRPC_VERSION {
            return Some(JsonRpcResponse::failure(
                id,
                INVALID_REQUEST,
                format!("unsupported jsonrpc version {:?}", request.jsonrpc),
            ));
        }

        let response = match request.method.as_str() {
            METHOD_INITIALIZE => JsonRpcResponse::success(id, initialize_result()),
            METHOD_PING => JsonRpcResponse::success(id, json!({})),
            METHOD_TOOLS_LIST => {
                JsonRpcResponse::success(id, json!({ "tools": handler::tool_definitions() }))
            }
            METHOD_TOOLS_CALL => match self.begin_call(&id, request.params) {
                Ok((params, call)) => self.finish_call(id, params, call).await,
                Err(response) => response,
            },
            other => JsonRpcResponse::failure(
                id,
                METHOD_NOT_FOUND,
                format!("method not found: {other}"),
            ),
        };
        Some(response)
    }

    /// Parse `tools/call` params and register the call under `id`.
    ///
    /// An id that is still running is refused; the running call keeps its
    /// entry and its cancellation token.
    fn begin_call(
        &self,
        id: &Value,
        params: Option<Value>,
    ) -> Result<(ToolCallParams, InFlightCall), JsonRpcResponse> {
        let params: ToolCallParams = serde_json::from_value(params.unwrap_or(Value::Null))
            .map_err(|e| {
                JsonRpcResponse::failure(
                    id.clone(),
                    INVALID_PARAMS,
                    format!("invalid tools/call params: {e}"),
                )
            })?;

        let key = id.to_string();
        match self.in_flight.entry(key.clone()) {
            Entry::Occupied(_) => {
                warn!(request_id = %key, "duplicate request id");
                Err(JsonRpcResponse::failure(
                    id.clone(),
                    INVALID_REQUEST,
                    format!("request id {key} is already in flight"),
                ))
            }
            Entry::Vacant(slot) => {
                let cancel = CancellationToken::new();
                slot.insert(cancel.clone());
                Ok((params, InFlightCall { key, cancel }))
            }
        }
    }

    /// Run a registered call and release its id.
    async fn finish_call(
        &self,
        id: Value,
        params: ToolCallParams,
        call: InFlightCall,
    ) -> JsonRpcResponse {
        let result = handler::handle_tool_call(&self.ladder, params, &call.cancel).await;
        self.in_flight.remove(&call.key);
        tool_call_response(id, serde_json::to_value(&result))
    }

    /// Number of tool calls currently running.
    pub fn in_flight_count(&self) -> usize {
        self.in_flight.len()
    }

    fn handle_notification(&self, request: &JsonRpcRequest) {
        match request.method.as_str() {
            METHOD_INITIALIZED => debug!("client initialized"),
            METHOD_CANCELLED => {
                let params = request
                    .params
                    .clone()
                    .and_then(|p| serde_json::from_value::<CancelledParams>(p).ok());
                if let Some(params) = params {
                    let key = params.request_id.to_string();
                    if let Some(entry) = self.in_flight.get(&key) {
                        info!(request_id = %key, reason = ?params.reason, "cancelling request");
                        entry.value().cancel();
                    }
                }
            }
            other => debug!(method = other, "ignoring notification"),
        }
    }
}

/// A `tools/call` holding an `in_flight` entry.
struct InFlightCall {
    key: String,
    cancel: CancellationToken,
}

fn tool_call_response(id: Value, result: serde_json::Result<Value>) -> JsonRpcResponse {
    match result {
        Ok(value) => JsonRpcResponse::success(id, value),
        Err(e) => JsonRpcResponse::failure(id, INTERNAL_ERROR, format!("internal error: {e}")),
    }
}

/// Startup line for stderr, printed whatever the log filter says.
fn ready_message(backend: &str) -> String {
    format!("{SERVER_NAME} MCP server running on stdio (backend: {backend})")
}

fn initialize_result() -> Value {
    json!({
        "protocolVersion": PROTOCOL_VERSION,
        "capabilities": { "tools": {} },
        "serverInfo": { "name": SERVER_NAME, "version": SERVER_VERSION },
    })
}
