//! MCP JSON-RPC 2.0 message types.
//!
//! Messages are newline-delimited JSON objects on the child's stdio.
//! Reference: <https://spec.modelcontextprotocol.io/>

use mcpx_core::Capability;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Protocol revision sent in `initialize`.
pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// JSON-RPC 2.0 request.
#[derive(Debug, Serialize)]
pub struct JsonRpcRequest<'a> {
    pub jsonrpc: &'static str,
    pub id: u64,
    pub method: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl<'a> JsonRpcRequest<'a> {
    pub const fn new(id: u64, method: &'a str, params: Option<Value>) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            method,
            params,
        }
    }
}

/// JSON-RPC 2.0 error object.
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcError {
    pub code: i64,
    #[serde(default)]
    pub message: String,
}

/// Any message the server writes to stdout, before classification.
#[derive(Debug, Deserialize)]
struct RawMessage {
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    method: Option<String>,
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<JsonRpcError>,
}

/// A classified incoming message.
#[derive(Debug)]
pub enum Incoming {
    /// Reply to one of our requests.
    Response {
        id: Option<Value>,
        outcome: Result<Value, JsonRpcError>,
    },
    /// The server is asking us something.
    Request { id: Value, method: String },
    /// Fire-and-forget message from the server.
    Notification { method: String },
}

impl Incoming {
    /// Parse one stdout line. Returns `None` for lines that are not JSON-RPC.
    pub fn parse(line: &[u8]) -> Option<Self> {
        let raw: RawMessage = serde_json::from_slice(line).ok()?;
        match (raw.method, raw.id) {
            (Some(method), Some(id)) => Some(Self::Request { id, method }),
            (Some(method), None) => Some(Self::Notification { method }),
            (None, id) => {
                let outcome = match raw.error {
                    Some(err) => Err(err),
                    None => Ok(raw.result.unwrap_or(Value::Null)),
                };
                Some(Self::Response { id, outcome })
            }
        }
    }
}

/// Notification we send (no id, no reply).
pub fn notification(method: &str) -> Value {
    json!({ "jsonrpc": "2.0", "method": method })
}

/// Empty success reply to a server request (used for `ping`).
pub fn empty_result(id: &Value) -> Value {
    json!({ "jsonrpc": "2.0", "id": id, "result": {} })
}

/// Error reply to a server request.
pub fn error_reply(id: &Value, code: i64, message: &str) -> Value {
    json!({ "jsonrpc": "2.0", "id": id, "error": { "code": code, "message": message } })
}

/// `initialize` request parameters.
pub fn initialize_params() -> Value {
    json!({
        "protocolVersion": PROTOCOL_VERSION,
        "clientInfo": {
            "name": "mcpx",
            "version": env!("CARGO_PKG_VERSION"),
        },
        "capabilities": {},
    })
}

/// Server information from `initialize`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServerInfo {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub version: Option<String>,
}

/// `initialize` result.
#[derive(Debug, Clone, Deserialize)]
pub struct InitializeResult {
    #[serde(rename = "protocolVersion", default)]
    pub protocol_version: String,
    #[serde(rename = "serverInfo", default)]
    pub server_info: ServerInfo,
}

/// One page of `tools/list`.
#[derive(Debug, Deserialize)]
pub struct ListToolsPage {
    #[serde(default)]
    pub tools: Vec<Capability>,
    #[serde(rename = "nextCursor", default)]
    pub next_cursor: Option<String>,
}

/// Result of `tools/call`.
///
/// `is_error` marks an application-level failure reported by the tool
/// itself; the session still completed normally.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CallResult {
    #[serde(default)]
    pub content: Vec<Value>,

    #[serde(rename = "isError", default)]
    pub is_error: bool,

    #[serde(
        rename = "structuredContent",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub structured_content: Option<Value>,
}

impl CallResult {
    /// A successful result carrying one text block.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![json!({ "type": "text", "text": text.into() })],
            ..Self::default()
        }
    }

    /// A tool-reported failure carrying one text block.
    #[must_use]
    pub fn into_error(mut self) -> Self {
        self.is_error = true;
        self
    }
}
