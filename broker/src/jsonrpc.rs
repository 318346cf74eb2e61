//! JSON-RPC 2.0 request/response envelopes for the stdio transport.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A parsed JSON-RPC request line.
#[derive(Debug, Deserialize)]
pub struct JsonRpcRequest {
    /// Present on notifications; the dispatcher still does its best, but a
    /// response is never written back for a notification.
    #[serde(default)]
    pub id: Option<Value>,
    /// The RPC method name (`initialize`, `tools/list`, `tools/call`).
    pub method: String,
    /// Method-specific parameters.
    #[serde(default)]
    pub params: Option<Value>,
}

/// A JSON-RPC response, serialized as one line to stdout.
#[derive(Debug, Serialize)]
pub struct JsonRpcResponse {
    jsonrpc: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<JsonRpcError>,
}

#[derive(Debug, Serialize)]
struct JsonRpcError {
    code: i64,
    message: String,
}

impl JsonRpcResponse {
    /// Builds a success response wrapping `result`.
    #[must_use]
    pub fn success(id: Option<Value>, result: Value) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: Some(result),
            error: None,
        }
    }

    /// Builds an error response with a JSON-RPC error `code` and `message`.
    #[must_use]
    pub fn error(id: Option<Value>, code: i64, message: String) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: None,
            error: Some(JsonRpcError { code, message }),
        }
    }
}

/// Parses a single JSON-RPC request line.
///
/// # Errors
///
/// Returns the `serde_json` error if `input` is not a valid request envelope.
pub fn parse_request(input: &str) -> Result<JsonRpcRequest, serde_json::Error> {
    serde_json::from_str(input)
}

/// Renders a response as a single line of JSON, with no trailing newline.
#[must_use]
pub fn format_response(response: &JsonRpcResponse) -> String {
    serde_json::to_string(response).unwrap_or_else(|_| {
        r#"{"jsonrpc":"2.0","error":{"code":-32603,"message":"internal error formatting response"}}"#
            .to_string()
    })
}
