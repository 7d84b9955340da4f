//! MCP protocol envelopes.
#![allow(dead_code)]

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Status value a server reports on success.
pub const STATUS_SUCCESS: &str = "success";

/// Request envelope for one MCP server call attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McpRequest {
    /// Selects server-side behavior.
    pub operation: String,
    pub context: Value,
    pub parameters: Value,
    /// Unique per call attempt.
    pub request_id: String,
}

impl McpRequest {
    /// Build a request with a fresh `request_id`.
    pub fn new(operation: impl Into<String>, context: Value, parameters: Value) -> Self {
        Self {
            operation: operation.into(),
            context,
            parameters,
            request_id: uuid::Uuid::new_v4().to_string(),
        }
    }
}

/// Response envelope from an MCP server.
///
/// `status` is a free string; servers may define values beyond
/// `success` and `error`. `data` is meaningful only when the response
/// is successful.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McpResponse {
    #[serde(default = "default_status")]
    pub status: String,
    #[serde(default)]
    pub data: Value,
    /// Ordered structured error descriptors.
    #[serde(default)]
    pub errors: Vec<Value>,
    /// Echoes the request's id, or is defaulted to it by the client.
    #[serde(default)]
    pub request_id: String,
}

fn default_status() -> String {
    "error".to_string()
}

impl McpResponse {
    /// True iff the server reported `status == "success"`.
    pub fn success(&self) -> bool {
        self.status == STATUS_SUCCESS
    }
}
