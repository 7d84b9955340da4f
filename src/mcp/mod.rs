//! Model Context Protocol (MCP) client for AgentMesh.
//!
//! Request/response protocol to external context/tool servers:
//! - Structured request/response envelopes
//! - Retry with exponential backoff for transport failures
//! - A bounded client-instance cache keyed by endpoint and credential

pub mod cache;
pub mod client;
pub mod retry;
pub mod types;

pub use cache::ClientCache;
pub use client::{McpClient, McpError};
pub use retry::RetryPolicy;
pub use types::{McpRequest, McpResponse};
