//! AgentMesh library root.

pub mod cli;
pub mod completion;
pub mod config;
pub mod error;
pub mod handler;
pub mod logging;
pub mod mcp;
pub mod protocol;
pub mod registry;
pub mod state;
pub mod store;
pub mod tools;

pub use cli::Commands;
pub use completion::Completion;
pub use config::{load_settings, Settings};
pub use error::{Error, Result};
pub use handler::{invoke, AppContext, InvocationEvent, InvocationOutcome};
pub use mcp::{ClientCache, McpClient, McpRequest, McpResponse, RetryPolicy};
pub use protocol::{A2aProtocol, AgentMessage, Mailbox};
pub use registry::{AgentCard, AgentRegistry};
pub use state::{AgentState, StateStore};
pub use store::{BlobStore, Directory};
pub use tools::{Tool, ToolRegistry};
