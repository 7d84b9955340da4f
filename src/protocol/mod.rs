//! Agent-to-Agent (A2A) protocol for AgentMesh.
//!
//! Store-and-forward messaging between agent processes:
//! - Typed messages with correlation ids
//! - Per-recipient mailboxes over the blob adapter
//! - A stateless send/receive engine with at-least-once delivery

pub mod a2a;
pub mod mailbox;
pub mod message;

pub use a2a::{A2aProtocol, DEFAULT_RECEIVE_LIMIT};
pub use mailbox::{Mailbox, MessageHandle};
pub use message::AgentMessage;
