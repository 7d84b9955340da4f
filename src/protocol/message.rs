//! Message type for agent-to-agent communication.
#![allow(dead_code)]

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::{SystemTime, UNIX_EPOCH};

/// Unit of inter-agent communication.
///
/// `message_id` is globally unique and serves as the idempotency key for
/// receive-side deduplication under at-least-once delivery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentMessage {
    /// Unique id, generated at send time (UUID v4).
    pub message_id: String,
    pub sender_id: String,
    pub recipient_id: String,
    /// Opaque structured payload.
    pub content: Value,
    /// Links a reply to a prior request.
    pub correlation_id: Option<String>,
    /// Send time (unix ms).
    pub timestamp: i64,
    /// Advisory expiry in seconds; carried but not enforced on receive.
    pub ttl: Option<u64>,
}

impl AgentMessage {
    /// Create a message from a sender to a recipient.
    pub fn new(
        sender_id: impl Into<String>,
        recipient_id: impl Into<String>,
        content: Value,
    ) -> Self {
        Self {
            message_id: uuid::Uuid::new_v4().to_string(),
            sender_id: sender_id.into(),
            recipient_id: recipient_id.into(),
            content,
            correlation_id: None,
            timestamp: current_timestamp(),
            ttl: None,
        }
    }

    /// Set the correlation id for request/response chains.
    pub fn with_correlation_id(mut self, id: impl Into<String>) -> Self {
        self.correlation_id = Some(id.into());
        self
    }

    /// Set the advisory TTL in seconds.
    pub fn with_ttl(mut self, ttl_seconds: u64) -> Self {
        self.ttl = Some(ttl_seconds);
        self
    }

    /// Check the advisory TTL against the current time. Receivers that
    /// want expiry must apply this themselves; the protocol does not.
    pub fn is_expired(&self) -> bool {
        match self.ttl {
            Some(ttl) => current_timestamp() > self.timestamp + (ttl as i64 * 1000),
            None => false,
        }
    }
}

pub(crate) fn current_timestamp() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_millis() as i64
}
