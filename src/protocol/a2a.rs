//! A2A protocol engine: send/receive semantics over mailbox and registry.

use serde_json::Value;

use crate::error::Result;
use crate::protocol::mailbox::Mailbox;
use crate::protocol::message::AgentMessage;
use crate::registry::AgentRegistry;

/// Default batch size for [`A2aProtocol::receive`].
pub const DEFAULT_RECEIVE_LIMIT: usize = 10;

/// Stateless coordinator bound to one agent identity.
///
/// Owns no persistent state; safe to reconstruct per invocation. Delivery
/// is at-least-once: a consumer that has seen a `message_id` before must
/// treat the re-receive as a duplicate.
#[derive(Clone)]
pub struct A2aProtocol {
    agent_id: String,
    mailbox: Mailbox,
    registry: AgentRegistry,
}

impl A2aProtocol {
    pub fn new(agent_id: impl Into<String>, mailbox: Mailbox, registry: AgentRegistry) -> Self {
        Self {
            agent_id: agent_id.into(),
            mailbox,
            registry,
        }
    }

    /// The identity this engine sends and receives as.
    pub fn agent_id(&self) -> &str {
        &self.agent_id
    }

    /// The registry this engine was constructed with.
    pub fn registry(&self) -> &AgentRegistry {
        &self.registry
    }

    /// Send a message to another agent.
    ///
    /// When this returns a `message_id` the message is durably stored in
    /// the recipient's unprocessed namespace. Deposit failures propagate;
    /// retry, if wanted, is the caller's to layer on.
    pub async fn send(
        &self,
        recipient_id: &str,
        content: Value,
        correlation_id: Option<String>,
    ) -> Result<String> {
        let mut message = AgentMessage::new(self.agent_id.as_str(), recipient_id, content);
        if let Some(id) = correlation_id {
            message = message.with_correlation_id(id);
        }

        let message_id = self.mailbox.deposit(recipient_id, &message).await?;
        tracing::debug!(
            "Sent message {} from {} to {}",
            message_id,
            self.agent_id,
            recipient_id
        );
        Ok(message_id)
    }

    /// Receive up to `limit` unprocessed messages for this agent.
    ///
    /// Each returned message was marked processed before this call
    /// returned: unprocessed → processed is one-way, and a consumer crash
    /// after return loses the message. A handle whose fetch comes back
    /// absent lost the race to a concurrent receiver and is skipped.
    pub async fn receive(&self, limit: usize) -> Result<Vec<AgentMessage>> {
        let handles = self.mailbox.list_unprocessed(&self.agent_id, limit).await?;

        let mut messages = Vec::new();
        for handle in handles {
            let Some(message) = self.mailbox.fetch(&handle).await? else {
                tracing::debug!("Message at {} already consumed, skipping", handle);
                continue;
            };
            self.mailbox.mark_processed(&handle).await?;
            messages.push(message);
        }

        if !messages.is_empty() {
            tracing::debug!("{} received {} message(s)", self.agent_id, messages.len());
        }
        Ok(messages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryBlobStore, MemoryDirectory};
    use serde_json::json;
    use std::sync::Arc;

    fn engine(agent_id: &str) -> (A2aProtocol, Mailbox, AgentRegistry) {
        let blobs = Arc::new(MemoryBlobStore::new());
        let mailbox = Mailbox::new(blobs);
        let registry = AgentRegistry::new(Arc::new(MemoryDirectory::new()));
        (
            A2aProtocol::new(agent_id, mailbox.clone(), registry.clone()),
            mailbox,
            registry,
        )
    }

    #[tokio::test]
    async fn test_send_receive_round_trip() {
        let (sender, mailbox, registry) = engine("agent-a");
        let receiver = A2aProtocol::new("agent-b", mailbox, registry);

        let content = json!({"task": "summarize", "text": "hello"});
        let message_id = sender.send("agent-b", content.clone(), None).await.unwrap();

        let messages = receiver.receive(DEFAULT_RECEIVE_LIMIT).await.unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].message_id, message_id);
        assert_eq!(messages[0].sender_id, "agent-a");
        assert_eq!(messages[0].recipient_id, "agent-b");
        assert_eq!(messages[0].content, content);
    }

    #[tokio::test]
    async fn test_receive_consumes_exactly_once() {
        let (sender, mailbox, registry) = engine("agent-a");
        let receiver = A2aProtocol::new("agent-b", mailbox, registry);

        sender.send("agent-b", json!({"n": 1}), None).await.unwrap();

        let first = receiver.receive(DEFAULT_RECEIVE_LIMIT).await.unwrap();
        assert_eq!(first.len(), 1);

        let second = receiver.receive(DEFAULT_RECEIVE_LIMIT).await.unwrap();
        assert!(second.is_empty());
    }

    #[tokio::test]
    async fn test_receive_respects_limit() {
        let (sender, mailbox, registry) = engine("agent-a");
        let receiver = A2aProtocol::new("agent-b", mailbox, registry);

        for n in 0..5 {
            sender.send("agent-b", json!({"n": n}), None).await.unwrap();
        }

        let batch = receiver.receive(3).await.unwrap();
        assert_eq!(batch.len(), 3);

        let rest = receiver.receive(DEFAULT_RECEIVE_LIMIT).await.unwrap();
        assert_eq!(rest.len(), 2);
    }

    #[tokio::test]
    async fn test_correlation_id_carried() {
        let (sender, mailbox, registry) = engine("agent-a");
        let receiver = A2aProtocol::new("agent-b", mailbox, registry);

        sender
            .send("agent-b", json!({}), Some("req-42".to_string()))
            .await
            .unwrap();

        let messages = receiver.receive(DEFAULT_RECEIVE_LIMIT).await.unwrap();
        assert_eq!(messages[0].correlation_id.as_deref(), Some("req-42"));
    }

    #[tokio::test]
    async fn test_concurrent_receivers_no_double_delivery() {
        let (sender, mailbox, registry) = engine("agent-a");
        let receiver_one = A2aProtocol::new("agent-b", mailbox.clone(), registry.clone());
        let receiver_two = A2aProtocol::new("agent-b", mailbox, registry);

        for n in 0..10 {
            sender.send("agent-b", json!({"n": n}), None).await.unwrap();
        }

        let (batch_one, batch_two) = tokio::join!(
            receiver_one.receive(DEFAULT_RECEIVE_LIMIT),
            receiver_two.receive(DEFAULT_RECEIVE_LIMIT)
        );

        // Deduplicating by message_id, every message is delivered at
        // least once and the union is exactly the ten sent.
        let mut seen = std::collections::HashSet::new();
        for message in batch_one.unwrap().into_iter().chain(batch_two.unwrap()) {
            seen.insert(message.message_id);
        }
        assert_eq!(seen.len(), 10);

        let leftover = receiver_one.receive(DEFAULT_RECEIVE_LIMIT).await.unwrap();
        assert!(leftover.is_empty());
    }

    #[tokio::test]
    async fn test_messages_route_by_recipient() {
        let (sender, mailbox, registry) = engine("agent-a");
        let receiver_b = A2aProtocol::new("agent-b", mailbox.clone(), registry.clone());
        let receiver_c = A2aProtocol::new("agent-c", mailbox, registry);

        sender.send("agent-b", json!({"for": "b"}), None).await.unwrap();
        sender.send("agent-c", json!({"for": "c"}), None).await.unwrap();

        let for_b = receiver_b.receive(DEFAULT_RECEIVE_LIMIT).await.unwrap();
        assert_eq!(for_b.len(), 1);
        assert_eq!(for_b[0].content, json!({"for": "b"}));

        let for_c = receiver_c.receive(DEFAULT_RECEIVE_LIMIT).await.unwrap();
        assert_eq!(for_c.len(), 1);
        assert_eq!(for_c[0].content, json!({"for": "c"}));
    }
}
