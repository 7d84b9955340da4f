//! Agent discovery registry.
//!
//! AgentCards describe one agent identity and its capabilities. The
//! registry is the single source of truth for the latest card per
//! `agent_id`; registration is last-write-wins and cards are never
//! deleted by this layer.
#![allow(dead_code)]

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::Result;
use crate::store::Directory;

/// Directory field indexed for capability queries.
const CAPABILITIES_FIELD: &str = "capabilities";

/// Identity and capability descriptor for one agent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentCard {
    /// Stable unique identity within one registry.
    pub agent_id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub version: String,
    /// Capability tags used for discovery matching.
    #[serde(default)]
    pub capabilities: Vec<String>,
    /// Schema documents, opaque to this layer.
    #[serde(default)]
    pub input_schema: Value,
    #[serde(default)]
    pub output_schema: Value,
    #[serde(default)]
    pub auth_required: bool,
    /// Advisory requests-per-unit-time hint; not enforced here.
    #[serde(default)]
    pub rate_limit: Option<u32>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl AgentCard {
    /// Create a card with the required identity fields.
    pub fn new(agent_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            agent_id: agent_id.into(),
            name: name.into(),
            description: String::new(),
            version: String::new(),
            capabilities: Vec::new(),
            input_schema: Value::Null,
            output_schema: Value::Null,
            auth_required: false,
            rate_limit: None,
            metadata: Map::new(),
        }
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the version.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Add a capability tag.
    pub fn with_capability(mut self, capability: impl Into<String>) -> Self {
        self.capabilities.push(capability.into());
        self
    }

    /// Set all capability tags.
    pub fn with_capabilities(mut self, capabilities: Vec<String>) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// Set the input schema document.
    pub fn with_input_schema(mut self, schema: Value) -> Self {
        self.input_schema = schema;
        self
    }

    /// Set the output schema document.
    pub fn with_output_schema(mut self, schema: Value) -> Self {
        self.output_schema = schema;
        self
    }

    /// Require authentication for this agent.
    pub fn with_auth_required(mut self, required: bool) -> Self {
        self.auth_required = required;
        self
    }

    /// Set the advisory rate limit.
    pub fn with_rate_limit(mut self, limit: u32) -> Self {
        self.rate_limit = Some(limit);
        self
    }

    /// Attach a metadata entry.
    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Check whether the card carries a capability tag.
    pub fn has_capability(&self, capability: &str) -> bool {
        self.capabilities.iter().any(|c| c.contains(capability))
    }
}

/// Agent discovery and registration over a directory adapter.
#[derive(Clone)]
pub struct AgentRegistry {
    directory: Arc<dyn Directory>,
}

impl AgentRegistry {
    pub fn new(directory: Arc<dyn Directory>) -> Self {
        Self { directory }
    }

    /// Register an agent, overwriting any existing card for its id.
    ///
    /// Returns false instead of raising on store failure: an agent that
    /// cannot register must still be able to process messages already
    /// addressed to it.
    pub async fn register(&self, card: &AgentCard) -> bool {
        let item = match serde_json::to_value(card) {
            Ok(item) => item,
            Err(e) => {
                tracing::warn!("Failed to serialize card for {}: {}", card.agent_id, e);
                return false;
            }
        };

        match self.directory.put(item).await {
            Ok(()) => {
                tracing::debug!("Registered agent {}", card.agent_id);
                true
            }
            Err(e) => {
                tracing::warn!("Failed to register agent {}: {}", card.agent_id, e);
                false
            }
        }
    }

    /// Look up an agent by id. `Ok(None)` means not registered; `Err`
    /// means the directory is unavailable.
    pub async fn lookup(&self, agent_id: &str) -> Result<Option<AgentCard>> {
        match self.directory.get(agent_id).await? {
            Some(item) => Ok(Some(serde_json::from_value(item)?)),
            None => Ok(None),
        }
    }

    /// Find agents whose capability set contains `capability`.
    ///
    /// Result order is store-defined; treat it as unordered.
    pub async fn find_by_capability(&self, capability: &str) -> Result<Vec<AgentCard>> {
        let items = self
            .directory
            .query_contains(CAPABILITIES_FIELD, capability)
            .await?;

        let mut cards = Vec::with_capacity(items.len());
        for item in items {
            match serde_json::from_value::<AgentCard>(item) {
                Ok(card) => cards.push(card),
                Err(e) => tracing::warn!("Skipping malformed card in capability query: {}", e),
            }
        }
        Ok(cards)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryDirectory;
    use serde_json::json;

    fn registry() -> AgentRegistry {
        AgentRegistry::new(Arc::new(MemoryDirectory::new()))
    }

    #[tokio::test]
    async fn test_register_lookup_round_trip() {
        let registry = registry();
        let card = AgentCard::new("summarizer", "Summarizer")
            .with_description("Summarizes text")
            .with_version("1.0.0")
            .with_capability("summarize")
            .with_input_schema(json!({"type": "object"}))
            .with_rate_limit(60)
            .with_metadata("region", json!("local"));

        assert!(registry.register(&card).await);

        let found = registry.lookup("summarizer").await.unwrap().unwrap();
        assert_eq!(found, card);
    }

    #[tokio::test]
    async fn test_lookup_absent_is_none() {
        let registry = registry();
        assert!(registry.lookup("nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_register_last_write_wins() {
        let registry = registry();
        let first = AgentCard::new("a1", "First").with_version("1");
        let second = AgentCard::new("a1", "Second").with_version("2");

        assert!(registry.register(&first).await);
        assert!(registry.register(&second).await);

        let found = registry.lookup("a1").await.unwrap().unwrap();
        assert_eq!(found.name, "Second");
        assert_eq!(found.version, "2");
    }

    #[tokio::test]
    async fn test_find_by_capability() {
        let registry = registry();
        registry
            .register(&AgentCard::new("a1", "A1").with_capability("summarize"))
            .await;
        registry
            .register(&AgentCard::new("a2", "A2").with_capability("translate"))
            .await;
        registry
            .register(&AgentCard::new("a3", "A3").with_capabilities(vec![
                "summarize".to_string(),
                "search".to_string(),
            ]))
            .await;

        let mut found = registry.find_by_capability("summarize").await.unwrap();
        found.sort_by(|a, b| a.agent_id.cmp(&b.agent_id));

        let ids: Vec<&str> = found.iter().map(|c| c.agent_id.as_str()).collect();
        assert_eq!(ids, vec!["a1", "a3"]);
    }

    #[tokio::test]
    async fn test_find_by_capability_empty() {
        let registry = registry();
        registry
            .register(&AgentCard::new("a1", "A1").with_capability("summarize"))
            .await;

        let found = registry.find_by_capability("paint").await.unwrap();
        assert!(found.is_empty());
    }
}
