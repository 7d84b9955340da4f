//! Per-agent conversational state persisted to the blob store.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::protocol::message::current_timestamp;
use crate::store::BlobStore;

/// Most recent turns kept in history.
const HISTORY_LIMIT: usize = 10;

const STATE_CONTENT_TYPE: &str = "application/json";

/// One conversational turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    pub role: String,
    pub content: String,
    pub timestamp: i64,
}

/// Conversational state for one agent.
///
/// Loaded at the start of an invocation and saved at the end. Concurrent
/// invocations for the same agent can interleave load and save; the last
/// save wins and earlier updates are lost. That window is a known
/// consistency gap of the storage model, not something this layer locks
/// around.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AgentState {
    pub name: Option<String>,
    pub description: Option<String>,
    pub version: Option<String>,
    #[serde(default)]
    pub history: Vec<Turn>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl AgentState {
    /// Append a turn, trimming history to the most recent entries.
    pub fn push_turn(&mut self, role: impl Into<String>, content: impl Into<String>) {
        self.history.push(Turn {
            role: role.into(),
            content: content.into(),
            timestamp: current_timestamp(),
        });
        if self.history.len() > HISTORY_LIMIT {
            let excess = self.history.len() - HISTORY_LIMIT;
            self.history.drain(..excess);
        }
    }
}

/// Loads and saves agent state blobs.
#[derive(Clone)]
pub struct StateStore {
    blobs: Arc<dyn BlobStore>,
}

impl StateStore {
    pub fn new(blobs: Arc<dyn BlobStore>) -> Self {
        Self { blobs }
    }

    fn state_key(agent_id: &str) -> String {
        format!("agents/{}/state.json", agent_id)
    }

    /// Load an agent's state, defaulting on absence or failure.
    pub async fn load(&self, agent_id: &str) -> AgentState {
        let key = Self::state_key(agent_id);
        match self.blobs.get(&key).await {
            Ok(Some(body)) => serde_json::from_slice(&body).unwrap_or_else(|e| {
                tracing::warn!("Corrupt state for {}: {}, starting fresh", agent_id, e);
                AgentState::default()
            }),
            Ok(None) => AgentState::default(),
            Err(e) => {
                tracing::warn!("Failed to load state for {}: {}", agent_id, e);
                AgentState::default()
            }
        }
    }

    /// Save an agent's state, best-effort.
    pub async fn save(&self, agent_id: &str, state: &AgentState) {
        let key = Self::state_key(agent_id);
        let body = match serde_json::to_vec(state) {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!("Failed to serialize state for {}: {}", agent_id, e);
                return;
            }
        };

        if let Err(e) = self.blobs.put(&key, &body, STATE_CONTENT_TYPE).await {
            tracing::warn!("Failed to save state for {}: {}", agent_id, e);
        }
    }
}
