//! Per-recipient mailboxes over the blob adapter.
//!
//! Each message occupies exactly one key:
//! - unprocessed: `messages/{recipient_id}/{message_id}.json`
//! - processed:   `messages/processed/{recipient_id}/{message_id}.json`
//!
//! Marking a message processed is a two-step copy-then-delete. A crash
//! between the steps leaves the message in both namespaces (duplicate),
//! never in neither (loss). Consumers deduplicate by `message_id`.

use std::sync::Arc;

use crate::error::{Error, Result};
use crate::protocol::message::AgentMessage;
use crate::store::BlobStore;

const UNPROCESSED_PREFIX: &str = "messages/";
const PROCESSED_PREFIX: &str = "messages/processed/";
const MESSAGE_CONTENT_TYPE: &str = "application/json";

/// Opaque handle to one stored message, resolvable via [`Mailbox::fetch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageHandle {
    key: String,
}

impl MessageHandle {
    fn processed_key(&self) -> String {
        self.key.replacen(UNPROCESSED_PREFIX, PROCESSED_PREFIX, 1)
    }
}

impl std::fmt::Display for MessageHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key)
    }
}

/// Store for per-recipient message queues.
#[derive(Clone)]
pub struct Mailbox {
    blobs: Arc<dyn BlobStore>,
}

impl Mailbox {
    pub fn new(blobs: Arc<dyn BlobStore>) -> Self {
        Self { blobs }
    }

    fn message_key(recipient_id: &str, message_id: &str) -> String {
        format!("{}{}/{}.json", UNPROCESSED_PREFIX, recipient_id, message_id)
    }

    fn recipient_prefix(recipient_id: &str) -> String {
        format!("{}{}/", UNPROCESSED_PREFIX, recipient_id)
    }

    /// Store a message in the recipient's unprocessed namespace.
    ///
    /// Message ids are unique, so the derived key never collides with a
    /// different message. Returns the stored message's id.
    pub async fn deposit(&self, recipient_id: &str, message: &AgentMessage) -> Result<String> {
        let key = Self::message_key(recipient_id, &message.message_id);
        let body = serde_json::to_vec(message)?;

        self.blobs.put(&key, &body, MESSAGE_CONTENT_TYPE).await?;
        tracing::debug!("Deposited message {} for {}", message.message_id, recipient_id);
        Ok(message.message_id.clone())
    }

    /// List up to `limit` unprocessed message handles for a recipient.
    ///
    /// `limit` bounds the batch only, never the mailbox. Handle order is
    /// store-defined, not chronological.
    pub async fn list_unprocessed(
        &self,
        recipient_id: &str,
        limit: usize,
    ) -> Result<Vec<MessageHandle>> {
        let prefix = Self::recipient_prefix(recipient_id);
        let keys = self.blobs.list(&prefix).await?;

        Ok(keys
            .into_iter()
            .take(limit)
            .map(|key| MessageHandle { key })
            .collect())
    }

    /// Resolve a handle to its message.
    ///
    /// `Ok(None)` means the message was consumed or evicted between
    /// listing and fetching. That is a benign race, not an error.
    pub async fn fetch(&self, handle: &MessageHandle) -> Result<Option<AgentMessage>> {
        match self.blobs.get(&handle.key).await? {
            Some(body) => {
                let message = serde_json::from_slice(&body)
                    .map_err(|e| Error::Mailbox(format!("corrupt message at {}: {}", handle.key, e)))?;
                Ok(Some(message))
            }
            None => Ok(None),
        }
    }

    /// Move a message from the unprocessed to the processed namespace.
    ///
    /// Copy then delete, not atomic: a crash in between duplicates the
    /// message rather than losing it (at-least-once delivery).
    pub async fn mark_processed(&self, handle: &MessageHandle) -> Result<()> {
        let processed = handle.processed_key();
        self.blobs.copy(&handle.key, &processed).await?;
        self.blobs.delete(&handle.key).await?;
        tracing::debug!("Marked {} processed", handle.key);
        Ok(())
    }
}
