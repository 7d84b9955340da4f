//! Key-value directory adapter for agent records.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;

use crate::error::{Error, Result};

/// Primary key field for directory records.
pub const PRIMARY_KEY: &str = "agent_id";

/// Flat record store keyed by `agent_id`.
///
/// Absent keys are `Ok(None)`, never an error. Any `Err` means the
/// directory itself is unavailable.
#[async_trait]
pub trait Directory: Send + Sync {
    /// Upsert one record. The record must carry a string `agent_id` field.
    async fn put(&self, item: Value) -> Result<()>;

    /// Get a record by primary key.
    async fn get(&self, agent_id: &str) -> Result<Option<Value>>;

    /// Containment match of `needle` against the named field across all
    /// records. For list fields a record matches when any element contains
    /// `needle`; for string fields when the value contains it. Result order
    /// is store-defined; callers must treat it as unordered.
    async fn query_contains(&self, field: &str, needle: &str) -> Result<Vec<Value>>;
}

fn primary_key(item: &Value) -> Result<String> {
    item.get(PRIMARY_KEY)
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| Error::Directory(format!("record is missing string field '{}'", PRIMARY_KEY)))
}

fn field_contains(item: &Value, field: &str, needle: &str) -> bool {
    match item.get(field) {
        Some(Value::Array(elements)) => elements
            .iter()
            .filter_map(|e| e.as_str())
            .any(|e| e.contains(needle)),
        Some(Value::String(s)) => s.contains(needle),
        _ => false,
    }
}

/// In-memory directory for tests and single-process deployments.
#[derive(Debug, Default, Clone)]
pub struct MemoryDirectory {
    records: Arc<Mutex<HashMap<String, Value>>>,
}

impl MemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Directory for MemoryDirectory {
    async fn put(&self, item: Value) -> Result<()> {
        let key = primary_key(&item)?;
        self.records.lock().unwrap().insert(key, item);
        Ok(())
    }

    async fn get(&self, agent_id: &str) -> Result<Option<Value>> {
        Ok(self.records.lock().unwrap().get(agent_id).cloned())
    }

    async fn query_contains(&self, field: &str, needle: &str) -> Result<Vec<Value>> {
        let records = self.records.lock().unwrap();
        Ok(records
            .values()
            .filter(|item| field_contains(item, field, needle))
            .cloned()
            .collect())
    }
}

/// Filesystem-backed directory: one JSON document per record.
#[derive(Debug, Clone)]
pub struct FsDirectory {
    dir: PathBuf,
}

impl FsDirectory {
    /// Create a directory adapter rooted at `dir`.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)
            .map_err(|e| Error::Directory(format!("create {}: {}", dir.display(), e)))?;
        Ok(Self { dir })
    }

    fn record_path(&self, agent_id: &str) -> PathBuf {
        self.dir.join(format!("{}.json", agent_id))
    }
}

#[async_trait]
impl Directory for FsDirectory {
    async fn put(&self, item: Value) -> Result<()> {
        let key = primary_key(&item)?;
        let path = self.record_path(&key);
        let content = serde_json::to_string_pretty(&item)?;
        std::fs::write(&path, content)
            .map_err(|e| Error::Directory(format!("write {}: {}", path.display(), e)))?;
        Ok(())
    }

    async fn get(&self, agent_id: &str) -> Result<Option<Value>> {
        let path = self.record_path(agent_id);
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&path)
            .map_err(|e| Error::Directory(format!("read {}: {}", path.display(), e)))?;
        Ok(Some(serde_json::from_str(&content)?))
    }

    async fn query_contains(&self, field: &str, needle: &str) -> Result<Vec<Value>> {
        let entries = std::fs::read_dir(&self.dir)
            .map_err(|e| Error::Directory(format!("list {}: {}", self.dir.display(), e)))?;

        let mut matches = Vec::new();
        for entry in entries {
            let entry =
                entry.map_err(|e| Error::Directory(format!("list {}: {}", self.dir.display(), e)))?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let content = std::fs::read_to_string(&path)
                .map_err(|e| Error::Directory(format!("read {}: {}", path.display(), e)))?;
            let item: Value = match serde_json::from_str(&content) {
                Ok(item) => item,
                Err(e) => {
                    tracing::warn!("Skipping corrupt record {}: {}", path.display(), e);
                    continue;
                }
            };
            if field_contains(&item, field, needle) {
                matches.push(item);
            }
        }
        Ok(matches)
    }
}
