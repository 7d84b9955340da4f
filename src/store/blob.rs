//! Prefix-addressed blob store adapter.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::error::{Error, Result};

/// Blob store over `/`-separated keys.
///
/// Absent keys are `Ok(None)` on `get`; `delete` of a missing key is a
/// no-op. `copy` of a missing source is an error. Each operation is atomic
/// for its own key only.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn put(&self, key: &str, body: &[u8], content_type: &str) -> Result<()>;

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// List keys under a prefix. Order is store-defined; callers must not
    /// rely on it.
    async fn list(&self, prefix: &str) -> Result<Vec<String>>;

    async fn copy(&self, src_key: &str, dst_key: &str) -> Result<()>;

    async fn delete(&self, key: &str) -> Result<()>;
}

/// In-memory blob store for tests and single-process deployments.
#[derive(Debug, Default, Clone)]
pub struct MemoryBlobStore {
    blobs: Arc<Mutex<HashMap<String, (String, Vec<u8>)>>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(&self, key: &str, body: &[u8], content_type: &str) -> Result<()> {
        self.blobs
            .lock()
            .unwrap()
            .insert(key.to_string(), (content_type.to_string(), body.to_vec()));
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self
            .blobs
            .lock()
            .unwrap()
            .get(key)
            .map(|(_, body)| body.clone()))
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>> {
        Ok(self
            .blobs
            .lock()
            .unwrap()
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect())
    }

    async fn copy(&self, src_key: &str, dst_key: &str) -> Result<()> {
        let mut blobs = self.blobs.lock().unwrap();
        let value = blobs
            .get(src_key)
            .cloned()
            .ok_or_else(|| Error::Blob(format!("copy source missing: {}", src_key)))?;
        blobs.insert(dst_key.to_string(), value);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.blobs.lock().unwrap().remove(key);
        Ok(())
    }
}

/// Filesystem-backed blob store: keys map to files under a root directory.
#[derive(Debug, Clone)]
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    /// Create a blob store rooted at `root`.
    pub fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        std::fs::create_dir_all(&root)
            .map_err(|e| Error::Blob(format!("create {}: {}", root.display(), e)))?;
        Ok(Self { root })
    }

    fn blob_path(&self, key: &str) -> Result<PathBuf> {
        // Keys are relative `/`-separated paths; refuse traversal.
        if key.is_empty() || key.starts_with('/') || key.split('/').any(|s| s == "..") {
            return Err(Error::Blob(format!("invalid key: {}", key)));
        }
        Ok(self.root.join(key))
    }

    fn collect_keys(&self, dir: &Path, keys: &mut Vec<String>) -> Result<()> {
        let entries = std::fs::read_dir(dir)
            .map_err(|e| Error::Blob(format!("list {}: {}", dir.display(), e)))?;

        for entry in entries {
            let entry = entry.map_err(|e| Error::Blob(format!("list {}: {}", dir.display(), e)))?;
            let path = entry.path();
            if path.is_dir() {
                self.collect_keys(&path, keys)?;
            } else if let Ok(relative) = path.strip_prefix(&self.root) {
                let key = relative
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy())
                    .collect::<Vec<_>>()
                    .join("/");
                keys.push(key);
            }
        }
        Ok(())
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    // The filesystem does not record content types; the parameter is
    // accepted for contract parity and ignored.
    async fn put(&self, key: &str, body: &[u8], _content_type: &str) -> Result<()> {
        let path = self.blob_path(key)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| Error::Blob(format!("create {}: {}", parent.display(), e)))?;
        }
        std::fs::write(&path, body)
            .map_err(|e| Error::Blob(format!("write {}: {}", path.display(), e)))?;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.blob_path(key)?;
        match std::fs::read(&path) {
            Ok(body) => Ok(Some(body)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::Blob(format!("read {}: {}", path.display(), e))),
        }
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        if self.root.exists() {
            self.collect_keys(&self.root, &mut keys)?;
        }
        keys.retain(|k| k.starts_with(prefix));
        Ok(keys)
    }

    async fn copy(&self, src_key: &str, dst_key: &str) -> Result<()> {
        let src = self.blob_path(src_key)?;
        let dst = self.blob_path(dst_key)?;
        if let Some(parent) = dst.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| Error::Blob(format!("create {}: {}", parent.display(), e)))?;
        }
        std::fs::copy(&src, &dst)
            .map_err(|e| Error::Blob(format!("copy {} -> {}: {}", src.display(), dst.display(), e)))?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let path = self.blob_path(key)?;
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::Blob(format!("delete {}: {}", path.display(), e))),
        }
    }
}
