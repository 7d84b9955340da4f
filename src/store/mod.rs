//! Storage adapters for AgentMesh.
//!
//! Narrow contracts over the physical stores:
//! - Key-value directory for agent records
//! - Prefix-addressed blob store for mailbox messages
//!
//! Both ship with an in-memory and a filesystem implementation. Per-key
//! operations are atomic; nothing is atomic across keys.

pub mod blob;
pub mod directory;

pub use blob::{BlobStore, FsBlobStore, MemoryBlobStore};
pub use directory::{Directory, FsDirectory, MemoryDirectory};
