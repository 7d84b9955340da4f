//! Error types for AgentMesh.
#![allow(dead_code)]

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Crate-wide error type.
///
/// Absent lookups are never errors: operations that can miss return
/// `Option` inside `Ok`. `Directory` and `Blob` mean the backing store
/// itself failed, so callers can tell "unavailable" apart from "absent".
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Directory error: {0}")]
    Directory(String),

    #[error("Blob store error: {0}")]
    Blob(String),

    #[error("Mailbox error: {0}")]
    Mailbox(String),

    #[error("Tool error: {0}")]
    Tool(String),

    #[error("Invocation error: {0}")]
    Invocation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    Other(String),
}
