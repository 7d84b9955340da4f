//! Reasoning engine seam.
//!
//! The engine that turns message content into a response lives outside
//! this crate; components depend only on this trait.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CompletionError {
    #[error("Completion backend unavailable: {0}")]
    Unavailable(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, CompletionError>;

/// A completion backend.
#[async_trait]
pub trait Completion: Send + Sync {
    /// Backend name.
    fn name(&self) -> &str;

    /// Complete a prompt given structured context.
    async fn complete(&self, prompt: &str, context: &Value) -> Result<String>;
}

/// Loopback backend: returns the prompt unchanged. Used for local
/// operation and tests where no real engine is wired in.
#[derive(Debug, Default, Clone)]
pub struct EchoCompletion;

#[async_trait]
impl Completion for EchoCompletion {
    fn name(&self) -> &str {
        "echo"
    }

    async fn complete(&self, prompt: &str, _context: &Value) -> Result<String> {
        Ok(prompt.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_echo_completion() {
        let backend = EchoCompletion;
        let output = backend.complete("hello", &json!({})).await.unwrap();
        assert_eq!(output, "hello");
        assert_eq!(backend.name(), "echo");
    }
}
