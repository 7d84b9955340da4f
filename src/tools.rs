//! Tool registry: an explicit mapping from name to descriptor and callable.
//!
//! The registry is built by the process context and injected where it is
//! needed; nothing registers tools through global state.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;
use crate::mcp::McpClient;

/// Capability descriptor for one tool.
#[derive(Debug, Clone)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
}

/// An invocable tool.
#[async_trait]
pub trait Tool: Send + Sync {
    fn descriptor(&self) -> &ToolDescriptor;

    async fn invoke(&self, parameters: Value) -> Result<Value>;
}

/// Name-keyed tool collection.
#[derive(Default, Clone)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool, replacing any existing tool with the same name.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools
            .insert(tool.descriptor().name.clone(), tool);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// Tool names, used as capability tags on the agent's card.
    pub fn names(&self) -> Vec<String> {
        self.tools.keys().cloned().collect()
    }

    pub fn descriptors(&self) -> Vec<ToolDescriptor> {
        self.tools.values().map(|t| t.descriptor().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

/// A tool served by a remote MCP server.
pub struct McpTool {
    descriptor: ToolDescriptor,
    client: Arc<McpClient>,
}

impl McpTool {
    pub fn new(
        client: Arc<McpClient>,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            descriptor: ToolDescriptor {
                name: name.into(),
                description: description.into(),
            },
            client,
        }
    }
}

#[async_trait]
impl Tool for McpTool {
    fn descriptor(&self) -> &ToolDescriptor {
        &self.descriptor
    }

    async fn invoke(&self, parameters: Value) -> Result<Value> {
        // run_tool folds failures into the result under "error".
        Ok(self.client.run_tool(&self.descriptor.name, parameters).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct UpperTool {
        descriptor: ToolDescriptor,
    }

    impl UpperTool {
        fn new() -> Self {
            Self {
                descriptor: ToolDescriptor {
                    name: "upper".to_string(),
                    description: "Uppercase the input".to_string(),
                },
            }
        }
    }

    #[async_trait]
    impl Tool for UpperTool {
        fn descriptor(&self) -> &ToolDescriptor {
            &self.descriptor
        }

        async fn invoke(&self, parameters: Value) -> Result<Value> {
            let text = parameters["text"].as_str().unwrap_or_default();
            Ok(json!({"text": text.to_uppercase()}))
        }
    }

    #[tokio::test]
    async fn test_register_and_invoke() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(UpperTool::new()));

        let tool = registry.get("upper").unwrap();
        let result = tool.invoke(json!({"text": "hello"})).await.unwrap();
        assert_eq!(result["text"], "HELLO");
    }

    #[tokio::test]
    async fn test_missing_tool_is_none() {
        let registry = ToolRegistry::new();
        assert!(registry.get("nope").is_none());
    }

    #[test]
    fn test_register_replaces_same_name() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(UpperTool::new()));
        registry.register(Arc::new(UpperTool::new()));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.names(), vec!["upper"]);
    }
}
