//! MCP client over HTTP.
#![allow(dead_code)]

use std::time::Duration;

use reqwest::Client;
use serde_json::{json, Value};
use thiserror::Error;

use super::retry::RetryPolicy;
use super::types::{McpRequest, McpResponse};

/// Default per-attempt request timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Transport-level failure on the MCP call path.
///
/// Connection errors, timeouts, and non-2xx statuses all land here and
/// are subject to retry. A well-formed response whose `status` reports an
/// application-level error is not an `McpError`; it is returned as data.
#[derive(Error, Debug)]
pub enum McpError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Client for one MCP server endpoint.
pub struct McpClient {
    client: Client,
    base_url: String,
    auth_token: Option<String>,
    retry: RetryPolicy,
    request_timeout: Duration,
}

impl McpClient {
    /// Create a client bound to a base endpoint and optional bearer token.
    pub fn new(base_url: impl Into<String>, auth_token: Option<String>) -> Self {
        Self::with_policy(base_url, auth_token, RetryPolicy::default())
    }

    /// Create a client with an explicit retry policy.
    pub fn with_policy(
        base_url: impl Into<String>,
        auth_token: Option<String>,
        retry: RetryPolicy,
    ) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client: Client::new(),
            base_url,
            auth_token,
            retry,
            request_timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Set the per-attempt request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Call a server operation.
    ///
    /// One POST to `{base}/invoke` per attempt, with a fresh `request_id`
    /// each attempt. Transport failures retry under the client's policy
    /// and the last one surfaces; an error `status` in a well-formed
    /// response returns normally.
    pub async fn call(
        &self,
        operation: &str,
        context: Value,
        parameters: Value,
    ) -> Result<McpResponse, McpError> {
        let url = format!("{}/invoke", self.base_url);

        self.retry
            .run(|_attempt| {
                let url = &url;
                let context = context.clone();
                let parameters = parameters.clone();
                async move {
                    let request = McpRequest::new(operation, context, parameters);

                    let mut call = self
                        .client
                        .post(url)
                        .timeout(self.request_timeout)
                        .json(&request);
                    if let Some(token) = &self.auth_token {
                        call = call.bearer_auth(token);
                    }

                    let response = call.send().await?.error_for_status()?;
                    let mut response: McpResponse = response.json().await?;
                    if response.request_id.is_empty() {
                        response.request_id = request.request_id;
                    }
                    Ok(response)
                }
            })
            .await
    }

    /// Get the server's capability tags.
    ///
    /// Lossy convenience: any non-success, including a transport failure
    /// after retries, yields an empty list instead of an error.
    pub async fn get_capabilities(&self) -> Vec<String> {
        match self.call("get_capabilities", json!({}), json!({})).await {
            Ok(response) => capabilities_from(&response),
            Err(e) => {
                tracing::warn!("get_capabilities against {} failed: {}", self.base_url, e);
                Vec::new()
            }
        }
    }

    /// Expand a query into additional context.
    ///
    /// Lossy convenience: empty structure on any non-success.
    pub async fn expand_context(&self, query: &str, context: Value) -> Value {
        match self
            .call("expand_context", context, json!({"query": query}))
            .await
        {
            Ok(response) => expanded_context_from(response),
            Err(e) => {
                tracing::warn!("expand_context against {} failed: {}", self.base_url, e);
                json!({})
            }
        }
    }

    /// Run a named tool on the server.
    ///
    /// Failures come back as data under an `"error"` key so tool-calling
    /// code can inspect them without error handling.
    pub async fn run_tool(&self, tool_name: &str, parameters: Value) -> Value {
        match self
            .call(
                "run_tool",
                json!({}),
                json!({"tool_name": tool_name, "parameters": parameters}),
            )
            .await
        {
            Ok(response) => tool_result_from(response),
            Err(e) => {
                tracing::warn!("run_tool {} against {} failed: {}", tool_name, self.base_url, e);
                json!({"error": [{"message": e.to_string()}]})
            }
        }
    }
}

fn capabilities_from(response: &McpResponse) -> Vec<String> {
    if !response.success() {
        return Vec::new();
    }
    response
        .data
        .get("capabilities")
        .and_then(|v| v.as_array())
        .map(|list| {
            list.iter()
                .filter_map(|v| v.as_str().map(String::from))
                .collect()
        })
        .unwrap_or_default()
}

fn expanded_context_from(response: McpResponse) -> Value {
    if !response.success() {
        return json!({});
    }
    response
        .data
        .get("expanded_context")
        .cloned()
        .unwrap_or_else(|| json!({}))
}

fn tool_result_from(response: McpResponse) -> Value {
    if response.success() {
        response.data
    } else {
        json!({"error": response.errors})
    }
}
