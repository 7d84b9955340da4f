//! Invocation entry point for serverless-style execution.
//!
//! Each invocation is an independent, short-lived unit: the component
//! graph is rebuilt from the injected [`AppContext`], the agent's card is
//! registered, inbound content is delivered through the mailbox, and the
//! mailbox is drained through the completion seam within the caller's
//! time budget. Failures come back as a structured payload carrying
//! whatever telemetry was computed before the failure.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::completion::Completion;
use crate::config::Settings;
use crate::error::{Error, Result};
use crate::mcp::ClientCache;
use crate::protocol::{A2aProtocol, Mailbox, DEFAULT_RECEIVE_LIMIT};
use crate::registry::{AgentCard, AgentRegistry};
use crate::state::{AgentState, StateStore};
use crate::store::{BlobStore, Directory};
use crate::tools::{McpTool, ToolRegistry};

/// Sender identity stamped on messages delivered by the entry point.
pub const EXTERNAL_SENDER: &str = "external";

/// Slack subtracted from the time budget for replies and state save.
const BUDGET_RESERVE_MS: u64 = 500;

/// Process-scoped dependencies, constructed once and injected.
pub struct AppContext {
    pub settings: Settings,
    pub directory: Arc<dyn Directory>,
    pub blobs: Arc<dyn BlobStore>,
    pub clients: Arc<ClientCache>,
    pub completion: Arc<dyn Completion>,
    pub tools: ToolRegistry,
}

impl AppContext {
    /// Build a context with an MCP client cache sized from settings and
    /// an empty tool registry.
    pub fn new(
        settings: Settings,
        directory: Arc<dyn Directory>,
        blobs: Arc<dyn BlobStore>,
        completion: Arc<dyn Completion>,
    ) -> Self {
        let retry = crate::mcp::RetryPolicy {
            max_attempts: settings.mcp.max_attempts,
            base_delay: Duration::from_millis(settings.mcp.base_delay_ms),
            exponential: settings.mcp.exponential,
        };
        let clients = Arc::new(ClientCache::with_config(
            settings.mcp.cache_size,
            retry,
            Duration::from_secs(settings.mcp.timeout_seconds),
        ));

        Self {
            settings,
            directory,
            blobs,
            clients,
            completion,
            tools: ToolRegistry::new(),
        }
    }
}

/// Input envelope supplied by the external invoker.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct InvocationEvent {
    #[serde(default)]
    pub agent_id: String,
    /// Content delivered to the agent's mailbox before draining it.
    #[serde(default)]
    pub input: Option<Value>,
    #[serde(default)]
    pub correlation_id: Option<String>,
    /// Time budget from the invoker, in milliseconds.
    #[serde(default)]
    pub remaining_time_ms: Option<u64>,
    #[serde(default)]
    pub receive_limit: Option<usize>,
    /// Remote MCP tools exposed for this invocation.
    #[serde(default)]
    pub mcp_tools: Vec<McpToolSpec>,
}

/// Remote tool reference in an invocation event.
#[derive(Debug, Clone, Deserialize)]
pub struct McpToolSpec {
    pub url: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub auth_token: Option<String>,
}

/// Timing and counts computed during an invocation.
#[derive(Debug, Clone, Serialize)]
pub struct InvocationTelemetry {
    pub invocation_id: String,
    pub started_at: String,
    pub elapsed_ms: u64,
    pub processed: usize,
    pub replies_sent: usize,
    pub registered: bool,
}

/// One drained and completed message.
#[derive(Debug, Serialize)]
pub struct ProcessedMessage {
    pub message_id: String,
    pub sender_id: String,
    pub output: String,
}

#[derive(Debug, Serialize)]
pub struct InvocationOutput {
    pub agent_id: String,
    pub outputs: Vec<ProcessedMessage>,
    pub telemetry: InvocationTelemetry,
}

/// Structured failure payload. `detail` is present only when debug is
/// enabled in settings.
#[derive(Debug, Serialize)]
pub struct InvocationFailure {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    pub telemetry: InvocationTelemetry,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum InvocationOutcome {
    Success(InvocationOutput),
    Failure(InvocationFailure),
}

/// Run one invocation. Never panics out: every failure is folded into a
/// structured payload with the telemetry computed so far.
pub async fn invoke(ctx: &AppContext, event: InvocationEvent) -> InvocationOutcome {
    let started = Instant::now();
    let mut telemetry = InvocationTelemetry {
        invocation_id: ulid::Ulid::new().to_string(),
        started_at: chrono::Utc::now().to_rfc3339(),
        elapsed_ms: 0,
        processed: 0,
        replies_sent: 0,
        registered: false,
    };

    let agent_id = event.agent_id.clone();
    match run_invocation(ctx, &event, &mut telemetry).await {
        Ok(outputs) => {
            telemetry.elapsed_ms = started.elapsed().as_millis() as u64;
            tracing::info!(
                "Invocation {} for {} processed {} message(s) in {}ms",
                telemetry.invocation_id,
                agent_id,
                telemetry.processed,
                telemetry.elapsed_ms
            );
            InvocationOutcome::Success(InvocationOutput {
                agent_id,
                outputs,
                telemetry,
            })
        }
        Err(e) => {
            telemetry.elapsed_ms = started.elapsed().as_millis() as u64;
            tracing::error!("Invocation {} failed: {}", telemetry.invocation_id, e);
            InvocationOutcome::Failure(InvocationFailure {
                error: e.to_string(),
                detail: ctx.settings.debug.then(|| format!("{:?}", e)),
                telemetry,
            })
        }
    }
}

async fn run_invocation(
    ctx: &AppContext,
    event: &InvocationEvent,
    telemetry: &mut InvocationTelemetry,
) -> Result<Vec<ProcessedMessage>> {
    if event.agent_id.is_empty() {
        return Err(Error::Invocation("missing agent_id".to_string()));
    }

    let deadline = event
        .remaining_time_ms
        .map(|ms| Instant::now() + Duration::from_millis(ms.saturating_sub(BUDGET_RESERVE_MS)));

    let registry = AgentRegistry::new(ctx.directory.clone());
    let mailbox = Mailbox::new(ctx.blobs.clone());
    let engine = A2aProtocol::new(event.agent_id.as_str(), mailbox.clone(), registry.clone());
    let states = StateStore::new(ctx.blobs.clone());

    let mut state = states.load(&event.agent_id).await;

    // Per-invocation tool set: the injected base plus remote MCP tools
    // named in the event, served by cached clients.
    let mut tools = ctx.tools.clone();
    for spec in &event.mcp_tools {
        let client = ctx.clients.get_or_create(&spec.url, spec.auth_token.as_deref());
        tools.register(Arc::new(McpTool::new(
            client,
            spec.name.as_str(),
            spec.description.as_str(),
        )));
    }

    // Registration failure must never block message processing.
    let card = build_card(&event.agent_id, &state, &tools, &ctx.settings);
    telemetry.registered = registry.register(&card).await;
    if !telemetry.registered {
        tracing::warn!("Proceeding unregistered: {}", event.agent_id);
    }

    // Inbound content takes the same mailbox path as peer traffic.
    if let Some(input) = &event.input {
        let external = A2aProtocol::new(EXTERNAL_SENDER, mailbox.clone(), registry.clone());
        external
            .send(&event.agent_id, input.clone(), event.correlation_id.clone())
            .await?;
    }

    let limit = event.receive_limit.unwrap_or(DEFAULT_RECEIVE_LIMIT);
    let messages = engine.receive(limit).await?;

    let mut outputs = Vec::new();
    for message in messages {
        if let Some(deadline) = deadline {
            if Instant::now() >= deadline {
                // Already marked processed; dropping is the documented
                // consumer-side loss under budget pressure.
                tracing::warn!(
                    "Time budget exhausted; dropping message {}",
                    message.message_id
                );
                continue;
            }
        }

        let prompt = prompt_from(&message.content);
        let context = json!({"history": state.history, "metadata": state.metadata});
        let output = ctx
            .completion
            .complete(&prompt, &context)
            .await
            .map_err(|e| Error::Invocation(format!("completion failed: {}", e)))?;

        state.push_turn("user", prompt);
        state.push_turn("agent", output.clone());

        // Reply to peer senders, correlated to the inbound request.
        if message.sender_id != EXTERNAL_SENDER && message.sender_id != event.agent_id {
            let correlation = message
                .correlation_id
                .clone()
                .unwrap_or_else(|| message.message_id.clone());
            engine
                .send(&message.sender_id, json!({"output": output}), Some(correlation))
                .await?;
            telemetry.replies_sent += 1;
        }

        outputs.push(ProcessedMessage {
            message_id: message.message_id,
            sender_id: message.sender_id,
            output,
        });
        telemetry.processed += 1;
    }

    states.save(&event.agent_id, &state).await;
    Ok(outputs)
}

fn build_card(
    agent_id: &str,
    state: &AgentState,
    tools: &ToolRegistry,
    settings: &Settings,
) -> AgentCard {
    let name = state
        .name
        .clone()
        .or_else(|| settings.agent.name.clone())
        .unwrap_or_else(|| format!("Agent-{}", agent_id));
    let description = state
        .description
        .clone()
        .or_else(|| settings.agent.description.clone())
        .unwrap_or_else(|| "An AgentMesh agent".to_string());
    let version = state
        .version
        .clone()
        .or_else(|| settings.agent.version.clone())
        .unwrap_or_else(|| "1.0.0".to_string());

    let mut capabilities = settings.agent.capabilities.clone();
    capabilities.extend(tools.names());
    capabilities.sort();
    capabilities.dedup();

    AgentCard::new(agent_id, name)
        .with_description(description)
        .with_version(version)
        .with_capabilities(capabilities)
}

fn prompt_from(content: &Value) -> String {
    match content {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::completion::EchoCompletion;
    use crate::store::{MemoryBlobStore, MemoryDirectory};
    use async_trait::async_trait;

    fn context() -> AppContext {
        AppContext::new(
            Settings::default(),
            Arc::new(MemoryDirectory::new()),
            Arc::new(MemoryBlobStore::new()),
            Arc::new(EchoCompletion),
        )
    }

    fn event(agent_id: &str, input: Value) -> InvocationEvent {
        InvocationEvent {
            agent_id: agent_id.to_string(),
            input: Some(input),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_invoke_processes_input() {
        let ctx = context();
        let outcome = invoke(&ctx, event("agent-a", json!("summarize this"))).await;

        let InvocationOutcome::Success(output) = outcome else {
            panic!("expected success");
        };
        assert_eq!(output.outputs.len(), 1);
        assert_eq!(output.outputs[0].output, "summarize this");
        assert_eq!(output.outputs[0].sender_id, EXTERNAL_SENDER);
        assert!(output.telemetry.registered);
        assert_eq!(output.telemetry.processed, 1);
    }

    #[tokio::test]
    async fn test_invoke_registers_card() {
        let ctx = context();
        invoke(&ctx, event("agent-a", json!("hello"))).await;

        let registry = AgentRegistry::new(ctx.directory.clone());
        let card = registry.lookup("agent-a").await.unwrap().unwrap();
        assert_eq!(card.agent_id, "agent-a");
        assert_eq!(card.name, "Agent-agent-a");
    }

    #[tokio::test]
    async fn test_second_invoke_finds_mailbox_empty() {
        let ctx = context();
        invoke(&ctx, event("agent-a", json!("hello"))).await;

        let outcome = invoke(
            &ctx,
            InvocationEvent {
                agent_id: "agent-a".to_string(),
                ..Default::default()
            },
        )
        .await;

        let InvocationOutcome::Success(output) = outcome else {
            panic!("expected success");
        };
        assert!(output.outputs.is_empty());
    }

    #[tokio::test]
    async fn test_reply_sent_to_peer_sender() {
        let ctx = context();

        // A peer deposits a request into agent-a's mailbox.
        let registry = AgentRegistry::new(ctx.directory.clone());
        let mailbox = Mailbox::new(ctx.blobs.clone());
        let peer = A2aProtocol::new("agent-b", mailbox.clone(), registry.clone());
        let request_id = peer
            .send("agent-a", json!("do something"), None)
            .await
            .unwrap();

        let outcome = invoke(
            &ctx,
            InvocationEvent {
                agent_id: "agent-a".to_string(),
                ..Default::default()
            },
        )
        .await;

        let InvocationOutcome::Success(output) = outcome else {
            panic!("expected success");
        };
        assert_eq!(output.telemetry.replies_sent, 1);

        // The reply landed in agent-b's mailbox, correlated to the request.
        let replies = peer.receive(DEFAULT_RECEIVE_LIMIT).await.unwrap();
        assert_eq!(replies.len(), 1);
        assert_eq!(replies[0].sender_id, "agent-a");
        assert_eq!(replies[0].correlation_id.as_deref(), Some(request_id.as_str()));
        assert_eq!(replies[0].content["output"], "do something");
    }

    #[tokio::test]
    async fn test_missing_agent_id_is_structured_failure() {
        let ctx = context();
        let outcome = invoke(&ctx, InvocationEvent::default()).await;

        let InvocationOutcome::Failure(failure) = outcome else {
            panic!("expected failure");
        };
        assert!(failure.error.contains("agent_id"));
        assert!(failure.detail.is_none());
        assert!(!failure.telemetry.invocation_id.is_empty());
    }

    #[tokio::test]
    async fn test_debug_failure_carries_detail() {
        let mut ctx = context();
        ctx.settings.debug = true;

        let outcome = invoke(&ctx, InvocationEvent::default()).await;
        let InvocationOutcome::Failure(failure) = outcome else {
            panic!("expected failure");
        };
        assert!(failure.detail.is_some());
    }

    struct FailingDirectory;

    #[async_trait]
    impl crate::store::Directory for FailingDirectory {
        async fn put(&self, _item: Value) -> crate::error::Result<()> {
            Err(Error::Directory("directory offline".to_string()))
        }

        async fn get(&self, _agent_id: &str) -> crate::error::Result<Option<Value>> {
            Err(Error::Directory("directory offline".to_string()))
        }

        async fn query_contains(
            &self,
            _field: &str,
            _needle: &str,
        ) -> crate::error::Result<Vec<Value>> {
            Err(Error::Directory("directory offline".to_string()))
        }
    }

    #[tokio::test]
    async fn test_registration_outage_does_not_block_processing() {
        let ctx = AppContext::new(
            Settings::default(),
            Arc::new(FailingDirectory),
            Arc::new(MemoryBlobStore::new()),
            Arc::new(EchoCompletion),
        );

        let outcome = invoke(&ctx, event("agent-a", json!("still works"))).await;
        let InvocationOutcome::Success(output) = outcome else {
            panic!("expected success");
        };
        assert!(!output.telemetry.registered);
        assert_eq!(output.telemetry.processed, 1);
        assert_eq!(output.outputs[0].output, "still works");
    }

    #[tokio::test]
    async fn test_receive_limit_bounds_batch() {
        let ctx = context();
        let registry = AgentRegistry::new(ctx.directory.clone());
        let mailbox = Mailbox::new(ctx.blobs.clone());
        let peer = A2aProtocol::new("agent-b", mailbox, registry);
        for n in 0..5 {
            peer.send("agent-a", json!({"n": n}), None).await.unwrap();
        }

        let outcome = invoke(
            &ctx,
            InvocationEvent {
                agent_id: "agent-a".to_string(),
                receive_limit: Some(3),
                ..Default::default()
            },
        )
        .await;

        let InvocationOutcome::Success(output) = outcome else {
            panic!("expected success");
        };
        assert_eq!(output.telemetry.processed, 3);
    }

    #[tokio::test]
    async fn test_state_accumulates_history() {
        let ctx = context();
        invoke(&ctx, event("agent-a", json!("one"))).await;
        invoke(&ctx, event("agent-a", json!("two"))).await;

        let states = StateStore::new(ctx.blobs.clone());
        let state = states.load("agent-a").await;
        // Two invocations, each a user and an agent turn.
        assert_eq!(state.history.len(), 4);
    }
}
