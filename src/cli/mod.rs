//! CLI commands for AgentMesh using clap.

use anyhow::Result;
use clap::{Parser, Subcommand};
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;

use crate::completion::EchoCompletion;
use crate::config::{load_settings_or_default, Settings};
use crate::handler::{invoke, AppContext, InvocationEvent};
use crate::mcp::McpClient;
use crate::protocol::{A2aProtocol, Mailbox, DEFAULT_RECEIVE_LIMIT};
use crate::registry::{AgentCard, AgentRegistry};
use crate::store::{FsBlobStore, FsDirectory};

/// AgentMesh - agent discovery, mailboxes, and MCP calls.
#[derive(Parser)]
#[command(name = "agentmesh")]
#[command(version = "0.1.0")]
#[command(about = "Multi-agent discovery and messaging", long_about = None)]
pub struct Commands {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Register an agent card in the directory
    Register {
        agent_id: String,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        description: Option<String>,

        #[arg(long, default_value = "1.0.0")]
        version: String,

        /// Capability tag (repeatable)
        #[arg(long = "capability")]
        capabilities: Vec<String>,
    },

    /// Look up an agent card by id
    Lookup {
        agent_id: String,
    },

    /// Find agents by capability tag
    Find {
        capability: String,
    },

    /// Send a message to an agent's mailbox
    Send {
        recipient_id: String,

        /// Message content (JSON, or a raw string)
        message: String,

        #[arg(long, default_value = "cli")]
        from: String,

        #[arg(long)]
        correlation_id: Option<String>,
    },

    /// Receive pending messages for an agent
    Receive {
        agent_id: String,

        #[arg(long, default_value_t = DEFAULT_RECEIVE_LIMIT)]
        limit: usize,
    },

    /// Run one invocation from a JSON event file
    Invoke {
        event: PathBuf,
    },

    /// Call an operation on an MCP server
    Call {
        url: String,
        operation: String,

        /// JSON parameters for the operation
        #[arg(long)]
        parameters: Option<String>,

        #[arg(long, env = "AGENTMESH_MCP_TOKEN")]
        token: Option<String>,
    },
}

impl Commands {
    pub async fn run(&self) -> Result<()> {
        match &self.command {
            Command::Register {
                agent_id,
                name,
                description,
                version,
                capabilities,
            } => cmd_register(agent_id, name.as_deref(), description.as_deref(), version, capabilities).await,
            Command::Lookup { agent_id } => cmd_lookup(agent_id).await,
            Command::Find { capability } => cmd_find(capability).await,
            Command::Send {
                recipient_id,
                message,
                from,
                correlation_id,
            } => cmd_send(recipient_id, message, from, correlation_id.clone()).await,
            Command::Receive { agent_id, limit } => cmd_receive(agent_id, *limit).await,
            Command::Invoke { event } => cmd_invoke(event).await,
            Command::Call {
                url,
                operation,
                parameters,
                token,
            } => cmd_call(url, operation, parameters.as_deref(), token.clone()).await,
        }
    }
}

// Command implementations

fn open_registry(settings: &Settings) -> Result<AgentRegistry> {
    let directory = FsDirectory::new(settings.registry_dir()?)?;
    Ok(AgentRegistry::new(Arc::new(directory)))
}

fn open_mailbox(settings: &Settings) -> Result<Mailbox> {
    let blobs = FsBlobStore::new(settings.mailbox_dir()?)?;
    Ok(Mailbox::new(Arc::new(blobs)))
}

/// Parse content as JSON, falling back to a plain string payload.
fn parse_content(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

async fn cmd_register(
    agent_id: &str,
    name: Option<&str>,
    description: Option<&str>,
    version: &str,
    capabilities: &[String],
) -> Result<()> {
    let settings = load_settings_or_default();
    let registry = open_registry(&settings)?;

    let card = AgentCard::new(agent_id, name.unwrap_or(agent_id))
        .with_description(description.unwrap_or_default())
        .with_version(version)
        .with_capabilities(capabilities.to_vec());

    if registry.register(&card).await {
        println!("Registered {}", agent_id);
    } else {
        anyhow::bail!("Registration failed for {}", agent_id);
    }
    Ok(())
}

async fn cmd_lookup(agent_id: &str) -> Result<()> {
    let settings = load_settings_or_default();
    let registry = open_registry(&settings)?;

    match registry.lookup(agent_id).await? {
        Some(card) => println!("{}", serde_json::to_string_pretty(&card)?),
        None => println!("Agent {} is not registered", agent_id),
    }
    Ok(())
}

async fn cmd_find(capability: &str) -> Result<()> {
    let settings = load_settings_or_default();
    let registry = open_registry(&settings)?;

    let cards = registry.find_by_capability(capability).await?;
    if cards.is_empty() {
        println!("No agents with capability '{}'", capability);
        return Ok(());
    }
    for card in cards {
        println!("{}  [{}]", card.agent_id, card.capabilities.join(", "));
    }
    Ok(())
}

async fn cmd_send(
    recipient_id: &str,
    message: &str,
    from: &str,
    correlation_id: Option<String>,
) -> Result<()> {
    let settings = load_settings_or_default();
    let registry = open_registry(&settings)?;
    let mailbox = open_mailbox(&settings)?;

    let engine = A2aProtocol::new(from, mailbox, registry);
    let message_id = engine
        .send(recipient_id, parse_content(message), correlation_id)
        .await?;

    println!("{}", message_id);
    Ok(())
}

async fn cmd_receive(agent_id: &str, limit: usize) -> Result<()> {
    let settings = load_settings_or_default();
    let registry = open_registry(&settings)?;
    let mailbox = open_mailbox(&settings)?;

    let engine = A2aProtocol::new(agent_id, mailbox, registry);
    let messages = engine.receive(limit).await?;

    println!("{}", serde_json::to_string_pretty(&messages)?);
    Ok(())
}

async fn cmd_invoke(event_path: &PathBuf) -> Result<()> {
    let settings = load_settings_or_default();
    let content = std::fs::read_to_string(event_path)?;
    let event: InvocationEvent = serde_json::from_str(&content)?;

    let directory = FsDirectory::new(settings.registry_dir()?)?;
    let blobs = FsBlobStore::new(settings.mailbox_dir()?)?;
    let ctx = AppContext::new(
        settings,
        Arc::new(directory),
        Arc::new(blobs),
        Arc::new(EchoCompletion),
    );

    let outcome = invoke(&ctx, event).await;
    println!("{}", serde_json::to_string_pretty(&outcome)?);
    Ok(())
}

async fn cmd_call(
    url: &str,
    operation: &str,
    parameters: Option<&str>,
    token: Option<String>,
) -> Result<()> {
    let parameters = match parameters {
        Some(raw) => serde_json::from_str(raw)?,
        None => serde_json::json!({}),
    };

    let client = McpClient::new(url, token);
    let response = client
        .call(operation, serde_json::json!({}), parameters)
        .await?;

    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}
