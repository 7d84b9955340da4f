//! Configuration loading for AgentMesh.
#![allow(dead_code)]

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::Error;
pub type Result<T> = std::result::Result<T, Error>;

/// Get the AgentMesh home directory (~/.agentmesh).
pub fn get_home_dir() -> Result<PathBuf> {
    let home = directories::UserDirs::new()
        .ok_or_else(|| Error::Config("Could not determine home directory".to_string()))?;

    Ok(home.home_dir().join(".agentmesh"))
}

/// Get the settings file path.
pub fn get_settings_path() -> Result<PathBuf> {
    Ok(get_home_dir()?.join("settings.json"))
}

/// Load settings from ~/.agentmesh/settings.json
pub fn load_settings() -> Result<Settings> {
    let path = get_settings_path()?;

    if !path.exists() {
        return Err(Error::Config(format!(
            "Settings file not found at {}",
            path.display()
        )));
    }

    let content = std::fs::read_to_string(&path)?;
    let settings: Settings = serde_json::from_str(&content)?;

    validate_settings(&settings)?;

    tracing::debug!("Loaded settings from {}", path.display());
    Ok(settings)
}

fn validate_settings(settings: &Settings) -> Result<()> {
    if settings.mcp.max_attempts == 0 {
        return Err(Error::Config(
            "mcp.max_attempts must be at least 1".to_string(),
        ));
    }
    if settings.mcp.cache_size == 0 {
        return Err(Error::Config("mcp.cache_size must be at least 1".to_string()));
    }
    if settings.mcp.timeout_seconds == 0 {
        return Err(Error::Config(
            "mcp.timeout_seconds must be at least 1".to_string(),
        ));
    }
    Ok(())
}

/// Load settings or return default if not found.
pub fn load_settings_or_default() -> Settings {
    load_settings().unwrap_or_else(|e| {
        tracing::warn!("Failed to load settings: {}, using defaults", e);
        Settings::default()
    })
}

/// Local agent identity configuration.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct AgentSettings {
    pub agent_id: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub version: Option<String>,
    #[serde(default)]
    pub capabilities: Vec<String>,
}

/// Registry directory configuration.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct RegistrySettings {
    /// Data directory for the filesystem-backed directory adapter.
    pub data_dir: Option<PathBuf>,
}

/// Mailbox store configuration.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct MailboxSettings {
    /// Data directory for the filesystem-backed blob adapter.
    pub data_dir: Option<PathBuf>,
}

/// MCP client configuration.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct McpSettings {
    /// Per-attempt request timeout in seconds.
    #[serde(default = "default_mcp_timeout_seconds")]
    pub timeout_seconds: u64,

    /// Total attempt budget for transport failures.
    #[serde(default = "default_mcp_max_attempts")]
    pub max_attempts: u32,

    /// Base inter-attempt delay in milliseconds.
    #[serde(default = "default_mcp_base_delay_ms")]
    pub base_delay_ms: u64,

    /// Double the delay after each retry.
    #[serde(default = "default_mcp_exponential")]
    pub exponential: bool,

    /// Maximum cached client instances.
    #[serde(default = "default_mcp_cache_size")]
    pub cache_size: usize,
}

fn default_mcp_timeout_seconds() -> u64 {
    30
}

fn default_mcp_max_attempts() -> u32 {
    3
}

fn default_mcp_base_delay_ms() -> u64 {
    100
}

fn default_mcp_exponential() -> bool {
    true
}

fn default_mcp_cache_size() -> usize {
    32
}

impl Default for McpSettings {
    fn default() -> Self {
        Self {
            timeout_seconds: default_mcp_timeout_seconds(),
            max_attempts: default_mcp_max_attempts(),
            base_delay_ms: default_mcp_base_delay_ms(),
            exponential: default_mcp_exponential(),
            cache_size: default_mcp_cache_size(),
        }
    }
}

/// AgentMesh settings.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct Settings {
    #[serde(default)]
    pub agent: AgentSettings,

    #[serde(default)]
    pub registry: RegistrySettings,

    #[serde(default)]
    pub mailbox: MailboxSettings,

    #[serde(default)]
    pub mcp: McpSettings,

    /// Include diagnostic detail in invocation failure payloads.
    #[serde(default)]
    pub debug: bool,
}

impl Settings {
    /// Resolve the registry data directory.
    pub fn registry_dir(&self) -> Result<PathBuf> {
        match &self.registry.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => Ok(get_home_dir()?.join("registry")),
        }
    }

    /// Resolve the mailbox data directory.
    pub fn mailbox_dir(&self) -> Result<PathBuf> {
        match &self.mailbox.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => Ok(get_home_dir()?.join("mailboxes")),
        }
    }
}
