//! MCP (Model Context Protocol) server configuration.
//!
//! The canonical source of truth for a project's MCP servers is the host
//! configuration file `~/.claude.json`, which maps absolute project paths
//! to their server sets. This module owns that model plus the cross-tool
//! synchronizer projecting it into the Codex and Gemini formats.
//!
//! Foreign-owned data is preserved everywhere: unknown keys in the
//! canonical config round-trip through `serde(flatten)`, and the Codex
//! target is edited in place with `toml_edit` so user stanzas survive.

pub mod codex;
pub mod gemini;
pub mod sync;

pub use sync::{McpSyncer, SyncOptions, SyncReport, TargetStatus, TargetSummary};

use crate::utils::{read_json_or_default, write_json_file};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

/// MCP transport kind. Absent in a config means stdio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    #[default]
    Stdio,
    Http,
    Sse,
}

impl std::fmt::Display for TransportKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Stdio => write!(f, "stdio"),
            Self::Http => write!(f, "http"),
            Self::Sse => write!(f, "sse"),
        }
    }
}

/// One server entry in the canonical host configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct McpServerConfig {
    /// Transport kind; `None` means stdio.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub transport: Option<TransportKind>,

    /// Command to launch (stdio servers).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,

    /// Command arguments (stdio servers).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,

    /// Environment variables (stdio servers).
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub env: HashMap<String, Value>,

    /// Endpoint (http/sse servers).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Fields this tool does not understand, preserved verbatim.
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl McpServerConfig {
    /// Effective transport kind, defaulting to stdio.
    #[must_use]
    pub fn kind(&self) -> TransportKind {
        self.transport.unwrap_or_default()
    }

    /// Build a canonical entry from a manifest server spec.
    #[must_use]
    pub fn from_spec(spec: &crate::manifest::McpServerSpec) -> Self {
        Self {
            transport: Some(spec.transport),
            command: spec.command.clone(),
            args: spec.args.clone(),
            env: spec.env.clone(),
            url: spec.url.clone(),
            other: Map::new(),
        }
    }
}

/// Per-project section of the canonical host configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(rename = "mcpServers", default)]
    pub mcp_servers: BTreeMap<String, McpServerConfig>,

    #[serde(flatten)]
    pub other: Map<String, Value>,
}

/// The canonical host configuration (`~/.claude.json`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClaudeConfig {
    #[serde(default)]
    pub projects: BTreeMap<String, ProjectConfig>,

    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl ClaudeConfig {
    /// Load the canonical config, treating a missing or corrupt file as
    /// empty. This is a merge base: it is always rewritten in full, so a
    /// damaged file heals on the next save.
    #[must_use]
    pub fn load_or_default(path: &Path) -> Self {
        read_json_or_default(path)
    }

    /// Save atomically with pretty formatting.
    pub fn save(&self, path: &Path) -> Result<()> {
        write_json_file(path, self, true)
            .with_context(|| format!("Failed to write host configuration: {}", path.display()))
    }

    /// Server map for a project, keyed by its exact absolute path.
    #[must_use]
    pub fn project_servers(&self, project_key: &str) -> Option<&BTreeMap<String, McpServerConfig>> {
        self.projects.get(project_key).map(|p| &p.mcp_servers)
    }

    /// Mutable server map for a project, created on first use.
    pub fn project_servers_mut(
        &mut self,
        project_key: &str,
    ) -> &mut BTreeMap<String, McpServerConfig> {
        &mut self
            .projects
            .entry(project_key.to_string())
            .or_default()
            .mcp_servers
    }
}
