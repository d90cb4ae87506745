//! Gemini sync target: `~/.gemini/settings.json`.
//!
//! Gemini keeps MCP servers in a flat `mcpServers` map inside its settings
//! file and supports every transport kind, so nothing is dropped during
//! projection. Settings keys outside `mcpServers` belong to Gemini and are
//! carried through untouched via `serde(flatten)`.

use crate::mcp::{McpServerConfig, TransportKind};
use crate::utils::{read_json_or_default, write_json_file};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

/// One server entry in Gemini's settings format.
///
/// Unlike the canonical config, the transport `type` is always written
/// out, including the stdio default.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GeminiServer {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,

    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub env: HashMap<String, Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(rename = "type")]
    pub transport: TransportKind,
}

impl From<&McpServerConfig> for GeminiServer {
    fn from(server: &McpServerConfig) -> Self {
        Self {
            command: server.command.clone(),
            args: server.args.clone(),
            env: server.env.clone(),
            url: server.url.clone(),
            transport: server.kind(),
        }
    }
}

/// The Gemini settings document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeminiSettings {
    #[serde(rename = "mcpServers", default)]
    pub mcp_servers: BTreeMap<String, GeminiServer>,

    /// Gemini-owned settings, preserved verbatim.
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl GeminiSettings {
    /// Load the settings, treating a missing or corrupt file as empty.
    #[must_use]
    pub fn load_or_default(path: &Path) -> Self {
        read_json_or_default(path)
    }

    /// Save atomically with pretty formatting.
    pub fn save(&self, path: &Path) -> Result<()> {
        write_json_file(path, self, true)
            .with_context(|| format!("Failed to write Gemini settings: {}", path.display()))
    }

    /// Project `servers` into this document.
    ///
    /// With `replace` the server map is rebuilt from the incoming set;
    /// otherwise incoming entries are appended, winning on name
    /// collision. Returns the number of entries written.
    pub fn project_servers(
        &mut self,
        servers: &BTreeMap<String, McpServerConfig>,
        replace: bool,
    ) -> usize {
        if replace {
            self.mcp_servers.clear();
        }
        for (name, server) in servers {
            self.mcp_servers.insert(name.clone(), GeminiServer::from(server));
        }
        servers.len()
    }
}
