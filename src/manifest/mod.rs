//! Stack manifest model and loading.
//!
//! A *stack* is the portable JSON document describing an exported
//! assistant configuration: slash commands, agents, hooks, MCP server
//! definitions, a settings bag, and optional instruction files. Manifests
//! are read-only once loaded; the installer never writes back into the
//! document it was given.
//!
//! # Manifest format
//!
//! ```json
//! {
//!   "name": "web-dev",
//!   "description": "Frontend tooling stack",
//!   "version": "1.2.0",
//!   "commands": [{"name": "deploy", "path": "...", "content": "..."}],
//!   "agents": [],
//!   "hooks": [{"name": "fmt", "event": "PostToolUse", "content": "..."}],
//!   "mcpServers": [{"name": "fs", "type": "stdio", "command": "npx"}],
//!   "settings": {"permissions": {"allow": ["Bash(npm:*)"]}},
//!   "claudeMd": {"local": {"path": "CLAUDE.md", "content": "..."}},
//!   "metadata": {"createdAt": "2026-01-10T12:00:00Z"}
//! }
//! ```

mod resolver;

pub use resolver::resolve_stack_path;

use crate::mcp::TransportKind;
use crate::utils::{read_json_file, write_json_file};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// A portable stack manifest.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stack {
    /// Stack name; doubles as the registry `stackId` for local stacks.
    pub name: String,

    /// Human-readable description.
    #[serde(default)]
    pub description: String,

    /// Optional semantic version of the stack itself.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// Slash commands.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub commands: Vec<Component>,

    /// Specialized agents.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub agents: Vec<Component>,

    /// Lifecycle hooks.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub hooks: Vec<HookComponent>,

    /// MCP tool-server definitions.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mcp_servers: Vec<McpServerSpec>,

    /// Arbitrary settings bag merged into the project settings file.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub settings: Map<String, Value>,

    /// Optional global/local instruction files.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub claude_md: Option<ClaudeMdPair>,

    /// Provenance metadata.
    #[serde(default)]
    pub metadata: StackMetadata,
}

impl Stack {
    /// Load a manifest from disk.
    ///
    /// Strict: a stack the user explicitly named must fail loudly on
    /// malformed JSON, not degrade to an empty document.
    pub fn load(path: &Path) -> Result<Self> {
        read_json_file(path)
            .with_context(|| format!("Failed to load stack manifest: {}", path.display()))
    }

    /// Save a manifest atomically with pretty formatting.
    pub fn save(&self, path: &Path) -> Result<()> {
        write_json_file(path, self, true)
            .with_context(|| format!("Failed to save stack manifest: {}", path.display()))
    }

    /// Whether the stack carries no installable components at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
            && self.agents.is_empty()
            && self.hooks.is_empty()
            && self.mcp_servers.is_empty()
            && self.settings.is_empty()
            && self.claude_md.is_none()
    }
}

/// A named, file-backed component (command or agent).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Component {
    /// Component name, possibly carrying a ` (local)`/` (global)`
    /// disambiguation suffix from export time.
    pub name: String,

    /// Where the component was exported from; encodes its scope.
    pub path: PathBuf,

    /// Full file content.
    pub content: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A hook component: a plain component plus lifecycle metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HookComponent {
    pub name: String,
    pub path: PathBuf,
    pub content: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Lifecycle event the hook fires on (e.g. `PreToolUse`).
    pub event: String,

    /// Optional matcher pattern restricting which tool calls trigger it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matcher: Option<String>,

    /// Risk label attached by the external scanner at export time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk_level: Option<String>,
}

/// An MCP server definition inside a manifest.
///
/// Exactly one transport field group is meaningful, selected by `type`:
/// `command`/`args`/`env` for stdio, `url` for http and sse.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct McpServerSpec {
    pub name: String,

    /// Transport kind; absent means stdio.
    #[serde(rename = "type", default)]
    pub transport: TransportKind,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,

    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub env: HashMap<String, Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Optional instruction-file pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaudeMdPair {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub global: Option<InstructionFile>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub local: Option<InstructionFile>,
}

/// One instruction file captured in a manifest.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstructionFile {
    pub path: PathBuf,
    pub content: String,
}

/// Provenance metadata carried along with a stack.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StackMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub installed_at: Option<String>,

    /// Where the stack came from ("local-export", a marketplace id, ...).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub install_source: Option<String>,
}
