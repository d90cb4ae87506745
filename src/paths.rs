//! Filesystem layout for stax and the tools it integrates with.
//!
//! Every path the engine touches is derived from a single [`StaxPaths`]
//! value constructed once at startup and passed into each component.
//! Nothing in this crate reads `HOME` or other environment state after
//! construction, which lets tests point the whole engine at a temporary
//! directory without mutating the process environment.
//!
//! # Layout
//!
//! Home-anchored paths:
//!
//! ```text
//! ~/.claude/              global Claude configuration directory
//! ~/.claude/stacks/       exported stack manifests (bare-name resolution)
//! ~/.claude/commands/     globally installed slash commands
//! ~/.claude/agents/       globally installed agents
//! ~/.claude/hooks/        globally installed hooks
//! ~/.claude/CLAUDE.md     global instruction file
//! ~/.claude.json          canonical host configuration (per-project MCP servers)
//! ~/.codex/config.toml    Codex sync target (TOML, stdio-only)
//! ~/.gemini/settings.json Gemini sync target (JSON, all transports)
//! ```
//!
//! Project-anchored paths hang off an explicit project directory argument,
//! never off the process working directory.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Environment variable that overrides the home directory.
///
/// Used by the integration test suite to sandbox the binary; honored by
/// [`StaxPaths::discover`] only, never read again afterwards.
pub const STAX_HOME_ENV: &str = "STAX_HOME";

/// All filesystem locations used by the engine, computed once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaxPaths {
    home: PathBuf,
}

impl StaxPaths {
    /// Build the path set from an explicit home directory.
    ///
    /// This is the constructor unit tests use with a `tempfile` root.
    #[must_use]
    pub fn from_home(home: impl Into<PathBuf>) -> Self {
        Self { home: home.into() }
    }

    /// Build the path set from the real environment: `STAX_HOME` if set,
    /// otherwise the platform home directory.
    pub fn discover() -> Result<Self> {
        if let Some(home) = std::env::var_os(STAX_HOME_ENV) {
            return Ok(Self::from_home(PathBuf::from(home)));
        }
        let home = dirs::home_dir().context("Could not determine home directory")?;
        Ok(Self::from_home(home))
    }

    /// The home directory this path set is anchored to.
    #[must_use]
    pub fn home(&self) -> &Path {
        &self.home
    }

    /// `~/.claude`, the global Claude configuration directory.
    #[must_use]
    pub fn claude_dir(&self) -> PathBuf {
        self.home.join(".claude")
    }

    /// `~/.claude/stacks`, where bare stack references are resolved.
    #[must_use]
    pub fn stacks_dir(&self) -> PathBuf {
        self.claude_dir().join("stacks")
    }

    /// `~/.claude.json`, the canonical host configuration holding the
    /// per-project MCP server maps.
    #[must_use]
    pub fn claude_config(&self) -> PathBuf {
        self.home.join(".claude.json")
    }

    /// Global directory for a component category (`commands`, `agents`, `hooks`).
    #[must_use]
    pub fn global_component_dir(&self, category: &str) -> PathBuf {
        self.claude_dir().join(category)
    }

    /// `~/.claude/CLAUDE.md`, the global instruction file.
    #[must_use]
    pub fn global_claude_md(&self) -> PathBuf {
        self.claude_dir().join("CLAUDE.md")
    }

    /// `~/.claude/settings.json`, global settings.
    #[must_use]
    pub fn global_settings(&self) -> PathBuf {
        self.claude_dir().join("settings.json")
    }

    /// `~/.codex/config.toml`, the Codex sync target.
    #[must_use]
    pub fn codex_config(&self) -> PathBuf {
        self.home.join(".codex").join("config.toml")
    }

    /// `~/.gemini/settings.json`, the Gemini sync target.
    #[must_use]
    pub fn gemini_settings(&self) -> PathBuf {
        self.home.join(".gemini").join("settings.json")
    }

    /// `<project>/.claude`, the project-local configuration directory.
    #[must_use]
    pub fn local_claude_dir(&self, project: &Path) -> PathBuf {
        project.join(".claude")
    }

    /// Project-local directory for a component category.
    #[must_use]
    pub fn local_component_dir(&self, project: &Path, category: &str) -> PathBuf {
        self.local_claude_dir(project).join(category)
    }

    /// `<project>/.claude/settings.local.json`, project settings, the
    /// merge target for a stack's settings bag.
    #[must_use]
    pub fn local_settings(&self, project: &Path) -> PathBuf {
        self.local_claude_dir(project).join("settings.local.json")
    }

    /// `<project>/CLAUDE.md`, the project instruction file.
    #[must_use]
    pub fn local_claude_md(&self, project: &Path) -> PathBuf {
        project.join("CLAUDE.md")
    }

    /// `<project>/.claude/stax-registry.json`, the per-project ledger of
    /// installed stacks.
    #[must_use]
    pub fn registry_path(&self, project: &Path) -> PathBuf {
        self.local_claude_dir(project).join("stax-registry.json")
    }

    /// Whether `path` lives under the global `.claude` directory.
    ///
    /// Components record where they were exported from; a source under
    /// the global directory means the component was a global one.
    #[must_use]
    pub fn is_global_source(&self, path: &Path) -> bool {
        path.starts_with(self.claude_dir())
    }
}
