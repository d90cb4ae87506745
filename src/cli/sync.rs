//! `stax sync` -- project MCP servers into the Codex and Gemini configs.

use crate::mcp::{McpSyncer, SyncOptions};
use crate::paths::StaxPaths;
use crate::ui::{ConsoleOutput, StdinConfirmer};
use anyhow::Result;
use clap::Args;
use std::path::Path;

/// Sync this project's MCP servers to other tools.
///
/// Reads the canonical server set from `~/.claude.json` and writes it to
/// `~/.codex/config.toml` (stdio servers only) and
/// `~/.gemini/settings.json` (all transports). Targets already holding
/// servers prompt before being overwritten unless `--force` or
/// `--append` is given.
#[derive(Debug, Args)]
pub struct SyncCommand {
    /// Show what would be written without touching any file
    #[arg(long)]
    pub dry_run: bool,

    /// Overwrite existing target entries without prompting
    #[arg(long)]
    pub force: bool,

    /// Merge into existing target entries without prompting
    #[arg(long)]
    pub append: bool,

    /// Sync only Codex
    #[arg(long)]
    pub codex_only: bool,

    /// Sync only Gemini
    #[arg(long)]
    pub gemini_only: bool,
}

impl SyncCommand {
    pub async fn execute(self, paths: &StaxPaths, project_dir: &Path) -> Result<()> {
        let output = ConsoleOutput;
        let confirmer = StdinConfirmer;

        let options = SyncOptions {
            dry_run: self.dry_run,
            force: self.force,
            append: self.append,
            codex_only: self.codex_only,
            gemini_only: self.gemini_only,
        };

        let syncer = McpSyncer::new(paths, &output, &confirmer);
        let report = syncer.sync(project_dir, &options)?;

        if report.succeeded() {
            Ok(())
        } else {
            anyhow::bail!("Sync failed for: {}", report.failed_targets().join(", "))
        }
    }
}
