//! `stax list` -- show stacks installed in this project.

use crate::paths::StaxPaths;
use crate::registry::Registry;
use crate::ui::{ConsoleOutput, OutputSink};
use anyhow::Result;
use clap::Args;
use std::path::Path;

/// List the stacks recorded in this project's registry.
#[derive(Debug, Args)]
pub struct ListCommand {
    /// Show per-category component counts
    #[arg(long)]
    pub details: bool,
}

impl ListCommand {
    pub async fn execute(self, paths: &StaxPaths, project_dir: &Path) -> Result<()> {
        let output = ConsoleOutput;
        let registry = Registry::load(&paths.registry_path(project_dir));

        let mut any = false;
        for entry in registry.entries() {
            any = true;
            let version = entry.version.as_deref().unwrap_or("-");
            output.log(&format!(
                "{}  v{version}  ({} components, installed {})",
                entry.name,
                entry.components.total(),
                entry.installed_at
            ));
            if self.details {
                let c = &entry.components;
                for (label, count) in [
                    ("commands", c.commands.len()),
                    ("agents", c.agents.len()),
                    ("hooks", c.hooks.len()),
                    ("mcp servers", c.mcp_servers.len()),
                    ("settings merges", c.settings.len()),
                    ("instruction files", c.claude_md.len()),
                ] {
                    if count > 0 {
                        output.meta(&format!("{label}: {count}"));
                    }
                }
            }
        }

        if !any {
            output.info("No stacks installed in this project");
        }
        Ok(())
    }
}
