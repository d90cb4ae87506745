//! `stax clean` -- registry maintenance.

use crate::paths::StaxPaths;
use crate::registry::Registry;
use crate::ui::{ConsoleOutput, OutputSink};
use anyhow::Result;
use clap::Args;
use std::path::Path;

/// Remove registry entries whose installed files are all gone, or forget
/// a specific stack.
#[derive(Debug, Args)]
pub struct CleanCommand {
    /// Drop this stack from the registry regardless of files on disk
    #[arg(long, value_name = "STACK_ID")]
    pub forget: Option<String>,
}

impl CleanCommand {
    pub async fn execute(self, paths: &StaxPaths, project_dir: &Path) -> Result<()> {
        let output = ConsoleOutput;
        let mut registry = Registry::load(&paths.registry_path(project_dir));

        if let Some(stack_id) = self.forget {
            match registry.unregister(&stack_id) {
                Some(entry) => {
                    registry.save()?;
                    output.success(&format!("Forgot stack '{}'", entry.name));
                }
                None => output.warning(&format!("Stack '{stack_id}' is not registered")),
            }
            return Ok(());
        }

        let removed = registry.cleanup()?;
        if removed.is_empty() {
            output.info("Registry is clean; nothing to remove");
        } else {
            for stack_id in &removed {
                output.meta(&format!("Removed stale entry: {stack_id}"));
            }
            let noun = if removed.len() == 1 { "entry" } else { "entries" };
            output.success(&format!("Removed {} stale registry {noun}", removed.len()));
        }
        Ok(())
    }
}
