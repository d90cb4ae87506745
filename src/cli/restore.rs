//! `stax restore` -- compose a stack into the project.

use crate::hooks::ManifestLabelScanner;
use crate::installer::{RestoreOptions, StackInstaller};
use crate::manifest::{Stack, resolve_stack_path};
use crate::paths::StaxPaths;
use crate::ui::{ConsoleOutput, OutputSink};
use anyhow::Result;
use clap::Args;
use std::path::Path;

/// Restore a stack manifest into the configuration tree.
///
/// The stack reference is a bare name (looked up in `~/.claude/stacks/`),
/// a relative path, or an absolute path to a manifest file.
#[derive(Debug, Args)]
pub struct RestoreCommand {
    /// Stack to restore: bare name or path to a manifest
    pub stack: String,

    /// Replace components that already exist instead of skipping them
    #[arg(long)]
    pub overwrite: bool,

    /// Install every component globally
    #[arg(long, conflicts_with = "local_only")]
    pub global_only: bool,

    /// Install every component locally
    #[arg(long)]
    pub local_only: bool,
}

impl RestoreCommand {
    pub async fn execute(self, paths: &StaxPaths, project_dir: &Path) -> Result<()> {
        let output = ConsoleOutput;
        let scanner = ManifestLabelScanner;

        let manifest_path = resolve_stack_path(&self.stack, paths)?;
        let stack = Stack::load(&manifest_path)?;

        output.info(&format!("Restoring stack '{}'", stack.name));

        let options = RestoreOptions {
            overwrite: self.overwrite,
            global_only: self.global_only,
            local_only: self.local_only,
        };
        let installer = StackInstaller::new(paths, &output, &scanner);
        let report = installer.restore(&stack, project_dir, &options)?;

        for line in report.summary_lines() {
            output.meta(&line);
        }
        output.success(&format!("Stack '{}' restored successfully", stack.name));
        Ok(())
    }
}
