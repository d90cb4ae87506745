//! Command-line interface.
//!
//! A thin shell over the library: each subcommand resolves its
//! collaborators (paths, output sink, confirmer, risk scanner) and
//! delegates to the corresponding engine. Commands operate on the project
//! given by `--project-dir`, defaulting to the current directory.

pub mod clean;
pub mod list;
pub mod restore;
pub mod sync;

use crate::paths::StaxPaths;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Top-level CLI for stax.
#[derive(Parser)]
#[command(
    name = "stax",
    about = "Portable configuration stacks for AI coding assistants",
    version,
    long_about = "stax packages a local AI-assistant configuration (commands, agents, \
                  hooks, MCP servers, settings, instruction files) into portable stack \
                  manifests, restores them without destroying existing configuration, \
                  and syncs MCP servers to Codex and Gemini."
)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose diagnostic output (equivalent to RUST_LOG=debug).
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Project directory to operate on (defaults to the current directory).
    #[arg(long, global = true)]
    project_dir: Option<PathBuf>,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Restore a stack into the current project
    Restore(restore::RestoreCommand),
    /// Sync this project's MCP servers to Codex and Gemini
    Sync(sync::SyncCommand),
    /// List stacks installed in this project
    List(list::ListCommand),
    /// Remove registry entries whose installed files are gone
    Clean(clean::CleanCommand),
}

impl Cli {
    /// Whether `--verbose` was passed, for logger setup in `main`.
    #[must_use]
    pub fn verbose(&self) -> bool {
        self.verbose
    }

    /// Execute the selected subcommand.
    pub async fn execute(self) -> Result<()> {
        let paths = StaxPaths::discover()?;
        // The canonical host configuration keys projects by absolute path.
        let project_dir = match self.project_dir {
            Some(dir) => {
                if dir.is_absolute() {
                    dir
                } else {
                    std::env::current_dir()
                        .context("Could not determine current directory")?
                        .join(dir)
                }
            }
            None => std::env::current_dir().context("Could not determine current directory")?,
        };

        match self.command {
            Commands::Restore(cmd) => cmd.execute(&paths, &project_dir).await,
            Commands::Sync(cmd) => cmd.execute(&paths, &project_dir).await,
            Commands::List(cmd) => cmd.execute(&paths, &project_dir).await,
            Commands::Clean(cmd) => cmd.execute(&paths, &project_dir).await,
        }
    }
}
