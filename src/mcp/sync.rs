//! Cross-tool MCP synchronizer.
//!
//! Projects the current project's canonical server set into the Codex and
//! Gemini configuration formats. The two targets are fully independent:
//! each one's outcome is an explicit `Result`, collected into a
//! [`SyncReport`], so a failure writing one file never prevents the other
//! from being attempted. Only the final report decides whether the
//! command as a whole succeeded.

use crate::core::StaxError;
use crate::mcp::gemini::GeminiSettings;
use crate::mcp::{ClaudeConfig, McpServerConfig, codex};
use crate::paths::StaxPaths;
use crate::ui::{Confirmer, OutputSink};
use crate::utils::safe_write;
use anyhow::Result;
use std::collections::BTreeMap;
use std::path::Path;
use toml_edit::DocumentMut;

/// Flags accepted by the sync entry point.
#[derive(Debug, Clone, Copy, Default)]
pub struct SyncOptions {
    /// Print decisions without writing anything.
    pub dry_run: bool,
    /// Merge and write without prompting.
    pub force: bool,
    /// Merge incoming entries into existing ones (new wins on collision).
    pub append: bool,
    /// Sync only the Codex target.
    pub codex_only: bool,
    /// Sync only the Gemini target. Mutually exclusive with `codex_only`.
    pub gemini_only: bool,
}

/// The two foreign configurations we project into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncTarget {
    Codex,
    Gemini,
}

impl SyncTarget {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Codex => "Codex",
            Self::Gemini => "Gemini",
        }
    }
}

/// What happened to one target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetStatus {
    /// Servers were written to the target file.
    Written(usize),
    /// The user declined the overwrite prompt; file untouched.
    Skipped,
    /// Dry run: this many servers would have been written.
    WouldWrite(usize),
}

/// Per-target summary of a successful (non-erroring) sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetSummary {
    pub target: SyncTarget,
    pub status: TargetStatus,
}

/// Aggregated outcome of one sync run.
#[derive(Debug, Default)]
pub struct SyncReport {
    pub outcomes: Vec<Result<TargetSummary, StaxError>>,
}

impl SyncReport {
    /// True when no target failed. Declined prompts are not failures.
    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.outcomes.iter().all(Result::is_ok)
    }

    /// Names of the targets that failed.
    #[must_use]
    pub fn failed_targets(&self) -> Vec<String> {
        self.outcomes
            .iter()
            .filter_map(|o| o.as_ref().err())
            .map(|e| match e {
                StaxError::SyncTargetError { target, .. } => target.clone(),
                other => other.to_string(),
            })
            .collect()
    }
}

/// How a target write was decided.
enum WriteDecision {
    /// Fresh or confirmed overwrite: rebuild the managed section.
    Replace,
    /// Merge, incoming wins per name.
    Merge,
    /// User declined.
    Decline,
}

/// The synchronizer. Holds its collaborators by reference; one value per
/// run.
pub struct McpSyncer<'a> {
    paths: &'a StaxPaths,
    output: &'a dyn OutputSink,
    confirmer: &'a dyn Confirmer,
}

impl<'a> McpSyncer<'a> {
    pub fn new(
        paths: &'a StaxPaths,
        output: &'a dyn OutputSink,
        confirmer: &'a dyn Confirmer,
    ) -> Self {
        Self {
            paths,
            output,
            confirmer,
        }
    }

    /// Run one sync pass for the project at `project_dir`.
    ///
    /// Validates option compatibility before any I/O, then attempts each
    /// requested target independently. Returns `Err` only for the
    /// pre-I/O validation failure; per-target errors land in the report.
    pub fn sync(&self, project_dir: &Path, options: &SyncOptions) -> Result<SyncReport> {
        if options.codex_only && options.gemini_only {
            return Err(StaxError::MutuallyExclusiveOptions {
                first: "codex-only".into(),
                second: "gemini-only".into(),
            }
            .into());
        }

        let config = ClaudeConfig::load_or_default(&self.paths.claude_config());
        let project_key = project_dir.to_string_lossy().to_string();

        let servers = match config.project_servers(&project_key) {
            Some(servers) if !servers.is_empty() => servers.clone(),
            _ => {
                self.output
                    .info(&format!("No MCP servers found for project {project_key}"));
                return Ok(SyncReport::default());
            }
        };

        let mut report = SyncReport::default();

        if !options.gemini_only {
            let outcome = self.sync_codex(&servers, options);
            self.announce(&outcome);
            report.outcomes.push(outcome);
        }
        if !options.codex_only {
            let outcome = self.sync_gemini(&servers, options);
            self.announce(&outcome);
            report.outcomes.push(outcome);
        }

        Ok(report)
    }

    fn announce(&self, outcome: &Result<TargetSummary, StaxError>) {
        match outcome {
            Ok(summary) => match summary.status {
                TargetStatus::Written(n) => self.output.success(&format!(
                    "Synced {n} MCP server(s) to {}",
                    summary.target.name()
                )),
                TargetStatus::Skipped => self
                    .output
                    .warning(&format!("Skipped {} (declined)", summary.target.name())),
                TargetStatus::WouldWrite(n) => self.output.info(&format!(
                    "Would sync {n} MCP server(s) to {}",
                    summary.target.name()
                )),
            },
            Err(e) => self.output.error(&e.to_string()),
        }
    }

    fn decide(
        &self,
        target: SyncTarget,
        existing: usize,
        options: &SyncOptions,
    ) -> Result<WriteDecision, StaxError> {
        if existing == 0 {
            return Ok(WriteDecision::Replace);
        }
        if options.force || options.append {
            return Ok(WriteDecision::Merge);
        }
        let prompt = format!(
            "{} already has {existing} MCP server(s) configured. Overwrite?",
            target.name()
        );
        let accepted = self
            .confirmer
            .confirm(&prompt)
            .map_err(|e| target_error(target, &e.to_string()))?;
        if accepted {
            Ok(WriteDecision::Replace)
        } else {
            Ok(WriteDecision::Decline)
        }
    }

    fn sync_codex(
        &self,
        servers: &BTreeMap<String, McpServerConfig>,
        options: &SyncOptions,
    ) -> Result<TargetSummary, StaxError> {
        let target = SyncTarget::Codex;
        let path = self.paths.codex_config();

        // A corrupt Codex file is a per-target failure, not an empty
        // base: rewriting it blindly would destroy user stanzas.
        let mut doc: DocumentMut = if path.exists() {
            let text = std::fs::read_to_string(&path)
                .map_err(|e| target_error(target, &format!("cannot read {}: {e}", path.display())))?;
            text.parse()
                .map_err(|e| target_error(target, &format!("invalid TOML in {}: {e}", path.display())))?
        } else {
            DocumentMut::new()
        };

        let existing = codex::server_count(&doc);

        if options.dry_run {
            let mut scratch = doc.clone();
            let projection = codex::project_servers(&mut scratch, servers, existing == 0);
            self.warn_skipped(projection.skipped_non_stdio);
            return Ok(TargetSummary {
                target,
                status: TargetStatus::WouldWrite(projection.written),
            });
        }

        let replace = match self.decide(target, existing, options)? {
            WriteDecision::Replace => true,
            WriteDecision::Merge => false,
            WriteDecision::Decline => {
                return Ok(TargetSummary {
                    target,
                    status: TargetStatus::Skipped,
                });
            }
        };

        let projection = codex::project_servers(&mut doc, servers, replace);
        self.warn_skipped(projection.skipped_non_stdio);

        safe_write(&path, &doc.to_string())
            .map_err(|e| target_error(target, &format!("{e:#}")))?;

        Ok(TargetSummary {
            target,
            status: TargetStatus::Written(projection.written),
        })
    }

    fn sync_gemini(
        &self,
        servers: &BTreeMap<String, McpServerConfig>,
        options: &SyncOptions,
    ) -> Result<TargetSummary, StaxError> {
        let target = SyncTarget::Gemini;
        let path = self.paths.gemini_settings();

        let mut settings = GeminiSettings::load_or_default(&path);
        let existing = settings.mcp_servers.len();

        if options.dry_run {
            return Ok(TargetSummary {
                target,
                status: TargetStatus::WouldWrite(servers.len()),
            });
        }

        let replace = match self.decide(target, existing, options)? {
            WriteDecision::Replace => true,
            WriteDecision::Merge => false,
            WriteDecision::Decline => {
                return Ok(TargetSummary {
                    target,
                    status: TargetStatus::Skipped,
                });
            }
        };

        let written = settings.project_servers(servers, replace);
        settings
            .save(&path)
            .map_err(|e| target_error(target, &format!("{e:#}")))?;

        Ok(TargetSummary {
            target,
            status: TargetStatus::Written(written),
        })
    }

    fn warn_skipped(&self, skipped: usize) {
        if skipped > 0 {
            self.output.warning(&format!(
                "Skipped {skipped} non-stdio servers (Codex only supports stdio)"
            ));
        }
    }
}

fn target_error(target: SyncTarget, reason: &str) -> StaxError {
    StaxError::SyncTargetError {
        target: target.name().to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::test_support::{RecordingOutput, ScriptedConfirmer};
    use serde_json::json;
    use tempfile::TempDir;

    struct Fixture {
        _tmp: TempDir,
        paths: StaxPaths,
        project: std::path::PathBuf,
    }

    fn fixture(servers: serde_json::Value) -> Fixture {
        let tmp = TempDir::new().unwrap();
        let paths = StaxPaths::from_home(tmp.path());
        let project = tmp.path().join("project");
        std::fs::create_dir_all(&project).unwrap();

        if !servers.is_null() {
            let config = json!({
                "projects": {
                    (project.to_string_lossy()): {"mcpServers": servers}
                }
            });
            std::fs::write(
                paths.claude_config(),
                serde_json::to_string_pretty(&config).unwrap(),
            )
            .unwrap();
        }

        Fixture {
            _tmp: tmp,
            paths,
            project,
        }
    }

    fn three_servers() -> serde_json::Value {
        json!({
            "fs": {"command": "npx", "args": ["-y", "server-fs"]},
            "api": {"type": "http", "url": "https://api.example.com/mcp"},
            "events": {"type": "sse", "url": "https://events.example.com/mcp"}
        })
    }

    #[test]
    fn exclusive_scope_flags_fail_before_any_io() {
        let fx = fixture(serde_json::Value::Null);
        let output = RecordingOutput::default();
        let confirmer = ScriptedConfirmer::new(true);
        let syncer = McpSyncer::new(&fx.paths, &output, &confirmer);

        let err = syncer
            .sync(
                &fx.project,
                &SyncOptions {
                    codex_only: true,
                    gemini_only: true,
                    ..Default::default()
                },
            )
            .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<StaxError>(),
            Some(StaxError::MutuallyExclusiveOptions { .. })
        ));
        assert!(!fx.paths.codex_config().exists());
        assert!(!fx.paths.gemini_settings().exists());
    }

    #[test]
    fn no_servers_is_a_terminal_success() {
        let fx = fixture(serde_json::Value::Null);
        let output = RecordingOutput::default();
        let confirmer = ScriptedConfirmer::new(true);
        let syncer = McpSyncer::new(&fx.paths, &output, &confirmer);

        let report = syncer.sync(&fx.project, &SyncOptions::default()).unwrap();

        assert!(report.succeeded());
        assert!(report.outcomes.is_empty());
        assert!(output.contains("No MCP servers found"));
    }

    #[test]
    fn fresh_targets_are_written_without_prompting() {
        let fx = fixture(three_servers());
        let output = RecordingOutput::default();
        let confirmer = ScriptedConfirmer::new(false);
        let syncer = McpSyncer::new(&fx.paths, &output, &confirmer);

        let report = syncer.sync(&fx.project, &SyncOptions::default()).unwrap();

        assert!(report.succeeded());
        assert_eq!(confirmer.times_asked(), 0);

        // Codex gets exactly the one stdio stanza and a skip warning.
        let codex_text = std::fs::read_to_string(fx.paths.codex_config()).unwrap();
        assert!(codex_text.contains("[mcp_servers.fs]"));
        assert!(!codex_text.contains("api"));
        assert!(output.contains("Skipped 2 non-stdio servers (Codex only supports stdio)"));

        // Gemini gets all three.
        let gemini: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(fx.paths.gemini_settings()).unwrap())
                .unwrap();
        assert_eq!(gemini["mcpServers"].as_object().unwrap().len(), 3);
    }

    #[test]
    fn declined_prompt_skips_one_target_but_not_the_other() {
        let fx = fixture(json!({"fs": {"command": "npx"}}));
        // Pre-populate only Codex so only it prompts.
        std::fs::create_dir_all(fx.paths.codex_config().parent().unwrap()).unwrap();
        std::fs::write(
            fx.paths.codex_config(),
            "[mcp_servers.old]\ncommand = \"keep\"\n",
        )
        .unwrap();

        let output = RecordingOutput::default();
        let confirmer = ScriptedConfirmer::new(false);
        let syncer = McpSyncer::new(&fx.paths, &output, &confirmer);

        let report = syncer.sync(&fx.project, &SyncOptions::default()).unwrap();

        assert!(report.succeeded());
        assert_eq!(confirmer.times_asked(), 1);

        let codex_text = std::fs::read_to_string(fx.paths.codex_config()).unwrap();
        assert!(codex_text.contains("old"));
        assert!(!codex_text.contains("[mcp_servers.fs]"));
        // Gemini was fresh and still got written.
        assert!(fx.paths.gemini_settings().exists());
    }

    #[test]
    fn force_merges_without_prompting_and_incoming_wins() {
        let fx = fixture(json!({"fs": {"command": "new"}}));
        std::fs::create_dir_all(fx.paths.codex_config().parent().unwrap()).unwrap();
        std::fs::write(
            fx.paths.codex_config(),
            "[mcp_servers.fs]\ncommand = \"old\"\n\n[mcp_servers.user]\ncommand = \"mine\"\n",
        )
        .unwrap();

        let output = RecordingOutput::default();
        let confirmer = ScriptedConfirmer::new(false);
        let syncer = McpSyncer::new(&fx.paths, &output, &confirmer);

        let report = syncer
            .sync(
                &fx.project,
                &SyncOptions {
                    force: true,
                    ..Default::default()
                },
            )
            .unwrap();

        assert!(report.succeeded());
        assert_eq!(confirmer.times_asked(), 0);

        let codex_text = std::fs::read_to_string(fx.paths.codex_config()).unwrap();
        assert!(codex_text.contains("command = \"new\""));
        assert!(codex_text.contains("[mcp_servers.user]"));
    }

    #[test]
    fn dry_run_writes_nothing() {
        let fx = fixture(three_servers());
        let output = RecordingOutput::default();
        let confirmer = ScriptedConfirmer::new(true);
        let syncer = McpSyncer::new(&fx.paths, &output, &confirmer);

        let report = syncer
            .sync(
                &fx.project,
                &SyncOptions {
                    dry_run: true,
                    ..Default::default()
                },
            )
            .unwrap();

        assert!(report.succeeded());
        assert!(!fx.paths.codex_config().exists());
        assert!(!fx.paths.gemini_settings().exists());
        assert!(output.contains("Would sync"));
    }

    #[test]
    fn one_failing_target_does_not_abort_the_other() {
        let fx = fixture(json!({"fs": {"command": "npx"}}));
        // Corrupt TOML makes the Codex target fail while Gemini proceeds.
        std::fs::create_dir_all(fx.paths.codex_config().parent().unwrap()).unwrap();
        std::fs::write(fx.paths.codex_config(), "[unclosed\n").unwrap();

        let output = RecordingOutput::default();
        let confirmer = ScriptedConfirmer::new(true);
        let syncer = McpSyncer::new(&fx.paths, &output, &confirmer);

        let report = syncer.sync(&fx.project, &SyncOptions::default()).unwrap();

        assert!(!report.succeeded());
        assert_eq!(report.failed_targets(), vec!["Codex".to_string()]);
        assert!(fx.paths.gemini_settings().exists());
    }

    #[test]
    fn codex_only_touches_a_single_target() {
        let fx = fixture(json!({"fs": {"command": "npx"}}));
        let output = RecordingOutput::default();
        let confirmer = ScriptedConfirmer::new(true);
        let syncer = McpSyncer::new(&fx.paths, &output, &confirmer);

        let report = syncer
            .sync(
                &fx.project,
                &SyncOptions {
                    codex_only: true,
                    ..Default::default()
                },
            )
            .unwrap();

        assert!(report.succeeded());
        assert_eq!(report.outcomes.len(), 1);
        assert!(fx.paths.codex_config().exists());
        assert!(!fx.paths.gemini_settings().exists());
    }
}
