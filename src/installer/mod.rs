//! The component installer.
//!
//! Composes a stack manifest into a live configuration tree. Each
//! component category lands in its global (`~/.claude/...`) or local
//! (`<project>/.claude/...`) location under a uniform policy:
//!
//! - existing file, `overwrite` off: skip, report, leave the file alone
//! - existing file, `overwrite` on: replace
//! - no file: create parent directories and write
//!
//! MCP servers merge into the canonical host configuration per server
//! name; the settings bag goes through the merge engine; hooks get the
//! executable bit and a risk label in their install notice. Any
//! filesystem error aborts the remainder of the restore -- there is no
//! per-component error isolation in this phase. After a successful run
//! the installer records what it did in the project registry.

use crate::core::StaxError;
use crate::hooks::{RiskLevel, RiskScanner};
use crate::manifest::{Component, HookComponent, InstructionFile, Stack};
use crate::mcp::{ClaudeConfig, McpServerConfig};
use crate::paths::StaxPaths;
use crate::registry::{
    ClaudeMdRecord, ComponentCategory, InstalledComponents, InstalledFile, Registry,
    RegistryEntry, SettingsRecord,
};
use crate::settings;
use crate::ui::OutputSink;
use crate::utils::{read_json_or_default, safe_write, write_json_file};
use anyhow::{Context, Result};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Flags accepted by the restore entry point.
#[derive(Debug, Clone, Copy, Default)]
pub struct RestoreOptions {
    /// Replace files and server entries that already exist.
    pub overwrite: bool,
    /// Install every component globally.
    pub global_only: bool,
    /// Install every component locally.
    pub local_only: bool,
}

/// Where one component lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scope {
    Global,
    Local,
}

/// Per-category install counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CategoryCounts {
    pub global_installed: usize,
    pub local_installed: usize,
    pub skipped: usize,
}

impl CategoryCounts {
    fn record(&mut self, scope: Scope) {
        match scope {
            Scope::Global => self.global_installed += 1,
            Scope::Local => self.local_installed += 1,
        }
    }
}

/// Everything a restore run did, for the final summary.
#[derive(Debug, Clone, Default)]
pub struct InstallReport {
    pub commands: CategoryCounts,
    pub agents: CategoryCounts,
    pub hooks: CategoryCounts,
    pub claude_md: CategoryCounts,
    pub mcp_added: usize,
    pub mcp_skipped: usize,
    pub settings_added: usize,
    pub settings_overwritten: usize,
}

impl InstallReport {
    /// Summary lines for the end of the run, one per non-zero counter.
    #[must_use]
    pub fn summary_lines(&self) -> Vec<String> {
        let mut lines = Vec::new();
        for (label, counts) in [
            ("commands", &self.commands),
            ("agents", &self.agents),
            ("hooks", &self.hooks),
            ("instruction files", &self.claude_md),
        ] {
            if counts.global_installed > 0 {
                lines.push(format!("Global {label}: {}", counts.global_installed));
            }
            if counts.local_installed > 0 {
                lines.push(format!("Local {label}: {}", counts.local_installed));
            }
            if counts.skipped > 0 {
                lines.push(format!("Skipped {label}: {}", counts.skipped));
            }
        }
        if self.mcp_added > 0 {
            lines.push(format!("MCP servers: {}", self.mcp_added));
        }
        if self.mcp_skipped > 0 {
            lines.push(format!("Skipped MCP servers: {}", self.mcp_skipped));
        }
        if self.settings_added > 0 {
            lines.push(format!("Settings fields merged: {}", self.settings_added));
        }
        if self.settings_overwritten > 0 {
            lines.push(format!("Settings fields overwritten: {}", self.settings_overwritten));
        }
        lines
    }
}

/// Strip the ` (local)` / ` (global)` disambiguation suffix a component
/// name picks up at export time.
#[must_use]
pub fn strip_scope_suffix(name: &str) -> &str {
    name.strip_suffix(" (local)")
        .or_else(|| name.strip_suffix(" (global)"))
        .unwrap_or(name)
}

fn component_file_name(name: &str) -> String {
    let stripped = strip_scope_suffix(name);
    if Path::new(stripped).extension().is_some() {
        stripped.to_string()
    } else {
        format!("{stripped}.md")
    }
}

/// Installs stacks into a configuration tree.
pub struct StackInstaller<'a> {
    paths: &'a StaxPaths,
    output: &'a dyn OutputSink,
    scanner: &'a dyn RiskScanner,
}

impl<'a> StackInstaller<'a> {
    pub fn new(
        paths: &'a StaxPaths,
        output: &'a dyn OutputSink,
        scanner: &'a dyn RiskScanner,
    ) -> Self {
        Self {
            paths,
            output,
            scanner,
        }
    }

    /// Restore `stack` into `project_dir`.
    ///
    /// Installs every category sequentially, records the result in the
    /// project registry, and returns the accumulated report. A stack with
    /// no components is a successful no-op.
    pub fn restore(
        &self,
        stack: &Stack,
        project_dir: &Path,
        options: &RestoreOptions,
    ) -> Result<InstallReport> {
        let mut registry = Registry::load(&self.paths.registry_path(project_dir));
        self.warn_conflicts(stack, &registry);

        let mut report = InstallReport::default();
        let mut installed = InstalledComponents::default();

        for component in &stack.commands {
            self.install_file(
                component,
                "commands",
                project_dir,
                options,
                &mut report.commands,
                &mut installed.commands,
                false,
            )?;
        }
        for component in &stack.agents {
            self.install_file(
                component,
                "agents",
                project_dir,
                options,
                &mut report.agents,
                &mut installed.agents,
                false,
            )?;
        }
        for hook in &stack.hooks {
            self.install_hook(hook, project_dir, options, &mut report, &mut installed)?;
        }

        self.install_mcp_servers(stack, project_dir, options, &mut report, &mut installed)?;
        self.install_settings(stack, project_dir, options, &mut report, &mut installed)?;
        self.install_claude_md(stack, project_dir, options, &mut report, &mut installed)?;

        let entry = RegistryEntry {
            stack_id: stack.name.clone(),
            name: stack.name.clone(),
            installed_at: chrono::Utc::now().to_rfc3339(),
            source: stack
                .metadata
                .install_source
                .clone()
                .or_else(|| Some("local-export".to_string())),
            version: stack.version.clone(),
            components: installed,
        };
        registry.register(entry);
        registry
            .save()
            .context("Failed to record the install in the project registry")?;

        Ok(report)
    }

    /// Non-fatal notice when another stack already owns a same-named
    /// component or server.
    fn warn_conflicts(&self, stack: &Stack, registry: &Registry) {
        let named = [
            (ComponentCategory::Commands, &stack.commands),
            (ComponentCategory::Agents, &stack.agents),
        ];
        for (category, components) in named {
            for component in components.iter() {
                let name = strip_scope_suffix(&component.name);
                for owner in registry.find_by_component(name, category) {
                    if owner.stack_id != stack.name {
                        self.output.warning(&format!(
                            "{} '{name}' was previously installed by stack '{}'",
                            category.as_str(),
                            owner.stack_id
                        ));
                    }
                }
            }
        }
        for server in &stack.mcp_servers {
            for owner in registry.find_by_mcp_server(&server.name) {
                if owner.stack_id != stack.name {
                    self.output.warning(&format!(
                        "MCP server '{}' was previously installed by stack '{}'",
                        server.name, owner.stack_id
                    ));
                }
            }
        }
    }

    fn scope_for(&self, source: &Path, options: &RestoreOptions) -> Scope {
        if options.global_only {
            Scope::Global
        } else if options.local_only {
            Scope::Local
        } else if self.paths.is_global_source(source) {
            Scope::Global
        } else {
            Scope::Local
        }
    }

    fn target_dir(&self, category: &str, scope: Scope, project_dir: &Path) -> PathBuf {
        match scope {
            Scope::Global => self.paths.global_component_dir(category),
            Scope::Local => self.paths.local_component_dir(project_dir, category),
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn install_file(
        &self,
        component: &Component,
        category: &str,
        project_dir: &Path,
        options: &RestoreOptions,
        counts: &mut CategoryCounts,
        records: &mut Vec<InstalledFile>,
        executable: bool,
    ) -> Result<bool> {
        let scope = self.scope_for(&component.path, options);
        let file_name = component_file_name(&component.name);
        let target = self.target_dir(category, scope, project_dir).join(&file_name);

        if target.exists() && !options.overwrite {
            counts.skipped += 1;
            self.output
                .meta(&format!("Skipped existing {category}: {}", target.display()));
            // The file is still this stack's component; keep it on the
            // ledger so listing, cleanup, and conflict checks see it.
            records.push(InstalledFile {
                name: strip_scope_suffix(&component.name).to_string(),
                path: target,
                is_global: scope == Scope::Global,
            });
            return Ok(false);
        }
        let replacing = target.exists();

        safe_write(&target, &component.content)
            .with_context(|| format!("Failed to install {category} '{}'", component.name))?;
        if executable {
            set_executable(&target)?;
        }

        debug!("installed {} -> {}", component.name, target.display());
        counts.record(scope);
        records.push(InstalledFile {
            name: strip_scope_suffix(&component.name).to_string(),
            path: target.clone(),
            is_global: scope == Scope::Global,
        });

        let verb = if replacing { "Replaced" } else { "Installed" };
        self.output
            .success(&format!("{verb} {category}: {}", target.display()));
        Ok(true)
    }

    fn install_hook(
        &self,
        hook: &HookComponent,
        project_dir: &Path,
        options: &RestoreOptions,
        report: &mut InstallReport,
        installed: &mut InstalledComponents,
    ) -> Result<()> {
        // Prefer a fresh scan; fall back to the label the manifest carries.
        let risk = match self.scanner.scan(&hook.name, &hook.content) {
            RiskLevel::Unknown => hook
                .risk_level
                .as_deref()
                .map_or(RiskLevel::Unknown, RiskLevel::parse),
            scanned => scanned,
        };

        let component = Component {
            name: hook.name.clone(),
            path: hook.path.clone(),
            content: hook.content.clone(),
            description: hook.description.clone(),
        };
        let wrote = self.install_file(
            &component,
            "hooks",
            project_dir,
            options,
            &mut report.hooks,
            &mut installed.hooks,
            true,
        )?;

        if wrote {
            self.output.meta(&format!(
                "Hook '{}' on {} (risk: {risk})",
                strip_scope_suffix(&hook.name),
                hook.event
            ));
        }
        Ok(())
    }

    fn install_mcp_servers(
        &self,
        stack: &Stack,
        project_dir: &Path,
        options: &RestoreOptions,
        report: &mut InstallReport,
        installed: &mut InstalledComponents,
    ) -> Result<()> {
        if stack.mcp_servers.is_empty() {
            return Ok(());
        }

        let config_path = self.paths.claude_config();
        let mut config = ClaudeConfig::load_or_default(&config_path);
        let project_key = project_dir.to_string_lossy().to_string();
        let servers = config.project_servers_mut(&project_key);

        for spec in &stack.mcp_servers {
            if servers.contains_key(&spec.name) && !options.overwrite {
                report.mcp_skipped += 1;
                installed.mcp_servers.push(spec.name.clone());
                self.output
                    .meta(&format!("Skipped existing MCP server: {}", spec.name));
                continue;
            }
            servers.insert(spec.name.clone(), McpServerConfig::from_spec(spec));
            report.mcp_added += 1;
            installed.mcp_servers.push(spec.name.clone());
            self.output
                .success(&format!("Configured MCP server: {}", spec.name));
        }

        if report.mcp_added > 0 {
            config.save(&config_path)?;
        }
        Ok(())
    }

    fn install_settings(
        &self,
        stack: &Stack,
        project_dir: &Path,
        options: &RestoreOptions,
        report: &mut InstallReport,
        installed: &mut InstalledComponents,
    ) -> Result<()> {
        if stack.settings.is_empty() {
            return Ok(());
        }

        let (scope, path) = if options.global_only {
            ("global", self.paths.global_settings())
        } else {
            ("local", self.paths.local_settings(project_dir))
        };

        let existing: Map<String, Value> = read_json_or_default(&path);
        let outcome = settings::merge(&existing, &stack.settings, options.overwrite);

        // Leave the user's file untouched when the merge changed nothing.
        if outcome.result != existing {
            write_json_file(&path, &outcome.result, true)
                .with_context(|| format!("Failed to update settings at {}", path.display()))?;
        }

        report.settings_added = outcome.added();
        report.settings_overwritten = outcome.overwritten();
        match (outcome.added(), outcome.overwritten()) {
            (0, 0) => self.output.meta("Settings already up to date"),
            (added, 0) => self
                .output
                .success(&format!("Merged {added} new settings field(s)")),
            (0, overwritten) => self
                .output
                .success(&format!("Overwrote {overwritten} settings field(s)")),
            (added, overwritten) => self.output.success(&format!(
                "Merged {added} new and overwrote {overwritten} settings field(s)"
            )),
        }

        installed.settings.push(SettingsRecord {
            scope: scope.to_string(),
            fields: stack.settings.keys().cloned().collect(),
            permissions: stack
                .settings
                .contains_key(settings::merge::PERMISSIONS_KEY)
                .then_some(true),
        });
        Ok(())
    }

    fn install_claude_md(
        &self,
        stack: &Stack,
        project_dir: &Path,
        options: &RestoreOptions,
        report: &mut InstallReport,
        installed: &mut InstalledComponents,
    ) -> Result<()> {
        let Some(pair) = &stack.claude_md else {
            return Ok(());
        };

        if let Some(global) = &pair.global {
            if !options.local_only {
                self.write_instruction_file(
                    global,
                    Scope::Global,
                    &self.paths.global_claude_md(),
                    options,
                    report,
                    installed,
                )?;
            }
        }
        if let Some(local) = &pair.local {
            if !options.global_only {
                self.write_instruction_file(
                    local,
                    Scope::Local,
                    &self.paths.local_claude_md(project_dir),
                    options,
                    report,
                    installed,
                )?;
            }
        }
        Ok(())
    }

    fn write_instruction_file(
        &self,
        file: &InstructionFile,
        scope: Scope,
        target: &Path,
        options: &RestoreOptions,
        report: &mut InstallReport,
        installed: &mut InstalledComponents,
    ) -> Result<()> {
        let label = match scope {
            Scope::Global => "global",
            Scope::Local => "local",
        };
        if target.exists() && !options.overwrite {
            report.claude_md.skipped += 1;
            installed.claude_md.push(ClaudeMdRecord {
                scope: label.to_string(),
                path: target.to_path_buf(),
            });
            self.output.meta(&format!(
                "Skipped existing {label} instruction file: {}",
                target.display()
            ));
            return Ok(());
        }

        safe_write(target, &file.content)
            .with_context(|| format!("Failed to install {label} instruction file"))?;
        report.claude_md.record(scope);
        installed.claude_md.push(ClaudeMdRecord {
            scope: label.to_string(),
            path: target.to_path_buf(),
        });
        self.output
            .success(&format!("Installed {label} instruction file: {}", target.display()));
        Ok(())
    }
}

#[cfg(unix)]
fn set_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    let perms = std::fs::Permissions::from_mode(0o755);
    std::fs::set_permissions(path, perms)
        .map_err(|e| StaxError::fs("set permissions", path, e))?;
    Ok(())
}

#[cfg(not(unix))]
fn set_executable(_path: &Path) -> Result<()> {
    Ok(())
}
