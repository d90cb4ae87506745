//! The per-project installation registry.
//!
//! A ledger at `<project>/.claude/stax-registry.json` recording which
//! stack installed which components, used for listing, conflict
//! detection, and cleanup. The document is always rewritten in full
//! through the atomic writer; a missing or corrupt file is treated as an
//! empty ledger and heals on the next save.
//!
//! # Document format
//!
//! ```json
//! {
//!   "version": "1.0",
//!   "lastUpdated": "2026-02-01T09:30:00+00:00",
//!   "stacks": {
//!     "web-dev": {
//!       "stackId": "web-dev",
//!       "name": "web-dev",
//!       "installedAt": "2026-02-01T09:30:00+00:00",
//!       "source": "local-export",
//!       "components": {
//!         "commands": [{"name": "deploy", "path": "...", "isGlobal": false}],
//!         "mcpServers": ["fs"],
//!         "settings": [{"type": "local", "fields": ["theme"]}],
//!         "claudeMd": [{"type": "local", "path": "..."}]
//!       }
//!     }
//!   }
//! }
//! ```

use crate::utils::{read_json_or_default, write_json_file};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Current registry document version.
pub const REGISTRY_VERSION: &str = "1.0";

/// File-backed component categories the registry can be queried by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentCategory {
    Commands,
    Agents,
    Hooks,
}

impl ComponentCategory {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Commands => "commands",
            Self::Agents => "agents",
            Self::Hooks => "hooks",
        }
    }
}

/// One installed file-backed component.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InstalledFile {
    pub name: String,
    pub path: PathBuf,
    pub is_global: bool,
}

/// Record of a settings merge performed by a stack.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SettingsRecord {
    /// Which settings file was touched: `"local"` or `"global"`.
    #[serde(rename = "type")]
    pub scope: String,
    /// Top-level fields the stack contributed.
    pub fields: Vec<String>,
    /// Whether the stack contributed permission entries.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permissions: Option<bool>,
}

/// Record of an installed instruction file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClaudeMdRecord {
    /// `"local"` or `"global"`.
    #[serde(rename = "type")]
    pub scope: String,
    pub path: PathBuf,
}

/// Everything a stack installed, keyed by category.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InstalledComponents {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub commands: Vec<InstalledFile>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub agents: Vec<InstalledFile>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub hooks: Vec<InstalledFile>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mcp_servers: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub settings: Vec<SettingsRecord>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub claude_md: Vec<ClaudeMdRecord>,
}

impl InstalledComponents {
    fn files_in(&self, category: ComponentCategory) -> &[InstalledFile] {
        match category {
            ComponentCategory::Commands => &self.commands,
            ComponentCategory::Agents => &self.agents,
            ComponentCategory::Hooks => &self.hooks,
        }
    }

    /// All filesystem paths this record points at.
    pub fn file_paths(&self) -> impl Iterator<Item = &Path> {
        self.commands
            .iter()
            .chain(&self.agents)
            .chain(&self.hooks)
            .map(|f| f.path.as_path())
            .chain(self.claude_md.iter().map(|c| c.path.as_path()))
    }

    /// Total count across all categories, for listings.
    #[must_use]
    pub fn total(&self) -> usize {
        self.commands.len()
            + self.agents.len()
            + self.hooks.len()
            + self.mcp_servers.len()
            + self.settings.len()
            + self.claude_md.len()
    }
}

/// One stack's entry in the ledger.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RegistryEntry {
    /// Unique per project; the stack name for locally exported stacks.
    pub stack_id: String,

    pub name: String,

    /// Set on first install, never rewritten on reinstall.
    pub installed_at: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(default)]
    pub components: InstalledComponents,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RegistryDoc {
    #[serde(default)]
    version: String,

    #[serde(default)]
    last_updated: String,

    #[serde(default)]
    stacks: BTreeMap<String, RegistryEntry>,
}

/// Handle to one project's registry document.
#[derive(Debug)]
pub struct Registry {
    path: PathBuf,
    doc: RegistryDoc,
}

impl Registry {
    /// Load the registry, creating an empty one if absent and upgrading
    /// older documents (missing `version` or per-entry `components`
    /// sub-maps are filled in by the serde defaults).
    #[must_use]
    pub fn load(path: &Path) -> Self {
        let mut doc: RegistryDoc = read_json_or_default(path);
        if doc.version.is_empty() {
            doc.version = REGISTRY_VERSION.to_string();
        }
        Self {
            path: path.to_path_buf(),
            doc,
        }
    }

    /// Persist atomically, refreshing `lastUpdated`.
    pub fn save(&mut self) -> Result<()> {
        self.doc.last_updated = chrono::Utc::now().to_rfc3339();
        write_json_file(&self.path, &self.doc, true)
    }

    /// Insert or replace an entry. A reinstall keeps the original
    /// `installedAt` of the entry it replaces.
    pub fn register(&mut self, mut entry: RegistryEntry) {
        if let Some(previous) = self.doc.stacks.get(&entry.stack_id) {
            entry.installed_at = previous.installed_at.clone();
        }
        self.doc.stacks.insert(entry.stack_id.clone(), entry);
    }

    /// Remove an entry, returning it if present.
    pub fn unregister(&mut self, stack_id: &str) -> Option<RegistryEntry> {
        self.doc.stacks.remove(stack_id)
    }

    /// Apply a mutation to an entry in place. Returns false when the
    /// stack is not registered.
    pub fn update_entry(
        &mut self,
        stack_id: &str,
        patch: impl FnOnce(&mut RegistryEntry),
    ) -> bool {
        match self.doc.stacks.get_mut(stack_id) {
            Some(entry) => {
                patch(entry);
                true
            }
            None => false,
        }
    }

    #[must_use]
    pub fn is_installed(&self, stack_id: &str) -> bool {
        self.doc.stacks.contains_key(stack_id)
    }

    #[must_use]
    pub fn get(&self, stack_id: &str) -> Option<&RegistryEntry> {
        self.doc.stacks.get(stack_id)
    }

    /// All entries, in the map's stable order.
    pub fn entries(&self) -> impl Iterator<Item = &RegistryEntry> {
        self.doc.stacks.values()
    }

    /// Every stack that installed an MCP server with this name.
    #[must_use]
    pub fn find_by_mcp_server(&self, name: &str) -> Vec<&RegistryEntry> {
        self.entries()
            .filter(|e| e.components.mcp_servers.iter().any(|s| s == name))
            .collect()
    }

    /// Every stack that installed a component with this name in the
    /// given category.
    #[must_use]
    pub fn find_by_component(
        &self,
        name: &str,
        category: ComponentCategory,
    ) -> Vec<&RegistryEntry> {
        self.entries()
            .filter(|e| e.components.files_in(category).iter().any(|f| f.name == name))
            .collect()
    }

    /// Drop entries whose referenced files are all gone from disk.
    ///
    /// An entry survives if even one referenced file still exists, and
    /// entries with no file-backed components are never removed here
    /// (there is nothing on disk to verify them against). The document
    /// is persisted only when something was actually removed, so a no-op
    /// cleanup does not churn `lastUpdated`.
    pub fn cleanup(&mut self) -> Result<Vec<String>> {
        let stale: Vec<String> = self
            .doc
            .stacks
            .iter()
            .filter(|(_, entry)| {
                let mut paths = entry.components.file_paths().peekable();
                paths.peek().is_some() && paths.all(|p| !p.exists())
            })
            .map(|(id, _)| id.clone())
            .collect();

        for id in &stale {
            self.doc.stacks.remove(id);
        }
        if !stale.is_empty() {
            self.save()?;
        }
        Ok(stale)
    }

    #[must_use]
    pub fn version(&self) -> &str {
        &self.doc.version
    }

    #[must_use]
    pub fn last_updated(&self) -> &str {
        &self.doc.last_updated
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn entry(stack_id: &str, files: Vec<InstalledFile>) -> RegistryEntry {
        RegistryEntry {
            stack_id: stack_id.to_string(),
            name: stack_id.to_string(),
            installed_at: "2026-01-01T00:00:00+00:00".to_string(),
            source: Some("local-export".to_string()),
            version: None,
            components: InstalledComponents {
                commands: files,
                ..Default::default()
            },
        }
    }

    fn file(name: &str, path: &Path) -> InstalledFile {
        InstalledFile {
            name: name.to_string(),
            path: path.to_path_buf(),
            is_global: false,
        }
    }

    #[test]
    fn loads_empty_when_absent_and_round_trips() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(".claude/stax-registry.json");

        let mut registry = Registry::load(&path);
        assert_eq!(registry.version(), REGISTRY_VERSION);
        assert_eq!(registry.entries().count(), 0);

        registry.register(entry("web-dev", vec![]));
        registry.save().unwrap();

        let reloaded = Registry::load(&path);
        assert!(reloaded.is_installed("web-dev"));
        assert!(!reloaded.last_updated().is_empty());
    }

    #[test]
    fn migrates_documents_missing_version_and_components() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("registry.json");
        std::fs::write(
            &path,
            r#"{"stacks": {"old": {"stackId": "old", "name": "old", "installedAt": "2025-01-01T00:00:00Z"}}}"#,
        )
        .unwrap();

        let registry = Registry::load(&path);
        assert_eq!(registry.version(), REGISTRY_VERSION);
        let old = registry.get("old").unwrap();
        assert_eq!(old.components, InstalledComponents::default());
    }

    #[test]
    fn reinstall_keeps_original_installed_at() {
        let tmp = TempDir::new().unwrap();
        let mut registry = Registry::load(&tmp.path().join("registry.json"));

        registry.register(entry("s", vec![]));
        let mut again = entry("s", vec![]);
        again.installed_at = "2026-02-02T00:00:00+00:00".to_string();
        registry.register(again);

        assert_eq!(
            registry.get("s").unwrap().installed_at,
            "2026-01-01T00:00:00+00:00"
        );
    }

    #[test]
    fn finds_entries_by_component_and_server_name() {
        let tmp = TempDir::new().unwrap();
        let mut registry = Registry::load(&tmp.path().join("registry.json"));

        let mut a = entry("a", vec![file("deploy", Path::new("/x/deploy.md"))]);
        a.components.mcp_servers.push("fs".to_string());
        registry.register(a);
        registry.register(entry("b", vec![file("deploy", Path::new("/y/deploy.md"))]));

        let owners = registry.find_by_component("deploy", ComponentCategory::Commands);
        assert_eq!(owners.len(), 2);
        assert!(registry.find_by_component("deploy", ComponentCategory::Agents).is_empty());

        let server_owners = registry.find_by_mcp_server("fs");
        assert_eq!(server_owners.len(), 1);
        assert_eq!(server_owners[0].stack_id, "a");
    }

    #[test]
    fn cleanup_removes_only_fully_absent_entries() {
        let tmp = TempDir::new().unwrap();
        let registry_path = tmp.path().join("registry.json");
        let existing_file = tmp.path().join("still-here.md");
        std::fs::write(&existing_file, "x").unwrap();

        let mut registry = Registry::load(&registry_path);
        registry.register(entry(
            "gone",
            vec![file("a", &tmp.path().join("deleted-a.md")),
                 file("b", &tmp.path().join("deleted-b.md"))],
        ));
        registry.register(entry(
            "half",
            vec![file("a", &tmp.path().join("deleted.md")), file("b", &existing_file)],
        ));
        registry.save().unwrap();

        let removed = registry.cleanup().unwrap();

        assert_eq!(removed, vec!["gone".to_string()]);
        assert!(registry.is_installed("half"));
        let reloaded = Registry::load(&registry_path);
        assert!(!reloaded.is_installed("gone"));
    }

    #[test]
    fn cleanup_retains_entries_with_no_file_components() {
        let tmp = TempDir::new().unwrap();
        let mut registry = Registry::load(&tmp.path().join("registry.json"));

        let mut servers_only = entry("servers-only", vec![]);
        servers_only.components.mcp_servers.push("fs".to_string());
        registry.register(servers_only);

        let removed = registry.cleanup().unwrap();
        assert!(removed.is_empty());
        assert!(registry.is_installed("servers-only"));
    }

    #[test]
    fn noop_cleanup_does_not_touch_the_timestamp() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("registry.json");
        let keep = tmp.path().join("keep.md");
        std::fs::write(&keep, "x").unwrap();

        let mut registry = Registry::load(&path);
        registry.register(entry("kept", vec![file("k", &keep)]));
        registry.save().unwrap();
        let stamp_before = std::fs::read_to_string(&path).unwrap();

        registry.cleanup().unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), stamp_before);
    }

    #[test]
    fn update_entry_patches_in_place() {
        let tmp = TempDir::new().unwrap();
        let mut registry = Registry::load(&tmp.path().join("registry.json"));
        registry.register(entry("s", vec![]));

        let patched = registry.update_entry("s", |e| e.version = Some("2.0".into()));
        assert!(patched);
        assert_eq!(registry.get("s").unwrap().version.as_deref(), Some("2.0"));
        assert!(!registry.update_entry("ghost", |_| {}));
    }
}
