//! Codex sync target: `~/.codex/config.toml`.
//!
//! Codex configures MCP servers as `[mcp_servers.<name>]` stanzas and
//! speaks stdio only. The file is user-owned, so it is edited in place
//! through `toml_edit` -- every key outside the stanzas we manage, and
//! every comment, survives a sync untouched.

use crate::mcp::{McpServerConfig, TransportKind};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use toml_edit::{Array, DocumentMut, Item, Table, value};

/// Top-level table holding the server stanzas.
pub const SERVERS_TABLE: &str = "mcp_servers";

/// Number of server stanzas already present in the document.
#[must_use]
pub fn server_count(doc: &DocumentMut) -> usize {
    doc.get(SERVERS_TABLE)
        .and_then(Item::as_table)
        .map_or(0, Table::len)
}

/// Outcome of projecting a server set into a Codex document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodexProjection {
    /// Stanzas written or replaced.
    pub written: usize,
    /// Non-stdio servers that had to be dropped.
    pub skipped_non_stdio: usize,
}

/// Project `servers` into `doc`.
///
/// With `replace` the managed `[mcp_servers]` table is rebuilt from
/// scratch; otherwise incoming stanzas are appended, winning on name
/// collision. Non-stdio servers cannot be expressed and are counted
/// instead of written.
pub fn project_servers(
    doc: &mut DocumentMut,
    servers: &BTreeMap<String, McpServerConfig>,
    replace: bool,
) -> CodexProjection {
    if replace || doc.get(SERVERS_TABLE).and_then(Item::as_table).is_none() {
        let mut parent = Table::new();
        parent.set_implicit(true);
        doc[SERVERS_TABLE] = Item::Table(parent);
    }
    let parent = doc[SERVERS_TABLE].as_table_mut().unwrap();

    let mut projection = CodexProjection {
        written: 0,
        skipped_non_stdio: 0,
    };

    for (name, server) in servers {
        if server.kind() != TransportKind::Stdio {
            projection.skipped_non_stdio += 1;
            continue;
        }
        parent.insert(name, Item::Table(stanza(server)));
        projection.written += 1;
    }

    projection
}

fn stanza(server: &McpServerConfig) -> Table {
    let mut table = Table::new();
    table["command"] = value(server.command.clone().unwrap_or_default());

    if !server.args.is_empty() {
        let mut args = Array::new();
        for arg in &server.args {
            args.push(arg.as_str());
        }
        table["args"] = value(args);
    }

    if !server.env.is_empty() {
        let mut env = Table::new();
        // BTreeMap ordering keeps the stanza stable across syncs
        let sorted: BTreeMap<_, _> = server.env.iter().collect();
        for (key, val) in sorted {
            if let Some(toml_val) = json_scalar_to_toml(val) {
                env.insert(key, toml_val);
            }
        }
        table.insert("env", Item::Table(env));
    }

    table
}

/// Convert a JSON scalar to a TOML item; structured values are dropped
/// (Codex env entries are flat).
fn json_scalar_to_toml(val: &JsonValue) -> Option<Item> {
    match val {
        JsonValue::String(s) => Some(value(s.as_str())),
        JsonValue::Bool(b) => Some(value(*b)),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(value(i))
            } else {
                n.as_f64().map(value)
            }
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn stdio_server(command: &str) -> McpServerConfig {
        McpServerConfig {
            command: Some(command.to_string()),
            ..Default::default()
        }
    }

    fn http_server(url: &str) -> McpServerConfig {
        McpServerConfig {
            transport: Some(TransportKind::Http),
            url: Some(url.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn renders_one_stanza_per_stdio_server() {
        let mut doc = DocumentMut::new();
        let mut servers = BTreeMap::new();
        servers.insert(
            "fs".to_string(),
            McpServerConfig {
                command: Some("npx".into()),
                args: vec!["-y".into(), "@modelcontextprotocol/server-filesystem".into()],
                env: [("DEBUG".to_string(), json!("1"))].into_iter().collect(),
                ..Default::default()
            },
        );

        let projection = project_servers(&mut doc, &servers, false);
        assert_eq!(projection.written, 1);

        let rendered = doc.to_string();
        assert!(rendered.contains("[mcp_servers.fs]"));
        assert!(rendered.contains("command = \"npx\""));
        assert!(rendered.contains("[mcp_servers.fs.env]"));
        assert!(rendered.contains("DEBUG = \"1\""));
    }

    #[test]
    fn skips_and_counts_non_stdio_servers() {
        let mut doc = DocumentMut::new();
        let mut servers = BTreeMap::new();
        servers.insert("fs".to_string(), stdio_server("npx"));
        servers.insert("api".to_string(), http_server("https://a"));
        servers.insert("events".to_string(), http_server("https://b"));

        let projection = project_servers(&mut doc, &servers, false);

        assert_eq!(projection.written, 1);
        assert_eq!(projection.skipped_non_stdio, 2);
        assert!(!doc.to_string().contains("api"));
    }

    #[test]
    fn append_preserves_foreign_stanzas_and_keys() {
        let existing = "model = \"o3\"\n\n[mcp_servers.user-server]\ncommand = \"custom\"\n";
        let mut doc: DocumentMut = existing.parse().unwrap();
        let mut servers = BTreeMap::new();
        servers.insert("fs".to_string(), stdio_server("npx"));

        project_servers(&mut doc, &servers, false);

        let rendered = doc.to_string();
        assert!(rendered.contains("model = \"o3\""));
        assert!(rendered.contains("[mcp_servers.user-server]"));
        assert!(rendered.contains("[mcp_servers.fs]"));
        assert_eq!(server_count(&doc), 2);
    }

    #[test]
    fn replace_rebuilds_only_the_managed_table() {
        let existing = "model = \"o3\"\n\n[mcp_servers.stale]\ncommand = \"old\"\n";
        let mut doc: DocumentMut = existing.parse().unwrap();
        let mut servers = BTreeMap::new();
        servers.insert("fs".to_string(), stdio_server("npx"));

        project_servers(&mut doc, &servers, true);

        let rendered = doc.to_string();
        assert!(rendered.contains("model = \"o3\""));
        assert!(!rendered.contains("stale"));
        assert_eq!(server_count(&doc), 1);
    }

    #[test]
    fn name_collisions_favor_the_incoming_stanza() {
        let existing = "[mcp_servers.fs]\ncommand = \"old\"\n";
        let mut doc: DocumentMut = existing.parse().unwrap();
        let mut servers = BTreeMap::new();
        servers.insert("fs".to_string(), stdio_server("new"));

        project_servers(&mut doc, &servers, false);

        let rendered = doc.to_string();
        assert!(rendered.contains("command = \"new\""));
        assert!(!rendered.contains("command = \"old\""));
    }
}
