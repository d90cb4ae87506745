//! stax - portable configuration stacks for AI coding assistants.
//!
//! stax packages a developer's local assistant configuration (slash
//! commands, specialized agents, hooks, MCP server definitions, settings,
//! instruction files) into portable stack manifests, and composes those
//! manifests back into a live configuration tree without destroying what
//! is already there. It also keeps other tools in sync: the project's
//! MCP server set can be projected into the Codex and Gemini
//! configuration formats.
//!
//! # Architecture
//!
//! The engine is built leaf-first:
//!
//! - [`utils::fs`] - atomic persistence: every managed document is
//!   written temp-file-then-rename, so readers never observe a partial
//!   file; merge bases tolerate missing or corrupt files.
//! - [`settings`] - the pure merge engine combining a stack's settings
//!   bag with the user's existing settings under field-shape-specific
//!   rules.
//! - [`manifest`] - the stack document model and reference resolver.
//! - [`installer`] - per-component installation: scope selection,
//!   skip/overwrite policy, per-category reporting.
//! - [`registry`] - the per-project ledger of which stack installed
//!   which components, used for listing, conflict warnings, and cleanup.
//! - [`mcp`] - the canonical MCP server model and the cross-tool
//!   synchronizer with its two independent targets.
//!
//! User-facing reporting and confirmation go through the [`ui`]
//! collaborator traits; hook risk labels come from the [`hooks`]
//! scanner trait. Both exist so the engines stay testable without
//! capturing stdout or wiring in an analyzer.
//!
//! # Key guarantees
//!
//! - Foreign-owned data survives: unknown JSON keys round-trip, and the
//!   Codex TOML file is edited in place.
//! - A restore never silently reverses a user's prior choice: existing
//!   settings win on conflicts unless `--overwrite` is given, and even
//!   then only keys present in the incoming stack are replaced.
//! - Sync targets fail independently; one broken file never blocks the
//!   other tool from being updated.

pub mod cli;
pub mod core;
pub mod hooks;
pub mod installer;
pub mod manifest;
pub mod mcp;
pub mod paths;
pub mod registry;
pub mod settings;
pub mod ui;
pub mod utils;
