//! Stack reference resolution.
//!
//! A reference is either an absolute path, a relative path (anything
//! containing a separator), or a bare stack name looked up in the
//! canonical stacks directory. Resolution always probes for existence so
//! callers never receive a path that is not there.

use crate::core::StaxError;
use crate::paths::StaxPaths;
use anyhow::Result;
use std::path::{Path, PathBuf};

/// Resolve a stack reference to an existing manifest path.
///
/// Rules, in order:
/// 1. Absolute path: used as-is.
/// 2. Contains a path separator: resolved against the current directory.
/// 3. Bare name: resolved against `~/.claude/stacks/`, with `.json`
///    appended when the name has no extension.
///
/// # Errors
///
/// [`StaxError::StackNotFound`] when the resolved path does not exist.
pub fn resolve_stack_path(reference: &str, paths: &StaxPaths) -> Result<PathBuf> {
    let candidate = if Path::new(reference).is_absolute() {
        PathBuf::from(reference)
    } else if has_separator(reference) {
        std::env::current_dir()?.join(reference)
    } else {
        let mut name = PathBuf::from(reference);
        if name.extension().is_none() {
            name.set_extension("json");
        }
        paths.stacks_dir().join(name)
    };

    if !candidate.exists() {
        return Err(StaxError::StackNotFound {
            reference: reference.to_string(),
        }
        .into());
    }

    Ok(candidate)
}

fn has_separator(reference: &str) -> bool {
    reference.contains('/') || reference.contains(std::path::MAIN_SEPARATOR)
}
