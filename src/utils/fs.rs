//! File system utilities: atomic writes and tolerant JSON loading.
//!
//! Every configuration document this crate persists (registry, settings,
//! canonical host configuration, sync targets) goes through
//! [`atomic_write`], so a concurrent or crashing reader observes either the
//! prior complete content or the new complete content, never a truncated
//! file.
//!
//! Read-modify-write callers load their base with [`read_json_or_default`]:
//! a missing or corrupt base is logged and treated as empty rather than
//! failing the operation, so a damaged file self-heals on the next write.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::warn;

/// Creates a directory and all parent directories if they don't exist.
pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)
            .with_context(|| format!("Failed to create directory: {}", path.display()))?;
    } else if !path.is_dir() {
        return Err(anyhow::anyhow!(
            "Path exists but is not a directory: {}",
            path.display()
        ));
    }
    Ok(())
}

/// Creates the parent directory of `path` if needed.
pub fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }
    Ok(())
}

/// Atomically writes bytes to a file using a write-then-rename strategy.
///
/// The content is written to a sibling temporary file (`.tmp` extension),
/// synced to disk, then renamed over the target path. Parent directories
/// are created first.
///
/// # Guarantees
///
/// - **Atomicity**: the target file is never observable in a partial state
/// - **Durability**: content is synced to disk before the rename
pub fn atomic_write(path: &Path, content: &[u8]) -> Result<()> {
    use std::io::Write;

    ensure_parent_dir(path)?;

    // Sibling temp file so the rename stays within one filesystem
    let temp_path = path.with_extension("tmp");

    {
        let mut file = fs::File::create(&temp_path)
            .with_context(|| format!("Failed to create temp file: {}", temp_path.display()))?;

        file.write_all(content)
            .with_context(|| format!("Failed to write to temp file: {}", temp_path.display()))?;

        file.sync_all().with_context(|| "Failed to sync file to disk")?;
    }

    fs::rename(&temp_path, path)
        .with_context(|| format!("Failed to rename temp file to: {}", path.display()))?;

    Ok(())
}

/// Atomically writes a string to a file.
///
/// Convenience wrapper around [`atomic_write`].
pub fn safe_write(path: &Path, content: &str) -> Result<()> {
    atomic_write(path, content.as_bytes())
}

/// Reads a file as a UTF-8 string.
pub fn read_text_file(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("Failed to read file: {}", path.display()))
}

/// Reads and parses a JSON file, failing on missing or malformed content.
///
/// Use this for documents the user explicitly named (a stack manifest);
/// use [`read_json_or_default`] for merge bases.
pub fn read_json_file<T>(path: &Path) -> Result<T>
where
    T: serde::de::DeserializeOwned,
{
    let content = read_text_file(path)?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse JSON from file: {}", path.display()))
}

/// Reads a JSON file, returning `T::default()` when the file is missing or
/// unparseable.
///
/// A corrupt base is reported with a warning, not an error: the caller is
/// about to rewrite the document anyway, so merging into an empty base
/// repairs it instead of blocking the operation.
pub fn read_json_or_default<T>(path: &Path) -> T
where
    T: serde::de::DeserializeOwned + Default,
{
    if !path.exists() {
        return T::default();
    }
    match fs::read_to_string(path) {
        Ok(content) => match serde_json::from_str(&content) {
            Ok(value) => value,
            Err(e) => {
                warn!(
                    "Ignoring malformed JSON in {} ({e}); starting from an empty document",
                    path.display()
                );
                T::default()
            }
        },
        Err(e) => {
            warn!(
                "Could not read {} ({e}); starting from an empty document",
                path.display()
            );
            T::default()
        }
    }
}

/// Writes data as JSON to a file atomically.
pub fn write_json_file<T>(path: &Path, data: &T, pretty: bool) -> Result<()>
where
    T: serde::Serialize,
{
    let json = if pretty {
        serde_json::to_string_pretty(data)?
    } else {
        serde_json::to_string(data)?
    };

    safe_write(path, &json).with_context(|| format!("Failed to write JSON file: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};
    use tempfile::TempDir;

    #[test]
    fn atomic_write_creates_parents_and_file() {
        let tmp = TempDir::new().unwrap();
        let target = tmp.path().join("a/b/c.json");
        atomic_write(&target, b"{}").unwrap();
        assert_eq!(fs::read_to_string(&target).unwrap(), "{}");
    }

    #[test]
    fn atomic_write_replaces_existing_content() {
        let tmp = TempDir::new().unwrap();
        let target = tmp.path().join("doc.json");
        atomic_write(&target, b"old").unwrap();
        atomic_write(&target, b"new").unwrap();
        assert_eq!(fs::read_to_string(&target).unwrap(), "new");
    }

    #[test]
    fn interrupted_write_leaves_destination_intact() {
        // Simulate a crash between temp-write and rename: the temp file
        // exists but the rename never happened. The destination must be
        // byte-identical to its pre-write state.
        let tmp = TempDir::new().unwrap();
        let target = tmp.path().join("doc.json");
        atomic_write(&target, b"original").unwrap();

        let temp_path = target.with_extension("tmp");
        fs::write(&temp_path, b"half-writ").unwrap();

        assert_eq!(fs::read_to_string(&target).unwrap(), "original");
    }

    #[test]
    fn read_json_or_default_tolerates_missing_file() {
        let tmp = TempDir::new().unwrap();
        let value: Value = read_json_or_default(&tmp.path().join("absent.json"));
        assert_eq!(value, Value::Null);
    }

    #[test]
    fn read_json_or_default_tolerates_corrupt_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("broken.json");
        fs::write(&path, "{not json").unwrap();
        let value: serde_json::Map<String, Value> = read_json_or_default(&path);
        assert!(value.is_empty());
    }

    #[test]
    fn json_round_trip() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("data.json");
        let data = json!({"name": "stack", "count": 3});
        write_json_file(&path, &data, true).unwrap();
        let loaded: Value = read_json_file(&path).unwrap();
        assert_eq!(loaded, data);
    }

    #[test]
    fn read_json_file_fails_on_malformed_content() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("broken.json");
        fs::write(&path, "{oops").unwrap();
        let result: Result<Value> = read_json_file(&path);
        assert!(result.is_err());
    }
}
