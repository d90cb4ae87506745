//! Error types for stack resolution, installation, and sync.
//!
//! The crate follows a two-layer error strategy: a [`StaxError`] enum for
//! failures callers need to match on programmatically (exit codes, per-target
//! isolation), and `anyhow` context chains everywhere else. Domain errors
//! convert into `anyhow::Error` at module boundaries, so most signatures are
//! plain `anyhow::Result`.

use std::path::PathBuf;
use thiserror::Error;

/// Errors with meaning beyond their message text.
#[derive(Error, Debug)]
pub enum StaxError {
    /// A stack reference could not be resolved to an existing manifest file.
    ///
    /// Raised by the resolver after probing the filesystem, so callers never
    /// receive a path that does not exist.
    #[error("Stack not found: {reference}")]
    StackNotFound {
        /// The reference as the user supplied it (bare name or path)
        reference: String,
    },

    /// A filesystem operation failed during install or sync.
    ///
    /// Install-phase filesystem errors abort the remainder of the run.
    #[error("Filesystem operation '{operation}' failed for {path}")]
    FileSystemError {
        /// The operation that failed (e.g. "write", "create directory")
        operation: String,
        /// The path the operation was applied to
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Two options that cannot be combined were both set.
    ///
    /// Detected before any I/O; the CLI maps this to exit code 1.
    #[error("Options --{first} and --{second} are mutually exclusive")]
    MutuallyExclusiveOptions {
        /// First offending flag
        first: String,
        /// Second offending flag
        second: String,
    },

    /// One sync target failed; the other target is still attempted.
    #[error("Sync to {target} failed: {reason}")]
    SyncTargetError {
        /// Human-readable target name ("Codex" or "Gemini")
        target: String,
        /// What went wrong for this target
        reason: String,
    },
}

impl StaxError {
    /// Wrap an I/O error with the operation and path it applies to.
    pub fn fs(
        operation: impl Into<String>,
        path: impl Into<PathBuf>,
        source: std::io::Error,
    ) -> Self {
        Self::FileSystemError {
            operation: operation.into(),
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_offending_input() {
        let err = StaxError::StackNotFound {
            reference: "web-dev".into(),
        };
        assert_eq!(err.to_string(), "Stack not found: web-dev");

        let err = StaxError::MutuallyExclusiveOptions {
            first: "codex-only".into(),
            second: "gemini-only".into(),
        };
        assert!(err.to_string().contains("--codex-only"));
        assert!(err.to_string().contains("--gemini-only"));
    }

    #[test]
    fn fs_errors_carry_operation_and_path() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = StaxError::fs("write", "/tmp/x.json", io);
        let msg = err.to_string();
        assert!(msg.contains("write"));
        assert!(msg.contains("/tmp/x.json"));
    }
}
