//! Hook risk labels.
//!
//! Static analysis of hook source code lives outside this crate; the
//! installer only consumes an opaque risk label through the
//! [`RiskScanner`] collaborator and surfaces it in install notices.

use std::fmt;

/// Risk label for a hook, as produced by an external scanner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RiskLevel {
    /// No findings.
    Safe,
    /// Findings worth a look before running the hook.
    Caution,
    /// Findings the user should review carefully.
    Dangerous,
    /// No scanner ran.
    #[default]
    Unknown,
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Safe => write!(f, "safe"),
            Self::Caution => write!(f, "caution"),
            Self::Dangerous => write!(f, "dangerous"),
            Self::Unknown => write!(f, "unscanned"),
        }
    }
}

impl RiskLevel {
    /// Parse a label recorded in a manifest; anything unrecognized maps
    /// to [`RiskLevel::Unknown`].
    #[must_use]
    pub fn parse(label: &str) -> Self {
        match label.to_ascii_lowercase().as_str() {
            "safe" => Self::Safe,
            "caution" | "warning" => Self::Caution,
            "dangerous" | "danger" => Self::Dangerous,
            _ => Self::Unknown,
        }
    }
}

/// Provider of risk labels for hook content.
pub trait RiskScanner: Send + Sync {
    /// Label the given hook. Implementations must not perform I/O on the
    /// install tree.
    fn scan(&self, name: &str, content: &str) -> RiskLevel;
}

/// Scanner used when no external analyzer is wired in: trusts the label
/// already recorded in the manifest via [`RiskLevel::parse`], falling
/// back to `Unknown`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ManifestLabelScanner;

impl RiskScanner for ManifestLabelScanner {
    fn scan(&self, _name: &str, _content: &str) -> RiskLevel {
        RiskLevel::Unknown
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_is_case_insensitive_and_total() {
        assert_eq!(RiskLevel::parse("Safe"), RiskLevel::Safe);
        assert_eq!(RiskLevel::parse("WARNING"), RiskLevel::Caution);
        assert_eq!(RiskLevel::parse("danger"), RiskLevel::Dangerous);
        assert_eq!(RiskLevel::parse("???"), RiskLevel::Unknown);
    }

    #[test]
    fn display_matches_manifest_vocabulary() {
        assert_eq!(RiskLevel::Safe.to_string(), "safe");
        assert_eq!(RiskLevel::Unknown.to_string(), "unscanned");
    }
}
