//! Ignore policy for OS and filesystem metadata artifacts.
//!
//! Files matching the policy never count towards folder statistics
//! and are never reported as extra or missing.

use std::collections::BTreeSet;

/// Filenames that are always junk regardless of location.
const DEFAULT_IGNORED_NAMES: &[&str] = &[
    ".DS_Store",
    "Thumbs.db",
    "@eaDir",
    "desktop.ini",
    "ehthumbs.db",
    "._.DS_Store",
];

/// Synology extended-attribute stream markers appended to regular filenames.
const DEFAULT_IGNORED_SUFFIXES: &[&str] = &["@SynoEAStream", "@SynoResource"];

/// Decides whether a filename is a junk artifact to exclude from comparisons.
#[derive(Debug, Clone)]
pub struct IgnorePolicy {
    names: BTreeSet<String>,
    suffixes: Vec<String>,
}

impl Default for IgnorePolicy {
    fn default() -> Self {
        Self {
            names: DEFAULT_IGNORED_NAMES.iter().map(|&name| name.to_string()).collect(),
            suffixes: DEFAULT_IGNORED_SUFFIXES.iter().map(|&suffix| suffix.to_string()).collect(),
        }
    }
}

impl IgnorePolicy {
    /// Create a policy with extra names and suffixes on top of the defaults.
    #[must_use]
    pub fn with_extra(extra_names: &[String], extra_suffixes: &[String]) -> Self {
        let mut policy = Self::default();
        policy.names.extend(extra_names.iter().cloned());
        policy.suffixes.extend(extra_suffixes.iter().cloned());
        policy
    }

    /// Check if the given filename should be excluded from all comparisons.
    #[must_use]
    pub fn is_ignored(&self, filename: &str) -> bool {
        self.names.contains(filename) || self.suffixes.iter().any(|suffix| filename.ends_with(suffix))
    }
}
