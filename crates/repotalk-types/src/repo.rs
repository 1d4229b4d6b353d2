//! Repository identifiers and ingestion digests.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Reference to a GitHub repository by owner and name.
///
/// Both fields are immutable for the lifetime of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoRef {
    pub owner: String,
    pub repo: String,
}

impl RepoRef {
    pub fn new(owner: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
        }
    }

    /// Canonical browser URL for this repository.
    pub fn url(&self) -> String {
        format!("https://github.com/{}/{}", self.owner, self.repo)
    }
}

impl fmt::Display for RepoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

/// Textual digest of a repository, produced once at session open.
///
/// Immutable once set; every prompt built within a session reads the same
/// digest, even if the upstream repository changes afterwards.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RepoDigest {
    /// Human-readable summary, ending with an estimated token count
    /// (e.g. `Estimated tokens: 12.3K`).
    pub summary: String,
    /// Rendered directory tree.
    pub tree: String,
    /// Concatenated file contents with per-file separators.
    pub content: String,
}
