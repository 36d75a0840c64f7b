//! Repository tree entries and the summary derived from them

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of an entry in a repository tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Dir,
    Symlink,
    Submodule,
}

impl EntryKind {
    #[must_use]
    pub fn is_dir(self) -> bool {
        matches!(self, Self::Dir)
    }
}

/// One entry of a directory listing at a given reference
///
/// The `sha` is the blob/tree hash the hosting service requires to authorize
/// a delete of exactly this version of the entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentEntry {
    pub path: String,
    pub name: String,
    pub kind: EntryKind,
    pub sha: String,
}

impl ContentEntry {
    /// Build an entry, deriving the name from the last path component
    pub fn new(path: impl Into<String>, kind: EntryKind, sha: impl Into<String>) -> Self {
        let path = path.into();
        let name = path.rsplit('/').next().unwrap_or_default().to_string();
        Self {
            path,
            name,
            kind,
            sha: sha.into(),
        }
    }

    #[must_use]
    pub fn file(path: &str, sha: &str) -> Self {
        Self::new(path, EntryKind::File, sha)
    }

    #[must_use]
    pub fn dir(path: &str, sha: &str) -> Self {
        Self::new(path, EntryKind::Dir, sha)
    }

    #[must_use]
    pub fn is_dir(&self) -> bool {
        self.kind.is_dir()
    }
}

/// Commit identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommitRef(pub String);

impl CommitRef {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CommitRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// State of the versions directory inside the migrations directory
///
/// `Listed(vec![])` (the directory exists but holds nothing) is a different
/// state from `Absent`, even though relevance treats both the same way.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "state", content = "entries", rename_all = "snake_case")]
pub enum VersionsListing {
    #[default]
    Absent,
    Listed(Vec<ContentEntry>),
}

impl VersionsListing {
    #[must_use]
    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    /// Absent, or present without any entry
    #[must_use]
    pub fn is_absent_or_empty(&self) -> bool {
        match self {
            Self::Absent => true,
            Self::Listed(entries) => entries.is_empty(),
        }
    }

    #[must_use]
    pub fn entries(&self) -> &[ContentEntry] {
        match self {
            Self::Absent => &[],
            Self::Listed(entries) => entries,
        }
    }
}

/// Normalized view of the migration toolchain in one repository at one reference
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ContentSummary {
    pub config_file: Option<ContentEntry>,
    pub migrations_dir: Option<ContentEntry>,
    pub versions: VersionsListing,
}

impl ContentSummary {
    #[must_use]
    pub fn has_config_file(&self) -> bool {
        self.config_file.is_some()
    }

    #[must_use]
    pub fn has_migrations_dir(&self) -> bool {
        self.migrations_dir.is_some()
    }

    #[must_use]
    pub fn has_versions_dir(&self) -> bool {
        !self.versions.is_absent()
    }

    /// Nothing of the migration toolchain is left
    #[must_use]
    pub fn is_clean(&self) -> bool {
        !self.has_config_file() && !self.has_migrations_dir()
    }
}
