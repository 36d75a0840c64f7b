#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Core type definitions for migsweep
//!
//! This crate provides the data model shared by the hosting client, the
//! cleanup operations and the CLI: repository identities, tree entries,
//! content summaries, deletion records and run reports.

pub mod content;
pub mod reports;

// Re-export commonly used types
pub use content::{CommitRef, ContentEntry, ContentSummary, EntryKind, VersionsListing};
pub use reports::{
    CleanupReport, CleanupResult, DeletionFailure, DeletionReason, DeletionRecord, NoOpReason,
    OutcomeKind, PullRequestRef, RepoOutcome, RepoReport, RunReport,
};
pub use uuid::Uuid;

use migsweep_errors::{Error, OpsError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Repository identifier in `owner/name` form
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RepoId {
    owner: String,
    name: String,
}

impl RepoId {
    /// Create an identifier from its two halves
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }

    #[must_use]
    pub fn owner(&self) -> &str {
        &self.owner
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The same repository name under another owner (where a fork lands)
    #[must_use]
    pub fn with_owner(&self, owner: impl Into<String>) -> Self {
        Self::new(owner, self.name.clone())
    }
}

impl fmt::Display for RepoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

impl FromStr for RepoId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || {
            Error::from(OpsError::InvalidRepoId {
                value: s.to_string(),
            })
        };
        let (owner, name) = s.trim().split_once('/').ok_or_else(invalid)?;
        if owner.is_empty() || name.is_empty() || name.contains('/') {
            return Err(invalid());
        }
        Ok(Self::new(owner, name))
    }
}

impl TryFrom<String> for RepoId {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<RepoId> for String {
    fn from(id: RepoId) -> Self {
        id.to_string()
    }
}

/// A repository as reported by the hosting service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    pub id: RepoId,
    pub archived: bool,
    pub default_branch: String,
    pub html_url: Option<String>,
    #[serde(default)]
    pub fork: bool,
}

impl Repository {
    #[must_use]
    pub fn new(id: RepoId, default_branch: impl Into<String>) -> Self {
        Self {
            id,
            archived: false,
            default_branch: default_branch.into(),
            html_url: None,
            fork: false,
        }
    }

    #[must_use]
    pub fn archived(mut self, archived: bool) -> Self {
        self.archived = archived;
        self
    }
}

impl fmt::Display for Repository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)?;
        if let Some(url) = &self.html_url {
            write!(f, ": {url}")?;
        }
        if self.archived {
            write!(f, " (ARCHIVED)")?;
        }
        Ok(())
    }
}

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Plain,
    Tty,
    Json,
}

impl Default for OutputFormat {
    fn default() -> Self {
        Self::Tty
    }
}

/// Color output choice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorChoice {
    Always,
    Auto,
    Never,
}

// Implement clap::ValueEnum for ColorChoice
impl clap::ValueEnum for ColorChoice {
    fn value_variants<'a>() -> &'a [Self] {
        &[Self::Always, Self::Auto, Self::Never]
    }

    fn to_possible_value(&self) -> Option<clap::builder::PossibleValue> {
        Some(match self {
            Self::Always => clap::builder::PossibleValue::new("always"),
            Self::Auto => clap::builder::PossibleValue::new("auto"),
            Self::Never => clap::builder::PossibleValue::new("never"),
        })
    }
}

impl Default for ColorChoice {
    fn default() -> Self {
        Self::Auto
    }
}
