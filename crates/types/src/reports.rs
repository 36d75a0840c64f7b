//! Report type definitions for cleanup runs

use crate::{RepoId, Repository};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Why a path was deleted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeletionReason {
    /// A revision file matching a deprecated suffix
    MatchedPattern,
    /// A file removed while deleting the migrations tree
    DirectoryRemoval,
    /// The toolchain configuration file
    ConfigurationRemoval,
}

impl fmt::Display for DeletionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MatchedPattern => write!(f, "deprecated revision"),
            Self::DirectoryRemoval => write!(f, "migrations directory removal"),
            Self::ConfigurationRemoval => write!(f, "configuration removal"),
        }
    }
}

/// A path deleted on the working branch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletionRecord {
    pub path: String,
    pub reason: DeletionReason,
}

impl DeletionRecord {
    pub fn new(path: impl Into<String>, reason: DeletionReason) -> Self {
        Self {
            path: path.into(),
            reason,
        }
    }
}

/// A delete that was attempted and rejected
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletionFailure {
    pub path: String,
    pub reason: DeletionReason,
    pub message: String,
}

/// Why a relevant repository ended without deletions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoOpReason {
    /// The working branch already holds nothing to delete
    NothingToDelete,
    /// The configuration file exists without a migrations directory
    ConfigWithoutMigrations,
    /// Every attempted delete failed
    AllDeletionsFailed,
}

impl fmt::Display for NoOpReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NothingToDelete => write!(f, "nothing left to delete"),
            Self::ConfigWithoutMigrations => {
                write!(f, "configuration file without migrations directory, don't know what to do")
            }
            Self::AllDeletionsFailed => write!(f, "every deletion failed"),
        }
    }
}

/// What the cleanup orchestrator did to one working branch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "records", rename_all = "snake_case")]
pub enum CleanupResult {
    NoOp { reason: NoOpReason },
    /// Only deprecated revision files were removed
    FilesRemoved(Vec<DeletionRecord>),
    /// The migrations tree and/or configuration file were removed as well
    ConfigurationRemoved(Vec<DeletionRecord>),
}

impl CleanupResult {
    #[must_use]
    pub fn records(&self) -> &[DeletionRecord] {
        match self {
            Self::NoOp { .. } => &[],
            Self::FilesRemoved(records) | Self::ConfigurationRemoved(records) => records,
        }
    }

    #[must_use]
    pub fn is_noop(&self) -> bool {
        matches!(self, Self::NoOp { .. })
    }
}

/// Result of cleaning one repository's working fork
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleanupReport {
    pub fork: Repository,
    pub branch: String,
    /// Whether the working branch was created by this invocation
    pub branch_created: bool,
    pub result: CleanupResult,
    pub failures: Vec<DeletionFailure>,
}

/// Reference to an opened pull request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestRef {
    pub number: u64,
    pub url: String,
}

impl fmt::Display for PullRequestRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} {}", self.number, self.url)
    }
}

/// Outcome of processing one candidate repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RepoOutcome {
    SkippedArchived,
    NotRelevant,
    CleanedAndProposed {
        pull_request: PullRequestRef,
        removed: Vec<DeletionRecord>,
        failures: Vec<DeletionFailure>,
    },
    CleanedNoOp {
        reason: NoOpReason,
        failures: Vec<DeletionFailure>,
    },
    Error {
        message: String,
    },
}

impl RepoOutcome {
    #[must_use]
    pub fn kind(&self) -> OutcomeKind {
        match self {
            Self::SkippedArchived => OutcomeKind::SkippedArchived,
            Self::NotRelevant => OutcomeKind::NotRelevant,
            Self::CleanedAndProposed { .. } => OutcomeKind::CleanedAndProposed,
            Self::CleanedNoOp { .. } => OutcomeKind::CleanedNoOp,
            Self::Error { .. } => OutcomeKind::Error,
        }
    }
}

/// Discriminant of [`RepoOutcome`], used for counting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    SkippedArchived,
    NotRelevant,
    CleanedAndProposed,
    CleanedNoOp,
    Error,
}

impl fmt::Display for OutcomeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::SkippedArchived => "skipped (archived)",
            Self::NotRelevant => "not relevant",
            Self::CleanedAndProposed => "cleaned and proposed",
            Self::CleanedNoOp => "cleaned (no-op)",
            Self::Error => "error",
        };
        f.write_str(label)
    }
}

/// One line of the run report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoReport {
    pub repository: RepoId,
    #[serde(flatten)]
    pub outcome: RepoOutcome,
}

/// Aggregated result of one run over the candidate repositories
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub entries: Vec<RepoReport>,
}

impl RunReport {
    #[must_use]
    pub fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            finished_at: None,
            entries: Vec::new(),
        }
    }

    pub fn push(&mut self, repository: RepoId, outcome: RepoOutcome) {
        self.entries.push(RepoReport {
            repository,
            outcome,
        });
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    #[must_use]
    pub fn count(&self, kind: OutcomeKind) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.outcome.kind() == kind)
            .count()
    }

    /// Repositories for which a pull request was opened, in run order
    #[must_use]
    pub fn cleaned(&self) -> Vec<(&RepoId, &PullRequestRef)> {
        self.entries
            .iter()
            .filter_map(|entry| match &entry.outcome {
                RepoOutcome::CleanedAndProposed { pull_request, .. } => {
                    Some((&entry.repository, pull_request))
                }
                _ => None,
            })
            .collect()
    }

    #[must_use]
    pub fn outcome_of(&self, repository: &RepoId) -> Option<&RepoOutcome> {
        self.entries
            .iter()
            .find(|entry| &entry.repository == repository)
            .map(|entry| &entry.outcome)
    }
}

impl Default for RunReport {
    fn default() -> Self {
        Self::new()
    }
}
