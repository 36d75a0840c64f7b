use migsweep_types::{DeletionReason, NoOpReason, OutcomeKind, PullRequestRef, RepoId};
use serde::{Deserialize, Serialize};

use super::FailureContext;

/// Events emitted while sweeping candidate repositories
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SweepEvent {
    /// A run over the candidate list is starting
    RunStarted { candidates: usize },

    /// Processing of one repository begins
    RepositoryStarted { repository: RepoId },

    /// The repository content was classified
    Classified {
        repository: RepoId,
        reference: String,
        config_file: bool,
        migrations_dir: bool,
        versions_dir: bool,
        version_files: usize,
        relevant: bool,
    },

    /// A fork is ready to receive changes
    ForkReady { source: RepoId, fork: RepoId },

    /// The working branch exists on the fork
    BranchReady {
        fork: RepoId,
        branch: String,
        created: bool,
    },

    /// A file was deleted on the working branch
    FileDeleted {
        fork: RepoId,
        path: String,
        reason: DeletionReason,
    },

    /// A delete was rejected; processing continued
    DeletionFailed {
        fork: RepoId,
        path: String,
        failure: FailureContext,
    },

    /// A part of the migrations tree could not be listed and was skipped
    SubtreeSkipped {
        fork: RepoId,
        path: String,
        failure: FailureContext,
    },

    /// Nothing was deleted on the working branch
    NothingDeleted { fork: RepoId, reason: NoOpReason },

    /// A working branch created in this run was removed again
    BranchDiscarded { fork: RepoId, branch: String },

    /// A pull request was opened against the source repository
    PullRequestOpened {
        repository: RepoId,
        pull_request: PullRequestRef,
    },

    /// Processing of one repository ended
    RepositoryFinished {
        repository: RepoId,
        outcome: OutcomeKind,
        detail: Option<String>,
    },

    /// All candidates were processed
    RunCompleted {
        total: usize,
        cleaned: usize,
        errors: usize,
    },
}
