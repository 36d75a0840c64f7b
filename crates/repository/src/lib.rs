#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Repository hosting access for migsweep
//!
//! The cleanup operations only ever talk to a [`HostingClient`]. Two
//! implementations live here: [`GitHubClient`] for the GitHub REST API and
//! [`MemoryHost`], an in-memory host used by tests.

mod github;
mod memory;

pub use github::GitHubClient;
pub use memory::{MemoryHost, Mutation, PullRequestRecord};

use migsweep_errors::Error;
use migsweep_types::{CommitRef, ContentEntry, PullRequestRef, RepoId, Repository};

/// Everything needed to open a pull request from a fork branch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestDraft {
    pub head: RepoId,
    pub head_branch: String,
    pub base: RepoId,
    pub base_branch: String,
    pub title: String,
    pub body: String,
}

impl PullRequestDraft {
    /// Head reference in `owner:branch` form
    #[must_use]
    pub fn head_ref(&self) -> String {
        format!("{}:{}", self.head.owner(), self.head_branch)
    }
}

/// Operations the cleanup needs from a repository hosting service
///
/// Listing failures are reported distinctly: `HostingError::NotFound` for a
/// missing path, `HostingError::NotADirectory` for a path that is a file, and
/// transport or credential errors for everything else.
#[async_trait::async_trait]
pub trait HostingClient: Send + Sync {
    /// Login of the account the client acts as
    async fn authenticated_user(&self) -> Result<String, Error>;

    async fn repository(&self, id: &RepoId) -> Result<Repository, Error>;

    async fn list_organization_repositories(&self, org: &str) -> Result<Vec<Repository>, Error>;

    /// Entries at the repository root
    async fn list_root(&self, repo: &RepoId, reference: &str) -> Result<Vec<ContentEntry>, Error> {
        self.list_dir(repo, "", reference).await
    }

    /// Entries directly under `path`
    async fn list_dir(
        &self,
        repo: &RepoId,
        path: &str,
        reference: &str,
    ) -> Result<Vec<ContentEntry>, Error>;

    /// Commit at the tip of the repository's default branch
    async fn default_branch_head(&self, repo: &Repository) -> Result<CommitRef, Error>;

    /// Fork `repo` into the acting account; an existing fork is returned as is
    async fn create_fork(&self, repo: &RepoId) -> Result<Repository, Error>;

    /// Create branch `name` at `from`; fails with `AlreadyExists` if it exists
    async fn create_branch(&self, repo: &RepoId, name: &str, from: &CommitRef)
        -> Result<(), Error>;

    async fn delete_branch(&self, repo: &RepoId, name: &str) -> Result<(), Error>;

    /// Delete one file on `branch`, authorized by the entry's `sha`
    async fn delete_file(
        &self,
        repo: &RepoId,
        path: &str,
        sha: &str,
        message: &str,
        branch: &str,
    ) -> Result<(), Error>;

    async fn create_pull_request(&self, draft: &PullRequestDraft) -> Result<PullRequestRef, Error>;

    async fn is_archived(&self, id: &RepoId) -> Result<bool, Error> {
        Ok(self.repository(id).await?.archived)
    }
}
