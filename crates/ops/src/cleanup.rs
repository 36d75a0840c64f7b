//! Cleanup of one repository through a fork and a working branch

use crate::classify::classify;
use crate::OpsCtx;
use migsweep_errors::Error;
use migsweep_events::{EventEmitter, FailureContext, SweepEvent};
use migsweep_types::{
    CleanupReport, CleanupResult, ContentEntry, DeletionFailure, DeletionReason, DeletionRecord,
    NoOpReason, RepoId, Repository,
};
use std::time::Duration;

/// Deletions attempted on the working branch so far
#[derive(Debug, Default)]
struct Ledger {
    records: Vec<DeletionRecord>,
    failures: Vec<DeletionFailure>,
}

/// Drives the cleanup of a single repository
///
/// Every change lands on a branch of the acting account's fork; the source
/// repository is only ever read.
pub struct Cleaner<'a> {
    ctx: &'a OpsCtx,
}

impl<'a> Cleaner<'a> {
    #[must_use]
    pub fn new(ctx: &'a OpsCtx) -> Self {
        Self { ctx }
    }

    /// Fork `repo`, stage deletions on the working branch, and report them
    ///
    /// Individual delete failures are recorded in the report and do not stop
    /// the cleanup.
    ///
    /// # Errors
    ///
    /// Returns an error if the fork or the working branch cannot be set up,
    /// or if the working branch cannot be classified.
    pub async fn clean(&self, repo: &Repository) -> Result<CleanupReport, Error> {
        let cleanup = self.ctx.cleanup();
        let branch = cleanup.working_branch.as_str();

        let fork = self.ensure_fork(repo).await?;
        let branch_created = self.ensure_branch(repo, &fork.id, branch).await?;

        let mut ledger = Ledger::default();

        let initial = classify(self.ctx.host(), &fork.id, branch, cleanup).await?;
        for entry in initial.versions.entries() {
            if entry.is_dir() || !self.ctx.matcher.matches(&entry.path) {
                continue;
            }
            let message = format!("delete {}", entry.path);
            let reason = DeletionReason::MatchedPattern;
            if self
                .delete(&fork.id, branch, entry, reason, &message, &mut ledger.failures)
                .await
            {
                ledger
                    .records
                    .push(DeletionRecord::new(entry.path.clone(), reason));
            }
        }
        let revisions_deleted = ledger.records.len();

        let summary = classify(self.ctx.host(), &fork.id, branch, cleanup).await?;
        if summary.has_config_file() && !summary.has_migrations_dir() && revisions_deleted == 0 {
            return Ok(self
                .finish_noop(
                    fork,
                    branch,
                    branch_created,
                    NoOpReason::ConfigWithoutMigrations,
                    ledger.failures,
                )
                .await);
        }

        if !summary.has_migrations_dir() || summary.versions.is_absent_or_empty() {
            let tree_removed = match &summary.migrations_dir {
                Some(migrations) => {
                    self.remove_tree(&fork.id, branch, migrations, &mut ledger.failures)
                        .await
                }
                // The revisions deleted above were the last files below it
                None => revisions_deleted > 0 && initial.has_migrations_dir(),
            };
            let tree = summary
                .migrations_dir
                .as_ref()
                .or(initial.migrations_dir.as_ref());
            if let (true, Some(tree)) = (tree_removed, tree) {
                ledger.records.push(DeletionRecord::new(
                    format!("{}/", tree.path),
                    DeletionReason::DirectoryRemoval,
                ));
            }

            if let Some(config) = &summary.config_file {
                let message = format!("delete '{}'", config.path);
                let reason = DeletionReason::ConfigurationRemoval;
                if self
                    .delete(&fork.id, branch, config, reason, &message, &mut ledger.failures)
                    .await
                {
                    ledger
                        .records
                        .push(DeletionRecord::new(config.path.clone(), reason));
                }
            }
        }

        if ledger.records.is_empty() {
            let reason = if ledger.failures.is_empty() {
                NoOpReason::NothingToDelete
            } else {
                NoOpReason::AllDeletionsFailed
            };
            return Ok(self
                .finish_noop(fork, branch, branch_created, reason, ledger.failures)
                .await);
        }

        let configuration_touched = ledger
            .records
            .iter()
            .any(|record| record.reason != DeletionReason::MatchedPattern);
        let result = if configuration_touched {
            CleanupResult::ConfigurationRemoved(ledger.records)
        } else {
            CleanupResult::FilesRemoved(ledger.records)
        };

        Ok(CleanupReport {
            fork,
            branch: branch.to_string(),
            branch_created,
            result,
            failures: ledger.failures,
        })
    }

    async fn ensure_fork(&self, repo: &Repository) -> Result<Repository, Error> {
        let host = self.ctx.host();
        let fork = match host.create_fork(&repo.id).await {
            Ok(fork) => fork,
            Err(e) if e.is_already_exists() => {
                let login = host.authenticated_user().await?;
                host.repository(&repo.id.with_owner(login)).await?
            }
            Err(e) => return Err(e),
        };
        self.ctx.emit_sweep(SweepEvent::ForkReady {
            source: repo.id.clone(),
            fork: fork.id.clone(),
        });
        pause(self.ctx.cleanup().fork_settle_delay()).await;
        Ok(fork)
    }

    /// Returns whether the branch was created by this call
    async fn ensure_branch(
        &self,
        repo: &Repository,
        fork: &RepoId,
        branch: &str,
    ) -> Result<bool, Error> {
        let host = self.ctx.host();
        let head = host.default_branch_head(repo).await?;
        let created = match host.create_branch(fork, branch, &head).await {
            Ok(()) => {
                pause(self.ctx.cleanup().mutation_settle_delay()).await;
                true
            }
            // An existing branch is reused at whatever tip it has
            Err(e) if e.is_already_exists() => false,
            Err(e) => return Err(e),
        };
        self.ctx.emit_sweep(SweepEvent::BranchReady {
            fork: fork.clone(),
            branch: branch.to_string(),
            created,
        });
        Ok(created)
    }

    /// Delete every file below `root`, walking the tree with an explicit stack
    ///
    /// Files of a directory are deleted before its subdirectories are
    /// visited. A directory that cannot be listed is skipped with everything
    /// below it. Returns whether at least one file was deleted.
    async fn remove_tree(
        &self,
        fork: &RepoId,
        branch: &str,
        root: &ContentEntry,
        failures: &mut Vec<DeletionFailure>,
    ) -> bool {
        let message = format!("delete '{}/'", root.path);
        let mut stack = vec![root.path.clone()];
        let mut removed = false;

        while let Some(path) = stack.pop() {
            let entries = match self.ctx.host().list_dir(fork, &path, branch).await {
                Ok(entries) => entries,
                Err(e) => {
                    tracing::warn!(%fork, path = %path, error = %e, "skipping subtree");
                    self.ctx.emit_sweep(SweepEvent::SubtreeSkipped {
                        fork: fork.clone(),
                        path,
                        failure: FailureContext::from_error(&e),
                    });
                    continue;
                }
            };

            let (dirs, files): (Vec<_>, Vec<_>) =
                entries.into_iter().partition(ContentEntry::is_dir);
            for file in &files {
                removed |= self
                    .delete(
                        fork,
                        branch,
                        file,
                        DeletionReason::DirectoryRemoval,
                        &message,
                        failures,
                    )
                    .await;
            }
            stack.extend(dirs.into_iter().rev().map(|dir| dir.path));
        }
        removed
    }

    /// Delete one file, recording a failure instead of returning it
    async fn delete(
        &self,
        fork: &RepoId,
        branch: &str,
        entry: &ContentEntry,
        reason: DeletionReason,
        message: &str,
        failures: &mut Vec<DeletionFailure>,
    ) -> bool {
        match self
            .ctx
            .host()
            .delete_file(fork, &entry.path, &entry.sha, message, branch)
            .await
        {
            Ok(()) => {
                self.ctx.emit_sweep(SweepEvent::FileDeleted {
                    fork: fork.clone(),
                    path: entry.path.clone(),
                    reason,
                });
                pause(self.ctx.cleanup().mutation_settle_delay()).await;
                true
            }
            Err(e) => {
                failures.push(DeletionFailure {
                    path: entry.path.clone(),
                    reason,
                    message: e.to_string(),
                });
                self.ctx.emit_sweep(SweepEvent::DeletionFailed {
                    fork: fork.clone(),
                    path: entry.path.clone(),
                    failure: FailureContext::from_error(&e),
                });
                false
            }
        }
    }

    /// Build a no-op report, dropping the working branch if this run made it
    async fn finish_noop(
        &self,
        fork: Repository,
        branch: &str,
        branch_created: bool,
        reason: NoOpReason,
        failures: Vec<DeletionFailure>,
    ) -> CleanupReport {
        self.ctx.emit_sweep(SweepEvent::NothingDeleted {
            fork: fork.id.clone(),
            reason,
        });

        if branch_created {
            match self.ctx.host().delete_branch(&fork.id, branch).await {
                Ok(()) => self.ctx.emit_sweep(SweepEvent::BranchDiscarded {
                    fork: fork.id.clone(),
                    branch: branch.to_string(),
                }),
                Err(e) => self.ctx.emit_warning_with_context(
                    format!("could not discard branch {branch} on {}", fork.id),
                    e.to_string(),
                ),
            }
        }

        CleanupReport {
            fork,
            branch: branch.to_string(),
            branch_created,
            result: CleanupResult::NoOp { reason },
            failures,
        }
    }
}

async fn pause(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}
