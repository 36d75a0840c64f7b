//! Run coordination over a list of candidate repositories

use crate::classify::classify;
use crate::cleanup::Cleaner;
use crate::publish::publish;
use crate::relevance::is_relevant;
use crate::OpsCtx;
use migsweep_errors::{ConfigError, Error};
use migsweep_events::{EventEmitter, SweepEvent};
use migsweep_types::{CleanupResult, OutcomeKind, RepoId, RepoOutcome, RunReport};
use tracing::Instrument;

/// Decide which repositories to process
///
/// Repositories named explicitly win, then `candidates.repositories` from the
/// configuration, then every repository of `candidates.organization` sorted
/// by full name. Duplicates are dropped, keeping the first occurrence.
///
/// # Errors
///
/// Returns `ConfigError::NoCandidates` if no source yields a repository, and
/// any error raised while listing the organization.
pub async fn resolve_candidates(ctx: &OpsCtx, explicit: &[RepoId]) -> Result<Vec<RepoId>, Error> {
    let candidates = &ctx.config.candidates;
    let mut resolved: Vec<RepoId> = if !explicit.is_empty() {
        explicit.to_vec()
    } else if !candidates.repositories.is_empty() {
        candidates
            .repositories
            .iter()
            .map(|value| value.parse())
            .collect::<Result<_, _>>()?
    } else if let Some(org) = &candidates.organization {
        let mut ids: Vec<RepoId> = ctx
            .host()
            .list_organization_repositories(org)
            .await?
            .into_iter()
            .map(|repo| repo.id)
            .collect();
        ids.sort();
        ids
    } else {
        Vec::new()
    };

    let mut seen = std::collections::HashSet::new();
    resolved.retain(|id| seen.insert(id.clone()));

    if resolved.is_empty() {
        return Err(ConfigError::NoCandidates.into());
    }
    Ok(resolved)
}

/// Process every candidate in order and collect the outcomes
///
/// A failure inside one repository is recorded as its outcome and never
/// stops the run.
pub async fn run(ctx: &OpsCtx, candidates: &[RepoId]) -> RunReport {
    let mut report = RunReport::new();
    ctx.emit_sweep(SweepEvent::RunStarted {
        candidates: candidates.len(),
    });

    for id in candidates {
        ctx.emit_sweep(SweepEvent::RepositoryStarted {
            repository: id.clone(),
        });

        let outcome = match process(ctx, id)
            .instrument(tracing::info_span!("repository", repository = %id))
            .await
        {
            Ok(outcome) => outcome,
            Err(e) => RepoOutcome::Error {
                message: e.to_string(),
            },
        };

        ctx.emit_sweep(SweepEvent::RepositoryFinished {
            repository: id.clone(),
            outcome: outcome.kind(),
            detail: detail(&outcome),
        });
        report.push(id.clone(), outcome);
    }

    report.finish();
    ctx.emit_sweep(SweepEvent::RunCompleted {
        total: report.entries.len(),
        cleaned: report.count(OutcomeKind::CleanedAndProposed),
        errors: report.count(OutcomeKind::Error),
    });
    report
}

async fn process(ctx: &OpsCtx, id: &RepoId) -> Result<RepoOutcome, Error> {
    let repository = ctx.host().repository(id).await?;
    if repository.archived {
        return Ok(RepoOutcome::SkippedArchived);
    }

    let summary = classify(
        ctx.host(),
        id,
        &repository.default_branch,
        ctx.cleanup(),
    )
    .await?;
    let relevant = is_relevant(&summary, &ctx.matcher);
    ctx.emit_sweep(SweepEvent::Classified {
        repository: id.clone(),
        reference: repository.default_branch.clone(),
        config_file: summary.has_config_file(),
        migrations_dir: summary.has_migrations_dir(),
        versions_dir: summary.has_versions_dir(),
        version_files: summary.versions.entries().len(),
        relevant,
    });
    if !relevant {
        return Ok(RepoOutcome::NotRelevant);
    }

    let cleanup = Cleaner::new(ctx).clean(&repository).await?;
    if let CleanupResult::NoOp { reason } = cleanup.result {
        return Ok(RepoOutcome::CleanedNoOp {
            reason,
            failures: cleanup.failures,
        });
    }

    let pull_request = publish(ctx, &repository, &cleanup).await?;
    Ok(RepoOutcome::CleanedAndProposed {
        pull_request,
        removed: cleanup.result.records().to_vec(),
        failures: cleanup.failures,
    })
}

fn detail(outcome: &RepoOutcome) -> Option<String> {
    match outcome {
        RepoOutcome::CleanedAndProposed { pull_request, .. } => Some(pull_request.url.clone()),
        RepoOutcome::CleanedNoOp { reason, .. } => Some(reason.to_string()),
        RepoOutcome::Error { message } => Some(message.clone()),
        RepoOutcome::SkippedArchived | RepoOutcome::NotRelevant => None,
    }
}
