//! Pull request publication for a cleaned working branch

use crate::OpsCtx;
use migsweep_errors::{Error, OpsError};
use migsweep_events::{EventEmitter, SweepEvent};
use migsweep_repository::PullRequestDraft;
use migsweep_types::{CleanupReport, PullRequestRef, Repository};
use std::fmt::Write as _;

/// Open a pull request from the report's working branch to `source`
///
/// # Errors
///
/// Returns `OpsError::PublishFailed` if the report holds no deletion or a pull
/// request from the same branch is already open; hosting errors otherwise.
pub async fn publish(
    ctx: &OpsCtx,
    source: &Repository,
    report: &CleanupReport,
) -> Result<PullRequestRef, Error> {
    if report.result.records().is_empty() {
        return Err(OpsError::PublishFailed {
            repository: source.id.to_string(),
            message: "no deletions to propose".to_string(),
        }
        .into());
    }

    let draft = PullRequestDraft {
        head: report.fork.id.clone(),
        head_branch: report.branch.clone(),
        base: source.id.clone(),
        base_branch: source.default_branch.clone(),
        title: ctx.cleanup().pull_request_title.clone(),
        body: render_body(report),
    };

    let pull_request = ctx
        .host()
        .create_pull_request(&draft)
        .await
        .map_err(|e| {
            if e.is_already_exists() {
                OpsError::PublishFailed {
                    repository: source.id.to_string(),
                    message: format!("a pull request from {} is already open", draft.head_ref()),
                }
                .into()
            } else {
                e
            }
        })?;

    ctx.emit_sweep(SweepEvent::PullRequestOpened {
        repository: source.id.clone(),
        pull_request: pull_request.clone(),
    });
    Ok(pull_request)
}

/// Markdown body listing every deletion and failure of the report
#[must_use]
pub fn render_body(report: &CleanupReport) -> String {
    let mut body =
        String::from("This pull request removes deprecated Alembic migration files.\n\n");

    body.push_str("Removed:\n");
    for record in report.result.records() {
        let _ = writeln!(body, "- `{}` ({})", record.path, record.reason);
    }

    if !report.failures.is_empty() {
        body.push_str("\nCould not remove:\n");
        for failure in &report.failures {
            let _ = writeln!(
                body,
                "- `{}` ({}): {}",
                failure.path, failure.reason, failure.message
            );
        }
    }

    let _ = write!(
        body,
        "\n---\nOpened automatically by migsweep {}.\n",
        env!("CARGO_PKG_VERSION")
    );
    body
}
