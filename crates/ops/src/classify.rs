//! Content classification of a repository at one reference

use migsweep_config::CleanupConfig;
use migsweep_errors::{Error, OpsError};
use migsweep_repository::HostingClient;
use migsweep_types::{ContentEntry, ContentSummary, RepoId, VersionsListing};

/// Inspect `repo` at `reference` and summarize its migration toolchain
///
/// An empty repository (root listing `NotFound`) has an empty summary. A
/// missing migrations or versions listing counts as absent.
///
/// # Errors
///
/// Returns `OpsError::Classification` when a tracked path exists but is not a
/// directory. Transport and credential errors are returned unchanged.
pub async fn classify(
    host: &dyn HostingClient,
    repo: &RepoId,
    reference: &str,
    cleanup: &CleanupConfig,
) -> Result<ContentSummary, Error> {
    let root = match host.list_root(repo, reference).await {
        Ok(entries) => entries,
        Err(e) if e.is_not_found() => return Ok(ContentSummary::default()),
        Err(e) => return Err(contextualize(repo, e)),
    };

    let config_file = find(&root, &cleanup.config_file);
    let migrations_dir = find(&root, &cleanup.migrations_dir);

    let mut versions = VersionsListing::Absent;
    if let Some(migrations) = &migrations_dir {
        ensure_dir(repo, migrations)?;
        if let Some(children) = list_or_absent(host, repo, &migrations.path, reference).await? {
            if let Some(versions_dir) = find(&children, &cleanup.versions_dir) {
                ensure_dir(repo, &versions_dir)?;
                if let Some(entries) =
                    list_or_absent(host, repo, &versions_dir.path, reference).await?
                {
                    versions = VersionsListing::Listed(entries);
                }
            }
        }
    }

    Ok(ContentSummary {
        config_file,
        migrations_dir,
        versions,
    })
}

fn find(entries: &[ContentEntry], name: &str) -> Option<ContentEntry> {
    entries.iter().find(|entry| entry.name == name).cloned()
}

fn ensure_dir(repo: &RepoId, entry: &ContentEntry) -> Result<(), Error> {
    if entry.is_dir() {
        Ok(())
    } else {
        Err(OpsError::Classification {
            repository: repo.to_string(),
            message: format!("{} is not a directory", entry.path),
        }
        .into())
    }
}

async fn list_or_absent(
    host: &dyn HostingClient,
    repo: &RepoId,
    path: &str,
    reference: &str,
) -> Result<Option<Vec<ContentEntry>>, Error> {
    match host.list_dir(repo, path, reference).await {
        Ok(entries) => Ok(Some(entries)),
        Err(e) if e.is_not_found() => Ok(None),
        Err(e) => Err(contextualize(repo, e)),
    }
}

fn contextualize(repo: &RepoId, err: Error) -> Error {
    if err.is_not_a_directory() {
        OpsError::Classification {
            repository: repo.to_string(),
            message: err.to_string(),
        }
        .into()
    } else {
        err
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use migsweep_repository::MemoryHost;
    use migsweep_types::Repository;

    async fn summarize(files: &[(&str, &str)]) -> Result<ContentSummary, Error> {
        let host = MemoryHost::new("sweeper");
        let id = RepoId::new("clld", "afbo");
        host.add_repository(Repository::new(id.clone(), "master"), files.iter().copied());
        classify(&host, &id, "master", &CleanupConfig::default()).await
    }

    #[tokio::test]
    async fn test_full_toolchain() {
        let summary = summarize(&[
            ("alembic.ini", "a"),
            ("migrations/env.py", "b"),
            ("migrations/versions/1_init.py", "c"),
        ])
        .await
        .unwrap();
        assert!(summary.has_config_file());
        assert!(summary.has_migrations_dir());
        assert_eq!(summary.versions.entries().len(), 1);
        assert_eq!(summary.versions.entries()[0].sha, "c");
    }

    #[tokio::test]
    async fn test_missing_versions_is_absent() {
        let summary = summarize(&[("migrations/env.py", "b")]).await.unwrap();
        assert!(summary.has_migrations_dir());
        assert!(summary.versions.is_absent());
    }

    #[tokio::test]
    async fn test_empty_repository() {
        let summary = summarize(&[]).await.unwrap();
        assert_eq!(summary, ContentSummary::default());
    }

    #[tokio::test]
    async fn test_migrations_file_is_classification_error() {
        let err = summarize(&[("migrations", "x")]).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Ops(OpsError::Classification { .. })
        ));
    }
}
