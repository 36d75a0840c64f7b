//! Integration tests for the cleanup operations, run against the in-memory host

#[cfg(test)]
mod tests {
    use migsweep_config::{CleanupConfig, Config};
    use migsweep_errors::{ConfigError, Error, HostingError};
    use migsweep_events::{AppEvent, EventReceiver, SweepEvent};
    use migsweep_ops::*;
    use migsweep_repository::{HostingClient, MemoryHost, Mutation};
    use migsweep_types::*;
    use proptest::prelude::*;
    use std::sync::Arc;

    const LOGIN: &str = "sweeper";
    const BRANCH: &str = "remove-deprecated-migrations";

    fn config() -> Config {
        Config {
            cleanup: CleanupConfig::default().without_delays(),
            ..Config::default()
        }
    }

    fn context(host: &Arc<MemoryHost>) -> (OpsCtx, EventReceiver) {
        let (tx, rx) = migsweep_events::channel();
        let ctx = OpsContextBuilder::new()
            .with_host(host.clone())
            .with_event_sender(tx)
            .with_config(config())
            .build()
            .unwrap();
        (ctx, rx)
    }

    fn seed(host: &MemoryHost, id: &RepoId, files: &[(&str, &str)]) -> Repository {
        let repository = Repository::new(id.clone(), "master");
        host.add_repository(repository.clone(), files.iter().copied());
        repository
    }

    fn fork_of(id: &RepoId) -> RepoId {
        id.with_owner(LOGIN)
    }

    fn drain(rx: &mut EventReceiver) -> Vec<SweepEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            if let AppEvent::Sweep(event) = event {
                events.push(event);
            }
        }
        events
    }

    fn file_deletions(host: &MemoryHost) -> Vec<String> {
        host.mutations()
            .into_iter()
            .filter_map(|m| match m {
                Mutation::FileDeleted { path, .. } => Some(path),
                _ => None,
            })
            .collect()
    }

    #[tokio::test]
    async fn test_end_to_end_three_deletions() {
        let host = Arc::new(MemoryHost::new(LOGIN));
        let id = RepoId::new("clld", "afbo");
        seed(
            &host,
            &id,
            &[
                ("alembic.ini", "s-ini"),
                ("migrations/env.py", "s-env"),
                ("migrations/versions/2020_fix_polymorphic_type.py", "s-fix"),
                ("setup.py", "s-setup"),
            ],
        );
        let (ctx, mut rx) = context(&host);

        let report = run(&ctx, &[id.clone()]).await;

        let Some(RepoOutcome::CleanedAndProposed {
            pull_request,
            removed,
            failures,
        }) = report.outcome_of(&id)
        else {
            panic!("unexpected outcome: {:?}", report.outcome_of(&id));
        };
        assert!(failures.is_empty());
        assert_eq!(
            removed,
            &vec![
                DeletionRecord::new(
                    "migrations/versions/2020_fix_polymorphic_type.py",
                    DeletionReason::MatchedPattern
                ),
                DeletionRecord::new("migrations/", DeletionReason::DirectoryRemoval),
                DeletionRecord::new("alembic.ini", DeletionReason::ConfigurationRemoval),
            ]
        );

        // Source untouched, fork branch cleaned
        assert_eq!(host.files(&id, "master").unwrap().len(), 4);
        assert_eq!(
            host.files(&fork_of(&id), BRANCH).unwrap(),
            vec!["setup.py".to_string()]
        );

        let prs = host.pull_requests();
        assert_eq!(prs.len(), 1);
        assert_eq!(prs[0].number, pull_request.number);
        assert_eq!(prs[0].draft.head_ref(), format!("{LOGIN}:{BRANCH}"));
        assert_eq!(prs[0].draft.base, id);
        assert_eq!(prs[0].draft.base_branch, "master");
        assert_eq!(prs[0].draft.title, "Remove deprecated Alembic migrations");
        for path in [
            "migrations/versions/2020_fix_polymorphic_type.py",
            "migrations/",
            "alembic.ini",
        ] {
            assert!(prs[0].draft.body.contains(path), "body misses {path}");
        }

        let messages: Vec<String> = host
            .mutations()
            .into_iter()
            .filter_map(|m| match m {
                Mutation::FileDeleted { message, .. } => Some(message),
                _ => None,
            })
            .collect();
        assert_eq!(
            messages,
            vec![
                "delete migrations/versions/2020_fix_polymorphic_type.py",
                "delete 'migrations/'",
                "delete 'alembic.ini'",
            ]
        );

        let events = drain(&mut rx);
        assert!(events
            .iter()
            .any(|e| matches!(e, SweepEvent::PullRequestOpened { .. })));
        assert!(matches!(
            events.last(),
            Some(SweepEvent::RunCompleted {
                total: 1,
                cleaned: 1,
                errors: 0
            })
        ));
    }

    #[tokio::test]
    async fn test_emptied_versions_removes_whole_toolchain() {
        let host = Arc::new(MemoryHost::new(LOGIN));
        let id = RepoId::new("clld", "wold2");
        seed(
            &host,
            &id,
            &[
                ("alembic.ini", "a"),
                ("migrations/versions/2020_fix_polymorphic_type.py", "b"),
            ],
        );
        let (ctx, _rx) = context(&host);

        let report = run(&ctx, &[id.clone()]).await;

        let Some(RepoOutcome::CleanedAndProposed { removed, .. }) = report.outcome_of(&id) else {
            panic!("unexpected outcome: {:?}", report.outcome_of(&id));
        };
        assert_eq!(
            removed,
            &vec![
                DeletionRecord::new(
                    "migrations/versions/2020_fix_polymorphic_type.py",
                    DeletionReason::MatchedPattern
                ),
                DeletionRecord::new("migrations/", DeletionReason::DirectoryRemoval),
                DeletionRecord::new("alembic.ini", DeletionReason::ConfigurationRemoval),
            ]
        );
        assert!(host.files(&fork_of(&id), BRANCH).unwrap().is_empty());

        let prs = host.pull_requests();
        assert_eq!(prs.len(), 1);
        let listed: Vec<&str> = prs[0]
            .draft
            .body
            .lines()
            .filter(|line| line.starts_with("- "))
            .collect();
        assert_eq!(listed.len(), 3, "body: {}", prs[0].draft.body);
        for (line, path) in listed.iter().zip([
            "migrations/versions/2020_fix_polymorphic_type.py",
            "migrations/",
            "alembic.ini",
        ]) {
            assert!(line.contains(path), "{line} does not list {path}");
        }

        let deleted = host
            .mutations()
            .into_iter()
            .filter(|m| matches!(m, Mutation::FileDeleted { .. }))
            .count();
        assert_eq!(deleted, 2);
    }

    #[tokio::test]
    async fn test_second_run_is_a_noop() {
        let host = Arc::new(MemoryHost::new(LOGIN));
        let id = RepoId::new("clld", "tsammalex");
        seed(
            &host,
            &id,
            &[
                ("alembic.ini", "s-ini"),
                ("migrations/env.py", "s-env"),
                ("migrations/versions/1_init.py", "s-1"),
                ("migrations/versions/2_update_unique_null.py", "s-2"),
            ],
        );
        let (ctx, _rx) = context(&host);

        let first = run(&ctx, &[id.clone()]).await;
        let Some(RepoOutcome::CleanedAndProposed { removed, .. }) = first.outcome_of(&id) else {
            panic!("first run did not propose: {:?}", first.outcome_of(&id));
        };
        // A live revision remains, so only the deprecated one goes
        assert_eq!(
            removed,
            &vec![DeletionRecord::new(
                "migrations/versions/2_update_unique_null.py",
                DeletionReason::MatchedPattern
            )]
        );
        let deletions_after_first = file_deletions(&host).len();

        let second = run(&ctx, &[id.clone()]).await;
        assert_eq!(
            second.outcome_of(&id),
            Some(&RepoOutcome::CleanedNoOp {
                reason: NoOpReason::NothingToDelete,
                failures: Vec::new(),
            })
        );
        assert_eq!(file_deletions(&host).len(), deletions_after_first);
        assert_eq!(host.pull_requests().len(), 1);
        // The reused branch still carries the first run's work
        assert!(host.branches(&fork_of(&id)).contains(&BRANCH.to_string()));
    }

    #[tokio::test]
    async fn test_partial_failure_continues() {
        let host = Arc::new(MemoryHost::new(LOGIN));
        let first = RepoId::new("clld", "afbo");
        let second = RepoId::new("clld", "wals");
        seed(
            &host,
            &first,
            &[
                ("alembic.ini", "s-ini"),
                ("migrations/versions/1_init.py", "s-1"),
                ("migrations/versions/2_fix_polymorphic_type.py", "s-a"),
                ("migrations/versions/3_update_unique_null.py", "s-b"),
            ],
        );
        seed(
            &host,
            &second,
            &[
                ("alembic.ini", "s-ini"),
                ("migrations/versions/1_init.py", "s-1"),
                ("migrations/versions/9_fix_polymorphic_type.py", "s-c"),
            ],
        );
        host.fail_delete(
            &fork_of(&first),
            "migrations/versions/2_fix_polymorphic_type.py",
            HostingError::HttpError {
                status: 409,
                message: "conflict".into(),
            },
        );
        let (ctx, _rx) = context(&host);

        let report = run(&ctx, &[first.clone(), second.clone()]).await;

        let Some(RepoOutcome::CleanedAndProposed {
            removed, failures, ..
        }) = report.outcome_of(&first)
        else {
            panic!("unexpected outcome: {:?}", report.outcome_of(&first));
        };
        assert_eq!(
            removed,
            &vec![DeletionRecord::new(
                "migrations/versions/3_update_unique_null.py",
                DeletionReason::MatchedPattern
            )]
        );
        assert_eq!(failures.len(), 1);
        assert_eq!(
            failures[0].path,
            "migrations/versions/2_fix_polymorphic_type.py"
        );
        assert!(failures[0].message.contains("409"));

        let prs = host.pull_requests();
        assert!(prs[0].draft.body.contains("Could not remove:"));
        assert_eq!(
            report.outcome_of(&second).map(RepoOutcome::kind),
            Some(OutcomeKind::CleanedAndProposed)
        );
        assert_eq!(report.cleaned().len(), 2);
    }

    #[tokio::test]
    async fn test_config_without_migrations_is_unresolvable() {
        let host = Arc::new(MemoryHost::new(LOGIN));
        let id = RepoId::new("clld", "glottolog3");
        seed(&host, &id, &[("alembic.ini", "s-ini"), ("setup.py", "s-setup")]);
        let (ctx, mut rx) = context(&host);

        let report = run(&ctx, &[id.clone()]).await;

        assert_eq!(
            report.outcome_of(&id),
            Some(&RepoOutcome::CleanedNoOp {
                reason: NoOpReason::ConfigWithoutMigrations,
                failures: Vec::new(),
            })
        );
        assert!(file_deletions(&host).is_empty());
        assert!(host.pull_requests().is_empty());
        // The branch this run created is gone again
        assert!(!host.branches(&fork_of(&id)).contains(&BRANCH.to_string()));
        assert!(drain(&mut rx)
            .iter()
            .any(|e| matches!(e, SweepEvent::BranchDiscarded { .. })));
    }

    #[tokio::test]
    async fn test_archived_repository_is_never_forked() {
        let host = Arc::new(MemoryHost::new(LOGIN));
        let id = RepoId::new("clld", "old");
        host.add_repository(
            Repository::new(id.clone(), "master").archived(true),
            [
                ("alembic.ini", "s-ini"),
                ("migrations/versions/1_fix_polymorphic_type.py", "s-1"),
            ],
        );
        let (ctx, _rx) = context(&host);

        let report = run(&ctx, &[id.clone()]).await;

        assert_eq!(report.outcome_of(&id), Some(&RepoOutcome::SkippedArchived));
        assert!(host.mutations().is_empty());
        assert!(!host.has_repository(&fork_of(&id)));
    }

    #[tokio::test]
    async fn test_irrelevant_repository_is_left_alone() {
        let host = Arc::new(MemoryHost::new(LOGIN));
        let id = RepoId::new("clld", "live");
        seed(
            &host,
            &id,
            &[
                ("alembic.ini", "s-ini"),
                ("migrations/versions/1_init.py", "s-1"),
            ],
        );
        let (ctx, _rx) = context(&host);

        let report = run(&ctx, &[id.clone()]).await;

        assert_eq!(report.outcome_of(&id), Some(&RepoOutcome::NotRelevant));
        assert!(host.mutations().is_empty());
    }

    #[tokio::test]
    async fn test_unlistable_subtree_is_skipped() {
        let host = Arc::new(MemoryHost::new(LOGIN));
        let id = RepoId::new("clld", "apics");
        seed(
            &host,
            &id,
            &[
                ("alembic.ini", "s-ini"),
                ("migrations/env.py", "s-env"),
                ("migrations/scripts/a.py", "s-a"),
                ("migrations/templates/b.mako", "s-b"),
            ],
        );
        host.fail_listing(
            &fork_of(&id),
            "migrations/scripts",
            HostingError::NotADirectory {
                path: "migrations/scripts".into(),
            },
        );
        let (ctx, mut rx) = context(&host);

        let report = run(&ctx, &[id.clone()]).await;

        let Some(RepoOutcome::CleanedAndProposed { removed, .. }) = report.outcome_of(&id) else {
            panic!("unexpected outcome: {:?}", report.outcome_of(&id));
        };
        let paths: Vec<&str> = removed.iter().map(|r| r.path.as_str()).collect();
        assert_eq!(paths, vec!["migrations/", "alembic.ini"]);
        assert_eq!(
            host.files(&fork_of(&id), BRANCH).unwrap(),
            vec!["migrations/scripts/a.py".to_string()]
        );
        assert!(drain(&mut rx).iter().any(|e| matches!(
            e,
            SweepEvent::SubtreeSkipped { path, .. } if path == "migrations/scripts"
        )));
    }

    #[tokio::test]
    async fn test_all_deletions_failing_discards_branch() {
        let host = Arc::new(MemoryHost::new(LOGIN));
        let id = RepoId::new("clld", "ewave");
        seed(
            &host,
            &id,
            &[
                ("alembic.ini", "s-ini"),
                ("migrations/versions/1_init.py", "s-1"),
                ("migrations/versions/2_fix_polymorphic_type.py", "s-2"),
            ],
        );
        host.fail_delete(
            &fork_of(&id),
            "migrations/versions/2_fix_polymorphic_type.py",
            HostingError::Timeout {
                url: "memory".into(),
            },
        );
        let (ctx, _rx) = context(&host);

        let report = run(&ctx, &[id.clone()]).await;

        let Some(RepoOutcome::CleanedNoOp { reason, failures }) = report.outcome_of(&id) else {
            panic!("unexpected outcome: {:?}", report.outcome_of(&id));
        };
        assert_eq!(*reason, NoOpReason::AllDeletionsFailed);
        assert_eq!(failures.len(), 1);
        assert!(!host.branches(&fork_of(&id)).contains(&BRANCH.to_string()));
        assert!(host.pull_requests().is_empty());
    }

    #[tokio::test]
    async fn test_existing_fork_is_resolved() {
        let host = Arc::new(MemoryHost::new(LOGIN).with_fork_conflicts());
        let id = RepoId::new("clld", "afbo");
        let source = seed(
            &host,
            &id,
            &[("migrations/versions/1_fix_polymorphic_type.py", "s-1")],
        );
        host.create_fork(&id).await.unwrap();
        let (ctx, _rx) = context(&host);

        let report = Cleaner::new(&ctx).clean(&source).await.unwrap();

        assert_eq!(report.fork.id, fork_of(&id));
        assert!(report.branch_created);
        // Deleting the only revision empties the migrations tree
        assert!(matches!(report.result, CleanupResult::ConfigurationRemoved(_)));
        let paths: Vec<&str> = report
            .result
            .records()
            .iter()
            .map(|r| r.path.as_str())
            .collect();
        assert_eq!(
            paths,
            vec!["migrations/versions/1_fix_polymorphic_type.py", "migrations/"]
        );
    }

    #[tokio::test]
    async fn test_errors_are_isolated_per_repository() {
        let host = Arc::new(MemoryHost::new(LOGIN));
        let missing = RepoId::new("clld", "missing");
        let broken = RepoId::new("clld", "broken");
        let fine = RepoId::new("clld", "fine");
        seed(&host, &broken, &[("alembic.ini", "s"), ("migrations", "x")]);
        seed(&host, &fine, &[("README.md", "s")]);
        let (ctx, _rx) = context(&host);

        let report = run(&ctx, &[missing.clone(), broken.clone(), fine.clone()]).await;

        assert_eq!(report.count(OutcomeKind::Error), 2);
        assert_eq!(report.outcome_of(&fine), Some(&RepoOutcome::NotRelevant));
        let Some(RepoOutcome::Error { message }) = report.outcome_of(&broken) else {
            panic!("broken repository did not fail");
        };
        assert!(message.contains("not a directory"));
    }

    #[tokio::test]
    async fn test_candidate_precedence() {
        let host = Arc::new(MemoryHost::new(LOGIN));
        for name in ["zeta", "alpha"] {
            let id = RepoId::new("clld", name);
            seed(&host, &id, &[("README.md", "s")]);
            host.add_to_organization("clld", &id);
        }

        let (tx, _rx) = migsweep_events::channel();
        let mut config = config();
        config.candidates.organization = Some("clld".into());
        let ctx = OpsContextBuilder::new()
            .with_host(host.clone())
            .with_event_sender(tx)
            .with_config(config.clone())
            .build()
            .unwrap();

        let listed = resolve_candidates(&ctx, &[]).await.unwrap();
        assert_eq!(
            listed,
            vec![RepoId::new("clld", "alpha"), RepoId::new("clld", "zeta")]
        );

        let explicit = [RepoId::new("o", "x"), RepoId::new("o", "x")];
        assert_eq!(
            resolve_candidates(&ctx, &explicit).await.unwrap(),
            vec![RepoId::new("o", "x")]
        );

        let (tx, _rx) = migsweep_events::channel();
        config.candidates.repositories = vec!["clld/afbo".into()];
        let ctx = OpsContextBuilder::new()
            .with_host(host.clone())
            .with_event_sender(tx)
            .with_config(config)
            .build()
            .unwrap();
        assert_eq!(
            resolve_candidates(&ctx, &[]).await.unwrap(),
            vec![RepoId::new("clld", "afbo")]
        );
    }

    #[tokio::test]
    async fn test_no_candidates_is_config_error() {
        let host = Arc::new(MemoryHost::new(LOGIN));
        let (ctx, _rx) = context(&host);
        let err = resolve_candidates(&ctx, &[]).await.err().unwrap();
        assert!(matches!(err, Error::Config(ConfigError::NoCandidates)));
    }

    fn matcher() -> DeprecatedRevisionMatcher {
        DeprecatedRevisionMatcher::new(&CleanupConfig::default()).unwrap()
    }

    proptest! {
        #[test]
        fn prop_matcher_ignores_leading_directories(
            prefix in "([a-z0-9_]{1,8}/){0,3}",
            stem in "[a-z0-9_]{0,12}",
            suffix in prop::sample::select(vec![
                "fix_polymorphic_type.py",
                "update_unique_null.py",
            ]),
        ) {
            let m = matcher();
            let path = format!("{prefix}migrations/versions/{stem}{suffix}");
            prop_assert!(m.matches(&path));
        }

        #[test]
        fn prop_matcher_requires_suffix(
            stem in "[a-z0-9_]{0,20}",
            ext in prop::sample::select(vec![".py", ".pyc", ".txt", ""]),
        ) {
            let m = matcher();
            let path = format!("migrations/versions/{stem}{ext}");
            let expected = path.ends_with("fix_polymorphic_type.py")
                || path.ends_with("update_unique_null.py");
            prop_assert_eq!(m.matches(&path), expected);
        }

        #[test]
        fn prop_matcher_requires_versions_prefix(name in "[a-z0-9_/]{0,30}") {
            let m = matcher();
            prop_assume!(!name.contains("migrations/versions/"));
            let path = format!("{name}fix_polymorphic_type.py");
            prop_assert!(!m.matches(&path));
        }
    }
}
