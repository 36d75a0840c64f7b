//! Integration tests for types

#[cfg(test)]
mod tests {
    use migsweep_types::*;
    use proptest::prelude::*;

    #[test]
    fn test_repo_id_parse() {
        let id: RepoId = "clld/tsammalex".parse().unwrap();
        assert_eq!(id.owner(), "clld");
        assert_eq!(id.name(), "tsammalex");
        assert_eq!(id.to_string(), "clld/tsammalex");
        assert_eq!(id.with_owner("someone").to_string(), "someone/tsammalex");
    }

    #[test]
    fn test_repo_id_rejects_malformed() {
        assert!("tsammalex".parse::<RepoId>().is_err());
        assert!("/tsammalex".parse::<RepoId>().is_err());
        assert!("clld/".parse::<RepoId>().is_err());
        assert!("clld/a/b".parse::<RepoId>().is_err());
    }

    #[test]
    fn test_repo_id_serializes_as_string() {
        let id = RepoId::new("clld", "afbo");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, r#""clld/afbo""#);
        let back: RepoId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn test_repository_display_marks_archived() {
        let mut repo = Repository::new(RepoId::new("clld", "afbo"), "master").archived(true);
        repo.html_url = Some("https://github.com/clld/afbo".into());
        assert_eq!(
            repo.to_string(),
            "clld/afbo: https://github.com/clld/afbo (ARCHIVED)"
        );
    }

    #[test]
    fn test_run_report_counts() {
        let mut report = RunReport::new();
        report.push(RepoId::new("o", "a"), RepoOutcome::SkippedArchived);
        report.push(RepoId::new("o", "b"), RepoOutcome::NotRelevant);
        report.push(
            RepoId::new("o", "c"),
            RepoOutcome::CleanedAndProposed {
                pull_request: PullRequestRef {
                    number: 7,
                    url: "https://github.com/o/c/pull/7".into(),
                },
                removed: vec![DeletionRecord::new(
                    "alembic.ini",
                    DeletionReason::ConfigurationRemoval,
                )],
                failures: Vec::new(),
            },
        );
        report.push(
            RepoId::new("o", "d"),
            RepoOutcome::Error {
                message: "boom".into(),
            },
        );
        report.finish();

        assert_eq!(report.count(OutcomeKind::CleanedAndProposed), 1);
        assert_eq!(report.count(OutcomeKind::Error), 1);
        assert_eq!(report.count(OutcomeKind::CleanedNoOp), 0);
        let cleaned = report.cleaned();
        assert_eq!(cleaned.len(), 1);
        assert_eq!(cleaned[0].0.name(), "c");
        assert_eq!(cleaned[0].1.number, 7);
        assert!(report.finished_at.is_some());
        assert_eq!(
            report.outcome_of(&RepoId::new("o", "a")),
            Some(&RepoOutcome::SkippedArchived)
        );
    }

    #[test]
    fn test_outcome_serialization_is_tagged() {
        let entry = RepoReport {
            repository: RepoId::new("o", "a"),
            outcome: RepoOutcome::NotRelevant,
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["repository"], "o/a");
        assert_eq!(json["outcome"], "not_relevant");
    }

    #[test]
    fn test_output_format_default() {
        assert_eq!(OutputFormat::default(), OutputFormat::Tty);
        assert_eq!(ColorChoice::default(), ColorChoice::Auto);
    }

    proptest! {
        #[test]
        fn prop_repo_id_requires_separator(value in "[A-Za-z0-9_.-]{0,40}") {
            prop_assert!(value.parse::<RepoId>().is_err());
        }
    }
}
