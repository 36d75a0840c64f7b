//! Integration tests for events

#[cfg(test)]
mod tests {
    use migsweep_errors::HostingError;
    use migsweep_events::*;
    use migsweep_types::{NoOpReason, OutcomeKind, RepoId};

    #[tokio::test]
    async fn test_emitter_helpers() {
        let (tx, mut rx) = channel();

        tx.emit_warning_with_context("branch kept", "me/afbo");
        tx.emit_debug("test debug");
        tx.emit_sweep(SweepEvent::RunStarted { candidates: 3 });

        let event1 = rx.recv().await.unwrap();
        assert!(matches!(
            event1,
            AppEvent::General(GeneralEvent::Warning {
                context: Some(_),
                ..
            })
        ));

        let event2 = rx.recv().await.unwrap();
        assert!(matches!(
            event2,
            AppEvent::General(GeneralEvent::DebugLog { .. })
        ));

        let event3 = rx.recv().await.unwrap();
        assert!(matches!(
            event3,
            AppEvent::Sweep(SweepEvent::RunStarted { candidates: 3 })
        ));
    }

    #[tokio::test]
    async fn test_dropped_receiver() {
        let (tx, rx) = channel();
        drop(rx);

        // Should not panic when receiver is dropped
        tx.emit_warning("ignored");
    }

    #[test]
    fn test_log_levels() {
        let failed = AppEvent::Sweep(SweepEvent::RepositoryFinished {
            repository: RepoId::new("clld", "afbo"),
            outcome: OutcomeKind::Error,
            detail: Some("boom".into()),
        });
        assert_eq!(failed.log_level(), tracing::Level::ERROR);

        let unresolvable = AppEvent::Sweep(SweepEvent::NothingDeleted {
            fork: RepoId::new("me", "afbo"),
            reason: NoOpReason::ConfigWithoutMigrations,
        });
        assert_eq!(unresolvable.log_level(), tracing::Level::WARN);

        let clean = AppEvent::Sweep(SweepEvent::NothingDeleted {
            fork: RepoId::new("me", "afbo"),
            reason: NoOpReason::NothingToDelete,
        });
        assert_eq!(clean.log_level(), tracing::Level::INFO);
        assert_eq!(clean.log_target(), "migsweep::events::sweep");
    }

    #[test]
    fn test_failure_context_from_error() {
        let err = HostingError::NotFound {
            path: "migrations/versions".into(),
        };
        let ctx = FailureContext::from_error(&err);
        assert_eq!(ctx.code.as_deref(), Some("hosting.not_found"));
        assert!(ctx.message.contains("migrations/versions"));
        assert!(!ctx.retryable);
    }

    #[test]
    fn test_event_serialization_is_tagged() {
        let event = AppEvent::Sweep(SweepEvent::BranchDiscarded {
            fork: RepoId::new("me", "afbo"),
            branch: "remove-deprecated-migrations".into(),
        });
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["domain"], "sweep");
        assert_eq!(json["event"]["type"], "BranchDiscarded");
        assert_eq!(json["event"]["fork"], "me/afbo");
    }
}
