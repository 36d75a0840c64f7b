use serde::{Deserialize, Serialize};

use migsweep_errors::UserFacingError;

/// Structured failure information shared across domains.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureContext {
    /// Stable error code, e.g. `hosting.not_found`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Short user-facing message.
    pub message: String,
    /// Optional remediation hint.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    /// Whether retrying the operation might succeed.
    pub retryable: bool,
}

impl FailureContext {
    #[must_use]
    pub fn new(
        code: Option<impl Into<String>>,
        message: impl Into<String>,
        hint: Option<impl Into<String>>,
        retryable: bool,
    ) -> Self {
        Self {
            code: code.map(Into::into),
            message: message.into(),
            hint: hint.map(Into::into),
            retryable,
        }
    }

    /// Build failure context from a `UserFacingError` implementation.
    #[must_use]
    pub fn from_error<E: UserFacingError + ?Sized>(error: &E) -> Self {
        Self::new(
            error.user_code(),
            error.user_message().into_owned(),
            error.user_hint(),
            error.is_retryable(),
        )
    }
}

pub mod general;
pub mod sweep;

pub use general::*;
pub use sweep::*;

/// Top-level application event enum that aggregates all domain-specific events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "domain", content = "event", rename_all = "snake_case")]
pub enum AppEvent {
    /// General utility events (warnings, debug output)
    General(GeneralEvent),

    /// Repository sweep events (classification, deletions, pull requests)
    Sweep(SweepEvent),
}

impl AppEvent {
    /// Determine the appropriate tracing log level for this event
    #[must_use]
    pub fn log_level(&self) -> tracing::Level {
        use tracing::Level;

        match self {
            Self::Sweep(SweepEvent::RepositoryFinished {
                outcome: migsweep_types::OutcomeKind::Error,
                ..
            }) => Level::ERROR,

            Self::General(GeneralEvent::Warning { .. })
            | Self::Sweep(
                SweepEvent::DeletionFailed { .. }
                | SweepEvent::SubtreeSkipped { .. }
                | SweepEvent::NothingDeleted {
                    reason: migsweep_types::NoOpReason::ConfigWithoutMigrations,
                    ..
                },
            ) => Level::WARN,

            Self::General(GeneralEvent::DebugLog { .. })
            | Self::Sweep(
                SweepEvent::Classified { .. }
                | SweepEvent::BranchReady { .. }
                | SweepEvent::FileDeleted { .. },
            ) => Level::DEBUG,

            _ => Level::INFO,
        }
    }

    /// Get the log target for this event (for structured logging)
    #[must_use]
    pub fn log_target(&self) -> &'static str {
        match self {
            Self::General(_) => "migsweep::events::general",
            Self::Sweep(_) => "migsweep::events::sweep",
        }
    }
}
