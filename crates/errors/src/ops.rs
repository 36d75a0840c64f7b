//! Operation orchestration error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[non_exhaustive]
pub enum OpsError {
    #[error("classification of {repository} failed: {message}")]
    Classification { repository: String, message: String },

    #[error("could not publish pull request for {repository}: {message}")]
    PublishFailed { repository: String, message: String },

    #[error("invalid repository identifier: {value}")]
    InvalidRepoId { value: String },

    #[error("invalid deprecated-revision pattern: {message}")]
    InvalidPattern { message: String },

    #[error("component not found: {component}")]
    MissingComponent { component: String },
}

impl UserFacingError for OpsError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::InvalidRepoId { .. } => Some("Repositories are written as OWNER/NAME."),
            Self::Classification { .. } => {
                Some("A tracked migration path is not a directory; inspect the repository by hand.")
            }
            _ => None,
        }
    }

    fn user_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::Classification { .. } => "ops.classification",
            Self::PublishFailed { .. } => "ops.publish_failed",
            Self::InvalidRepoId { .. } => "ops.invalid_repo_id",
            Self::InvalidPattern { .. } => "ops.invalid_pattern",
            Self::MissingComponent { .. } => "ops.missing_component",
        };
        Some(code)
    }
}
