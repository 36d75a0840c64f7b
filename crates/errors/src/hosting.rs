//! Hosting-service error types
//!
//! The variants mirror the answers the core has to tell apart: a rejected
//! credential, a missing path, a path that is a file where a directory was
//! expected, an object that already exists, and everything transport-related.

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[non_exhaustive]
pub enum HostingError {
    #[error("authentication failed: {message}")]
    Authentication { message: String },

    #[error("not found: {path}")]
    NotFound { path: String },

    #[error("not a directory: {path}")]
    NotADirectory { path: String },

    #[error("already exists: {what}")]
    AlreadyExists { what: String },

    #[error("HTTP error {status}: {message}")]
    HttpError { status: u16, message: String },

    #[error("connection timeout to {url}")]
    Timeout { url: String },

    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    #[error("rate limited: retry after {seconds} seconds")]
    RateLimited { seconds: u64 },

    #[error("invalid response from {endpoint}: {message}")]
    InvalidResponse { endpoint: String, message: String },
}

impl HostingError {
    /// Whether this error came from the transport rather than from a
    /// meaningful answer about repository content
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::HttpError { .. }
                | Self::Timeout { .. }
                | Self::ConnectionFailed(_)
                | Self::RateLimited { .. }
                | Self::InvalidResponse { .. }
        )
    }
}

impl UserFacingError for HostingError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::Authentication { .. } => {
                Some("Pass a valid access token as argument or export GH_TOKEN.")
            }
            Self::RateLimited { .. } => Some("Wait for the rate limit window to reset and retry."),
            Self::Timeout { .. } | Self::ConnectionFailed(_) => {
                Some("Check your network connection and retry.")
            }
            _ => None,
        }
    }

    fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout { .. } | Self::ConnectionFailed(_) | Self::RateLimited { .. } => true,
            Self::HttpError { status, .. } => *status >= 500,
            _ => false,
        }
    }

    fn user_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::Authentication { .. } => "hosting.authentication",
            Self::NotFound { .. } => "hosting.not_found",
            Self::NotADirectory { .. } => "hosting.not_a_directory",
            Self::AlreadyExists { .. } => "hosting.already_exists",
            Self::HttpError { .. } => "hosting.http_error",
            Self::Timeout { .. } => "hosting.timeout",
            Self::ConnectionFailed(_) => "hosting.connection_failed",
            Self::RateLimited { .. } => "hosting.rate_limited",
            Self::InvalidResponse { .. } => "hosting.invalid_response",
        };
        Some(code)
    }
}
