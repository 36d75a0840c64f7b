//! CLI error handling

use std::fmt;

use migsweep_errors::UserFacingError;

/// CLI-specific error type
#[derive(Debug)]
pub enum CliError {
    /// Configuration error
    Config(migsweep_errors::ConfigError),
    /// Error raised by the library crates
    Ops(migsweep_errors::Error),
    /// The hosting service rejected or could not verify the credential
    Authentication(migsweep_errors::Error),
    /// I/O error
    Io(std::io::Error),
}

impl CliError {
    fn write_details(f: &mut fmt::Formatter<'_>, e: &migsweep_errors::Error) -> fmt::Result {
        write!(f, "{}", e.user_message())?;
        if let Some(code) = e.user_code() {
            write!(f, "\n  Code: {code}")?;
        }
        if let Some(hint) = e.user_hint() {
            write!(f, "\n  Hint: {hint}")?;
        }
        if e.is_retryable() {
            write!(f, "\n  Retry: safe to retry this operation.")?;
        }
        Ok(())
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Config(e) => write!(f, "Configuration error: {e}"),
            CliError::Ops(e) => Self::write_details(f, e),
            CliError::Authentication(e) => {
                write!(f, "Could not verify the access token: ")?;
                Self::write_details(f, e)
            }
            CliError::Io(e) => write!(f, "I/O error: {e}"),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Config(e) => Some(e),
            CliError::Ops(e) | CliError::Authentication(e) => Some(e),
            CliError::Io(e) => Some(e),
        }
    }
}

impl From<migsweep_errors::ConfigError> for CliError {
    fn from(e: migsweep_errors::ConfigError) -> Self {
        CliError::Config(e)
    }
}

impl From<migsweep_errors::Error> for CliError {
    fn from(e: migsweep_errors::Error) -> Self {
        CliError::Ops(e)
    }
}

impl From<std::io::Error> for CliError {
    fn from(e: std::io::Error) -> Self {
        CliError::Io(e)
    }
}
