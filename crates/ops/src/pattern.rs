//! Classification of revision file paths

use migsweep_config::CleanupConfig;
use migsweep_errors::{ConfigError, Error, OpsError};
use regex::Regex;

/// Decides whether a path names a deprecated revision file
///
/// A path matches when it contains `<migrations>/<versions>/`, either at the
/// start or right after a `/`, and the remainder ends with one of the
/// configured suffixes. Matching is case-sensitive.
#[derive(Debug, Clone)]
pub struct DeprecatedRevisionMatcher {
    pattern: Regex,
}

impl DeprecatedRevisionMatcher {
    /// Compile the matcher from the cleanup configuration
    ///
    /// # Errors
    ///
    /// Returns a configuration error when no suffix is configured, and
    /// `OpsError::InvalidPattern` if the resulting expression does not compile.
    pub fn new(config: &CleanupConfig) -> Result<Self, Error> {
        if config.deprecated_suffixes.is_empty()
            || config.deprecated_suffixes.iter().any(String::is_empty)
        {
            return Err(ConfigError::Invalid {
                message: "at least one non-empty deprecated suffix is required".to_string(),
            }
            .into());
        }
        let suffixes = config
            .deprecated_suffixes
            .iter()
            .map(|suffix| regex::escape(suffix))
            .collect::<Vec<_>>()
            .join("|");
        let expression = format!(
            r"(?:^|/){}/.*(?:{suffixes})$",
            regex::escape(&config.versions_path())
        );
        let pattern = Regex::new(&expression).map_err(|e| OpsError::InvalidPattern {
            message: e.to_string(),
        })?;
        Ok(Self { pattern })
    }

    #[must_use]
    pub fn matches(&self, path: &str) -> bool {
        self.pattern.is_match(path)
    }
}
