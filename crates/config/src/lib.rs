#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Configuration management for migsweep
//!
//! This crate handles loading and merging configuration from:
//! - Default values (hard-coded)
//! - Configuration file (~/.config/migsweep/config.toml)
//! - Environment variables
//! - CLI flags

pub mod candidates;
pub mod cleanup;
pub mod constants;
pub mod general;

pub use candidates::CandidatesConfig;
pub use cleanup::CleanupConfig;
pub use general::{GeneralConfig, NetworkConfig};

use migsweep_errors::{ConfigError, Error};
use migsweep_types::{ColorChoice, OutputFormat};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub network: NetworkConfig,

    #[serde(default)]
    pub cleanup: CleanupConfig,

    #[serde(default)]
    pub candidates: CandidatesConfig,
}

impl Config {
    /// Get the default config file path
    ///
    /// # Errors
    ///
    /// Returns an error if the system config directory cannot be determined.
    pub fn default_path() -> Result<PathBuf, Error> {
        let config_dir = dirs::config_dir().ok_or_else(|| ConfigError::NotFound {
            path: "config directory".to_string(),
        })?;
        Ok(config_dir
            .join(constants::APP_DIR)
            .join(constants::CONFIG_FILE))
    }

    /// Load configuration from file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or if the file contents
    /// contain invalid TOML syntax that cannot be parsed.
    pub async fn load_from_file(path: &Path) -> Result<Self, Error> {
        let contents = fs::read_to_string(path)
            .await
            .map_err(|_| ConfigError::NotFound {
                path: path.display().to_string(),
            })?;

        let config: Self = toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            message: e.to_string(),
        })?;
        config.validate()?;
        tracing::debug!(path = %path.display(), "loaded configuration file");
        Ok(config)
    }

    /// Load configuration with fallback to defaults
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file exists but cannot be read
    /// or contains invalid TOML syntax.
    pub async fn load() -> Result<Self, Error> {
        let config_path = Self::default_path()?;

        if config_path.exists() {
            Self::load_from_file(&config_path).await
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from an optional path or use default
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be read or parsed
    pub async fn load_or_default(path: Option<&Path>) -> Result<Self, Error> {
        match path {
            Some(config_path) => Self::load_from_file(config_path).await,
            None => Self::load().await,
        }
    }

    /// Merge with environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if environment variables contain invalid values
    /// that cannot be parsed into the expected types.
    pub fn merge_env(&mut self) -> Result<(), Error> {
        // MIGSWEEP_OUTPUT
        if let Ok(output) = std::env::var("MIGSWEEP_OUTPUT") {
            self.general.default_output = match output.as_str() {
                "plain" => OutputFormat::Plain,
                "tty" => OutputFormat::Tty,
                "json" => OutputFormat::Json,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        field: "MIGSWEEP_OUTPUT".to_string(),
                        value: output,
                    }
                    .into())
                }
            };
        }

        // MIGSWEEP_COLOR
        if let Ok(color) = std::env::var("MIGSWEEP_COLOR") {
            self.general.color = match color.as_str() {
                "always" => ColorChoice::Always,
                "auto" => ColorChoice::Auto,
                "never" => ColorChoice::Never,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        field: "MIGSWEEP_COLOR".to_string(),
                        value: color,
                    }
                    .into())
                }
            };
        }

        // MIGSWEEP_API_URL
        if let Ok(url) = std::env::var("MIGSWEEP_API_URL") {
            if url.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "MIGSWEEP_API_URL".to_string(),
                    value: url,
                }
                .into());
            }
            self.network.api_url = url;
        }

        // MIGSWEEP_BRANCH
        if let Ok(branch) = std::env::var("MIGSWEEP_BRANCH") {
            if branch.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "MIGSWEEP_BRANCH".to_string(),
                    value: branch,
                }
                .into());
            }
            self.cleanup.working_branch = branch;
        }

        // MIGSWEEP_ORG
        if let Ok(org) = std::env::var("MIGSWEEP_ORG") {
            if !org.trim().is_empty() {
                self.candidates.organization = Some(org);
            }
        }

        Ok(())
    }

    /// Check values that serde cannot reject on its own
    ///
    /// # Errors
    ///
    /// Returns an error naming the first offending field.
    pub fn validate(&self) -> Result<(), Error> {
        let cleanup = &self.cleanup;
        let required = [
            ("cleanup.config_file", &cleanup.config_file),
            ("cleanup.migrations_dir", &cleanup.migrations_dir),
            ("cleanup.versions_dir", &cleanup.versions_dir),
            ("cleanup.working_branch", &cleanup.working_branch),
        ];
        for (field, value) in required {
            if value.trim().is_empty() || value.contains("//") {
                return Err(ConfigError::InvalidValue {
                    field: field.to_string(),
                    value: value.clone(),
                }
                .into());
            }
        }
        // Matched against a single listing entry, so no nesting
        let names = [
            ("cleanup.config_file", &cleanup.config_file),
            ("cleanup.migrations_dir", &cleanup.migrations_dir),
            ("cleanup.versions_dir", &cleanup.versions_dir),
        ];
        if let Some((field, value)) = names.into_iter().find(|(_, value)| value.contains('/')) {
            return Err(ConfigError::InvalidValue {
                field: field.to_string(),
                value: value.clone(),
            }
            .into());
        }
        if cleanup.deprecated_suffixes.is_empty()
            || cleanup.deprecated_suffixes.iter().any(String::is_empty)
        {
            return Err(ConfigError::Invalid {
                message: "cleanup.deprecated_suffixes must list at least one non-empty suffix"
                    .to_string(),
            }
            .into());
        }
        Ok(())
    }

    /// Resolve the access token: explicit value first, then the environment
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingCredential` when no source provides a
    /// non-empty token.
    pub fn resolve_token(explicit: Option<&str>) -> Result<String, Error> {
        if let Some(token) = explicit.map(str::trim).filter(|t| !t.is_empty()) {
            return Ok(token.to_string());
        }
        constants::TOKEN_ENV_VARS
            .iter()
            .filter_map(|var| std::env::var(var).ok())
            .map(|value| value.trim().to_string())
            .find(|value| !value.is_empty())
            .ok_or_else(|| ConfigError::MissingCredential.into())
    }

    /// Directory for debug log files
    #[must_use]
    pub fn logs_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join(constants::APP_DIR)
            .join(constants::LOGS_DIR)
    }
}
