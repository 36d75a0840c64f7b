//! Cleanup configuration: the names the cleanup looks for and how it stages changes

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Names and timings used by the cleanup operations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleanupConfig {
    /// Toolchain configuration file at the repository root
    #[serde(default = "default_config_file")]
    pub config_file: String,
    /// Migrations directory at the repository root
    #[serde(default = "default_migrations_dir")]
    pub migrations_dir: String,
    /// Versions subdirectory inside the migrations directory
    #[serde(default = "default_versions_dir")]
    pub versions_dir: String,
    /// Revision file name endings that mark a revision as deprecated
    #[serde(default = "default_deprecated_suffixes")]
    pub deprecated_suffixes: Vec<String>,
    /// Branch created on the fork to stage deletions
    #[serde(default = "default_working_branch")]
    pub working_branch: String,
    /// Pause after requesting a fork, before its content is queried
    #[serde(default = "default_fork_settle_delay_ms")]
    pub fork_settle_delay_ms: u64,
    /// Pause after each successful remote mutation
    #[serde(default = "default_mutation_settle_delay_ms")]
    pub mutation_settle_delay_ms: u64,
    #[serde(default = "default_pull_request_title")]
    pub pull_request_title: String,
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            config_file: default_config_file(),
            migrations_dir: default_migrations_dir(),
            versions_dir: default_versions_dir(),
            deprecated_suffixes: default_deprecated_suffixes(),
            working_branch: default_working_branch(),
            fork_settle_delay_ms: default_fork_settle_delay_ms(),
            mutation_settle_delay_ms: default_mutation_settle_delay_ms(),
            pull_request_title: default_pull_request_title(),
        }
    }
}

impl CleanupConfig {
    /// Path of the versions directory relative to the repository root
    #[must_use]
    pub fn versions_path(&self) -> String {
        format!("{}/{}", self.migrations_dir, self.versions_dir)
    }

    #[must_use]
    pub fn fork_settle_delay(&self) -> Duration {
        Duration::from_millis(self.fork_settle_delay_ms)
    }

    #[must_use]
    pub fn mutation_settle_delay(&self) -> Duration {
        Duration::from_millis(self.mutation_settle_delay_ms)
    }

    /// Same settings without any pauses
    #[must_use]
    pub fn without_delays(mut self) -> Self {
        self.fork_settle_delay_ms = 0;
        self.mutation_settle_delay_ms = 0;
        self
    }
}

fn default_config_file() -> String {
    "alembic.ini".to_string()
}

fn default_migrations_dir() -> String {
    "migrations".to_string()
}

fn default_versions_dir() -> String {
    "versions".to_string()
}

fn default_deprecated_suffixes() -> Vec<String> {
    vec![
        "fix_polymorphic_type.py".to_string(),
        "update_unique_null.py".to_string(),
    ]
}

fn default_working_branch() -> String {
    "remove-deprecated-migrations".to_string()
}

fn default_fork_settle_delay_ms() -> u64 {
    1000
}

fn default_mutation_settle_delay_ms() -> u64 {
    250
}

fn default_pull_request_title() -> String {
    "Remove deprecated Alembic migrations".to_string()
}
