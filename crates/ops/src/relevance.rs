//! Decide whether a repository needs cleaning

use crate::pattern::DeprecatedRevisionMatcher;
use migsweep_types::ContentSummary;

/// A repository is relevant when it still carries part of the migration
/// toolchain and its version history is absent, empty, or holds at least one
/// deprecated revision.
#[must_use]
pub fn is_relevant(summary: &ContentSummary, matcher: &DeprecatedRevisionMatcher) -> bool {
    if !summary.has_config_file() && !summary.has_migrations_dir() {
        return false;
    }
    summary.versions.is_absent_or_empty()
        || summary
            .versions
            .entries()
            .iter()
            .any(|entry| matcher.matches(&entry.path))
}
