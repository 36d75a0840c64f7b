//! Candidate repository selection

use serde::{Deserialize, Serialize};

/// Which repositories a run looks at
///
/// Explicit repositories win over the organization; the organization is only
/// listed when no repository is named.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CandidatesConfig {
    #[serde(default)]
    pub organization: Option<String>,
    #[serde(default)]
    pub repositories: Vec<String>,
}

impl CandidatesConfig {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.organization.is_none() && self.repositories.is_empty()
    }
}
