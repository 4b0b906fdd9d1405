//! Processing result types.

use serde::Serialize;

/// Result of migrating a single repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum ProcessingResult {
    /// Every enabled phase completed.
    Migrated {
        /// Repository slug.
        repository: String,
        /// Open pull requests recreated.
        pull_requests_created: usize,
        /// Merged pull requests recorded as issues.
        issues_created: usize,
        /// Pull requests GitHub already had.
        pull_requests_skipped: usize,
    },

    /// A phase failed.
    Failed {
        /// Repository slug.
        repository: String,
        /// Error message.
        error: String,
    },
}

impl ProcessingResult {
    /// Returns the repository this result is for.
    #[must_use]
    pub fn repository(&self) -> &str {
        match self {
            Self::Migrated { repository, .. } | Self::Failed { repository, .. } => repository,
        }
    }
}
