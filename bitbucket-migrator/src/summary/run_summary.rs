//! Run summary types.

use super::result::ProcessingResult;
use serde::Serialize;

/// Summary of a complete run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    /// Number of repositories in the input list.
    pub repositories_requested: usize,

    /// Number of repositories whose migration completed.
    pub repositories_migrated: usize,

    /// Number of repositories that failed.
    pub repositories_failed: usize,

    /// Number of open pull requests recreated.
    pub pull_requests_created: usize,

    /// Number of pull requests skipped as duplicates.
    pub pull_requests_skipped: usize,

    /// Number of closed issues standing in for merged pull requests.
    pub issues_created: usize,

    /// Whether this was a dry run.
    pub dry_run: bool,

    /// Whether a failure stopped the run before every repository was tried.
    pub aborted: bool,

    /// Per-repository results, in processing order.
    pub results: Vec<ProcessingResult>,
}

impl RunSummary {
    /// Creates a new empty summary.
    #[must_use]
    pub fn new(repositories_requested: usize, dry_run: bool) -> Self {
        Self {
            repositories_requested,
            dry_run,
            ..Default::default()
        }
    }

    /// Updates the summary with a processing result.
    pub fn record_result(&mut self, result: ProcessingResult) {
        match &result {
            ProcessingResult::Migrated {
                pull_requests_created,
                issues_created,
                pull_requests_skipped,
                ..
            } => {
                self.repositories_migrated += 1;
                self.pull_requests_created += pull_requests_created;
                self.issues_created += issues_created;
                self.pull_requests_skipped += pull_requests_skipped;
            }
            ProcessingResult::Failed { .. } => self.repositories_failed += 1,
        }
        self.results.push(result);
    }

    /// Returns the number of repositories never attempted.
    #[must_use]
    pub fn repositories_not_attempted(&self) -> usize {
        self.repositories_requested
            .saturating_sub(self.repositories_migrated + self.repositories_failed)
    }

    /// Returns true if any failures occurred.
    #[must_use]
    pub fn has_failures(&self) -> bool {
        self.repositories_failed > 0 || self.aborted
    }

    /// Returns true if every requested repository was migrated.
    #[must_use]
    pub fn all_success(&self) -> bool {
        !self.has_failures() && self.repositories_migrated == self.repositories_requested
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn can_record_result() {
        let mut summary = RunSummary::new(2, false);

        summary.record_result(ProcessingResult::Migrated {
            repository: "api".to_string(),
            pull_requests_created: 2,
            issues_created: 5,
            pull_requests_skipped: 1,
        });

        assert_eq!(summary.repositories_migrated, 1);
        assert_eq!(summary.pull_requests_created, 2);
        assert_eq!(summary.issues_created, 5);
        assert_eq!(summary.pull_requests_skipped, 1);
        assert_eq!(summary.repositories_not_attempted(), 1);
        assert!(!summary.all_success());
        assert!(!summary.has_failures());
    }

    #[test]
    fn failure_is_reported() {
        let mut summary = RunSummary::new(1, false);
        summary.record_result(ProcessingResult::Failed {
            repository: "api".to_string(),
            error: "boom".to_string(),
        });

        assert!(summary.has_failures());
        assert_eq!(summary.results[0].repository(), "api");
    }

    #[test]
    fn empty_run_is_success() {
        assert!(RunSummary::new(0, true).all_success());
    }
}
