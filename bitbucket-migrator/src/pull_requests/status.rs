//! Replication status types.

use serde::Serialize;
use tracing::debug;

/// What happened to a single Bitbucket pull request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ReplicationStatus {
    /// Open pull request recreated natively.
    PullRequestCreated {
        /// GitHub PR number.
        number: u64,
    },

    /// Merged pull request recorded as a closed issue.
    IssueCreated {
        /// GitHub issue number.
        number: u64,
        /// Whether the merge commit got a comment pointing at the issue.
        commented: bool,
    },

    /// GitHub already had it.
    Skipped {
        /// Reason for skipping.
        reason: String,
    },

    /// Dry-run; nothing was sent.
    DryRun,
}

impl ReplicationStatus {
    /// Returns the status as a string for logging.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PullRequestCreated { .. } => "pull_request_created",
            Self::IssueCreated { .. } => "issue_created",
            Self::Skipped { .. } => "skipped",
            Self::DryRun => "dry_run",
        }
    }
}

/// Per-record outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReplicatedRecord {
    /// Bitbucket pull request id.
    pub id: u64,
    #[serde(flatten)]
    pub status: ReplicationStatus,
}

/// Outcome of replicating one class of pull requests for a repository.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReplicationReport {
    /// Pull requests or issues created on GitHub.
    pub created: usize,
    /// Records GitHub already had.
    pub skipped: usize,
    /// Records in the order they were processed.
    pub records: Vec<ReplicatedRecord>,
}

impl ReplicationReport {
    pub(crate) fn record(&mut self, id: u64, status: ReplicationStatus) {
        match status {
            ReplicationStatus::PullRequestCreated { .. } | ReplicationStatus::IssueCreated { .. } => {
                self.created += 1;
            }
            ReplicationStatus::Skipped { .. } => self.skipped += 1,
            ReplicationStatus::DryRun => {}
        }
        debug!(pr = id, status = status.as_str(), "Recorded replication outcome");
        self.records.push(ReplicatedRecord { id, status });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_recorded_statuses() {
        let mut report = ReplicationReport::default();
        report.record(1, ReplicationStatus::PullRequestCreated { number: 7 });
        report.record(
            2,
            ReplicationStatus::Skipped {
                reason: "already exists".to_string(),
            },
        );
        report.record(3, ReplicationStatus::DryRun);

        assert_eq!(report.created, 1);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.records.len(), 3);
        assert_eq!(report.records[1].status.as_str(), "skipped");
    }

    #[test]
    fn serializes_with_status_tag() {
        let record = ReplicatedRecord {
            id: 42,
            status: ReplicationStatus::IssueCreated {
                number: 5,
                commented: true,
            },
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["status"], "issue_created");
        assert_eq!(json["id"], 42);
    }

    #[test]
    fn log_names_match_serialized_tags() {
        let statuses = [
            ReplicationStatus::PullRequestCreated { number: 1 },
            ReplicationStatus::IssueCreated {
                number: 2,
                commented: false,
            },
            ReplicationStatus::Skipped {
                reason: "already exists".to_string(),
            },
            ReplicationStatus::DryRun,
        ];

        for status in statuses {
            let json = serde_json::to_value(&status).unwrap();
            assert_eq!(json["status"], status.as_str());
        }
    }
}
