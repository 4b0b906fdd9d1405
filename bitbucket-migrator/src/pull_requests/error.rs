//! Pull request replication error types.

use crate::destination::DestinationError;
use crate::templates::TemplateError;
use thiserror::Error;

/// Errors that stop pull request replication for a repository.
#[derive(Debug, Error)]
pub enum ReplicationError {
    /// A GitHub call failed for a specific Bitbucket pull request.
    #[error("Failed to {step} for Bitbucket PR #{pr}: {source}")]
    Destination {
        /// Bitbucket pull request id.
        pr: u64,
        /// What was being done, e.g. "create issue".
        step: &'static str,
        #[source]
        source: DestinationError,
    },

    /// The body or comment could not be rendered.
    #[error(transparent)]
    Template(#[from] TemplateError),
}
