//! Provisioning error types.

use crate::destination::DestinationError;
use thiserror::Error;

/// Errors that can occur while creating or configuring a GitHub repository.
#[derive(Debug, Error)]
pub enum ProvisionError {
    /// The repository exists and overwrite is disabled.
    #[error("Repository {repo} already exists on GitHub (enable overwrite to reuse it)")]
    AlreadyExists { repo: String },

    /// Repository creation was rejected.
    #[error("Failed to create repository {repo}: {source}")]
    CreationFailed {
        repo: String,
        #[source]
        source: DestinationError,
    },

    /// The repository never showed up after creation.
    #[error("Repository {repo} was not available after {attempts} attempts")]
    NeverBecameAvailable { repo: String, attempts: u32 },

    /// A settings call failed.
    #[error(transparent)]
    Destination(#[from] DestinationError),
}
