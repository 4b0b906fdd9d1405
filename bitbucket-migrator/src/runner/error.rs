//! Runner error types.

/// Errors that can occur while migrating a repository.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// Bitbucket API errors.
    #[error(transparent)]
    Source(#[from] crate::source::SourceError),

    /// Clone, transformation or push errors.
    #[error(transparent)]
    Mirror(#[from] crate::mirror::MirrorError),

    /// GitHub client initialization errors.
    #[error(transparent)]
    Destination(#[from] crate::destination::DestinationError),

    /// Repository creation and settings errors.
    #[error(transparent)]
    Provision(#[from] crate::provisioning::ProvisionError),

    /// Pull request replication errors.
    #[error(transparent)]
    Replication(#[from] crate::pull_requests::ReplicationError),
}
