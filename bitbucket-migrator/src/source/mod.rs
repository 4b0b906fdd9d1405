//! Source platform (Bitbucket Cloud) access.
//!
//! The [`SourcePlatform`] trait is the surface the migration pipeline needs
//! from Bitbucket; [`BitbucketClient`] implements it over the REST API.

mod bitbucket;
mod decode;
mod error;
mod permissions;
mod pull_request;
mod types;

pub use bitbucket::{BitbucketClient, DEFAULT_API_BASE};
pub use decode::{decode_pull_request, decode_pull_requests};
pub use error::{DecodeError, SourceError};
pub use permissions::{make_read_only, LockOutcome, READ_ONLY};
pub use pull_request::{
    Account, Content, PullRequest, PullRequestCollection, PullRequestState, Rendered,
};
pub use types::{GroupPermission, RepositoryDescriptor, UserPermission, FALLBACK_BRANCH};

use async_trait::async_trait;

/// Read (and permission) access to repositories in one source workspace.
#[async_trait]
pub trait SourcePlatform: Send + Sync {
    /// Workspace the repositories live in.
    fn workspace(&self) -> &str;

    /// Fetches the repository descriptor.
    async fn repository(&self, repo: &str) -> Result<RepositoryDescriptor, SourceError>;

    /// Lists open and merged pull requests targeting `destination_branch`,
    /// sorted by id.
    async fn pull_requests(
        &self,
        repo: &str,
        destination_branch: &str,
    ) -> Result<PullRequestCollection, SourceError>;

    /// Lists explicit user permissions.
    async fn user_permissions(&self, repo: &str) -> Result<Vec<UserPermission>, SourceError>;

    /// Lists explicit group permissions.
    async fn group_permissions(&self, repo: &str) -> Result<Vec<GroupPermission>, SourceError>;

    /// Sets a user's permission.
    async fn set_user_permission(
        &self,
        repo: &str,
        account_id: &str,
        permission: &str,
    ) -> Result<(), SourceError>;

    /// Sets a group's permission.
    async fn set_group_permission(
        &self,
        repo: &str,
        group_slug: &str,
        permission: &str,
    ) -> Result<(), SourceError>;
}
