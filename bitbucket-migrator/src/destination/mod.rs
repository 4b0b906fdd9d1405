//! Destination platform (GitHub) access.

mod error;
mod github;
mod types;

pub use error::DestinationError;
pub use github::GitHubDestination;
pub use types::{CustomProperty, NewIssue, NewPullRequest, NewRepository, Visibility};

use async_trait::async_trait;

/// Write access to repositories in one destination organization.
#[async_trait]
pub trait DestinationPlatform: Send + Sync {
    /// Organization the repositories are created in.
    fn organization(&self) -> &str;

    /// Creates a repository. Duplicates surface as
    /// [`DestinationError::AlreadyExists`].
    async fn create_repository(&self, request: &NewRepository) -> Result<(), DestinationError>;

    /// Returns whether the repository can be fetched yet.
    async fn repository_exists(&self, repo: &str) -> Result<bool, DestinationError>;

    async fn set_default_branch(&self, repo: &str, branch: &str) -> Result<(), DestinationError>;

    /// Replaces the full topic set.
    async fn replace_topics(&self, repo: &str, topics: &[String]) -> Result<(), DestinationError>;

    async fn set_custom_properties(
        &self,
        repo: &str,
        properties: &[CustomProperty],
    ) -> Result<(), DestinationError>;

    /// Opens an issue and returns its number.
    async fn create_issue(&self, repo: &str, issue: &NewIssue) -> Result<u64, DestinationError>;

    async fn close_issue(&self, repo: &str, number: u64) -> Result<(), DestinationError>;

    /// Comments on a commit.
    async fn create_commit_comment(
        &self,
        repo: &str,
        sha: &str,
        body: &str,
    ) -> Result<(), DestinationError>;

    /// Opens a pull request and returns its number.
    async fn create_pull_request(
        &self,
        repo: &str,
        pull_request: &NewPullRequest,
    ) -> Result<u64, DestinationError>;
}
