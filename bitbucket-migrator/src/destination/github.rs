//! GitHub implementation of the destination platform.

use super::error::DestinationError;
use super::types::{CustomProperty, NewIssue, NewPullRequest, NewRepository};
use super::DestinationPlatform;
use crate::rate_limit::ensure_core_rate_limit;
use async_trait::async_trait;
use octocrab::models::IssueState;
use octocrab::Octocrab;
use serde_json::{json, Value};
use tracing::debug;

/// A GitHub organization, accessed through octocrab.
#[derive(Debug, Clone)]
pub struct GitHubDestination {
    octocrab: Octocrab,
    organization: String,
}

impl GitHubDestination {
    /// Builds a client authenticated with a personal access token.
    ///
    /// # Errors
    ///
    /// Returns [`DestinationError::GitHubError`] if the client cannot be
    /// built.
    pub fn new(token: &str, organization: impl Into<String>) -> Result<Self, DestinationError> {
        let octocrab = Octocrab::builder()
            .personal_token(token.to_string())
            .build()?;
        Ok(Self::from_octocrab(octocrab, organization))
    }

    /// Wraps an already configured octocrab instance.
    pub fn from_octocrab(octocrab: Octocrab, organization: impl Into<String>) -> Self {
        Self {
            octocrab,
            organization: organization.into(),
        }
    }

    fn repo_route(&self, repo: &str, suffix: &str) -> String {
        format!("/repos/{}/{repo}{suffix}", self.organization)
    }

    async fn ensure_rate_limit(&self) -> Result<(), DestinationError> {
        ensure_core_rate_limit(&self.octocrab).await?;
        Ok(())
    }
}

#[async_trait]
impl DestinationPlatform for GitHubDestination {
    fn organization(&self) -> &str {
        &self.organization
    }

    async fn create_repository(&self, request: &NewRepository) -> Result<(), DestinationError> {
        let body = json!({
            "name": request.name,
            "description": request.description,
            "visibility": request.visibility,
            "has_issues": true,
        });

        let _: Value = self
            .octocrab
            .post(format!("/orgs/{}/repos", self.organization), Some(&body))
            .await
            .map_err(DestinationError::from_github)?;
        Ok(())
    }

    async fn repository_exists(&self, repo: &str) -> Result<bool, DestinationError> {
        match self.octocrab.repos(&self.organization, repo).get().await {
            Ok(_) => Ok(true),
            Err(octocrab::Error::GitHub { source, .. }) if source.status_code.as_u16() == 404 => {
                Ok(false)
            }
            Err(e) => Err(DestinationError::from_github(e)),
        }
    }

    async fn set_default_branch(&self, repo: &str, branch: &str) -> Result<(), DestinationError> {
        let _: Value = self
            .octocrab
            .patch(
                self.repo_route(repo, ""),
                Some(&json!({ "default_branch": branch })),
            )
            .await
            .map_err(DestinationError::from_github)?;
        Ok(())
    }

    async fn replace_topics(&self, repo: &str, topics: &[String]) -> Result<(), DestinationError> {
        let _: Value = self
            .octocrab
            .put(
                self.repo_route(repo, "/topics"),
                Some(&json!({ "names": topics })),
            )
            .await
            .map_err(DestinationError::from_github)?;
        Ok(())
    }

    async fn set_custom_properties(
        &self,
        repo: &str,
        properties: &[CustomProperty],
    ) -> Result<(), DestinationError> {
        // Answers 204 with no body, so the raw response is checked instead
        // of being deserialized.
        let route = self.repo_route(repo, "/properties/values");
        let response = self
            .octocrab
            ._patch(route.as_str(), Some(&json!({ "properties": properties })))
            .await
            .map_err(DestinationError::from_github)?;
        octocrab::map_github_error(response)
            .await
            .map_err(DestinationError::from_github)?;
        Ok(())
    }

    async fn create_issue(&self, repo: &str, issue: &NewIssue) -> Result<u64, DestinationError> {
        self.ensure_rate_limit().await?;
        let created = self
            .octocrab
            .issues(&self.organization, repo)
            .create(&issue.title)
            .body(&issue.body)
            .labels(issue.labels.clone())
            .send()
            .await
            .map_err(DestinationError::from_github)?;

        debug!(issue_number = created.number, url = %created.html_url, "Issue created");
        Ok(created.number)
    }

    async fn close_issue(&self, repo: &str, number: u64) -> Result<(), DestinationError> {
        self.octocrab
            .issues(&self.organization, repo)
            .update(number)
            .state(IssueState::Closed)
            .send()
            .await
            .map_err(DestinationError::from_github)?;
        Ok(())
    }

    async fn create_commit_comment(
        &self,
        repo: &str,
        sha: &str,
        body: &str,
    ) -> Result<(), DestinationError> {
        self.ensure_rate_limit().await?;
        let _: Value = self
            .octocrab
            .post(
                self.repo_route(repo, &format!("/commits/{sha}/comments")),
                Some(&json!({ "body": body })),
            )
            .await
            .map_err(DestinationError::from_github)?;
        Ok(())
    }

    async fn create_pull_request(
        &self,
        repo: &str,
        pull_request: &NewPullRequest,
    ) -> Result<u64, DestinationError> {
        if pull_request.head.is_empty() || pull_request.base.is_empty() {
            return Err(DestinationError::InvalidRequest {
                message: format!("pull request '{}' is missing a branch", pull_request.title),
            });
        }

        self.ensure_rate_limit().await?;
        let created = self
            .octocrab
            .pulls(&self.organization, repo)
            .create(&pull_request.title, &pull_request.head, &pull_request.base)
            .body(&pull_request.body)
            .draft(pull_request.draft)
            .send()
            .await
            .map_err(DestinationError::from_github)?;

        Ok(created.number)
    }
}
