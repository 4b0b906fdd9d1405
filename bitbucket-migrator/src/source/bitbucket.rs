//! Bitbucket Cloud REST client.

use super::decode::decode_pull_requests;
use super::error::SourceError;
use super::pull_request::PullRequestCollection;
use super::types::{GroupPermission, RepositoryDescriptor, UserPermission};
use super::SourcePlatform;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

/// Public Bitbucket Cloud API root.
pub const DEFAULT_API_BASE: &str = "https://api.bitbucket.org/2.0";

/// Page size requested from list endpoints (the API maximum for PRs).
const PAGE_LEN: &str = "50";

#[derive(Debug, Deserialize)]
struct BitbucketRepo {
    slug: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    is_private: bool,
    description: Option<String>,
    mainbranch: Option<BitbucketBranch>,
    language: Option<String>,
    project: Option<BitbucketProject>,
}

#[derive(Debug, Deserialize)]
struct BitbucketBranch {
    name: String,
}

#[derive(Debug, Deserialize)]
struct BitbucketProject {
    name: String,
}

#[derive(Debug, Deserialize)]
struct BitbucketPaginated<T> {
    values: Vec<T>,
    next: Option<String>,
}

#[derive(Debug, Deserialize)]
struct BitbucketUserPermission {
    permission: String,
    user: BitbucketUser,
}

#[derive(Debug, Deserialize)]
struct BitbucketUser {
    account_id: String,
    #[serde(default)]
    display_name: String,
}

#[derive(Debug, Deserialize)]
struct BitbucketGroupPermission {
    permission: String,
    group: BitbucketGroup,
}

#[derive(Debug, Deserialize)]
struct BitbucketGroup {
    slug: String,
    #[serde(default)]
    name: String,
}

impl From<BitbucketRepo> for RepositoryDescriptor {
    fn from(repo: BitbucketRepo) -> Self {
        Self {
            slug: repo.slug,
            name: repo.name,
            is_private: repo.is_private,
            description: repo.description.unwrap_or_default(),
            main_branch: repo.mainbranch.map(|b| b.name),
            language: repo.language.unwrap_or_default(),
            project_name: repo.project.map(|p| p.name).unwrap_or_default(),
        }
    }
}

/// Client for one Bitbucket workspace, authenticated with basic auth.
#[derive(Debug, Clone)]
pub struct BitbucketClient {
    http: Client,
    api_base: String,
    workspace: String,
    username: String,
    token: String,
}

impl BitbucketClient {
    /// Creates a client for the given workspace.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Http`] if the HTTP client cannot be built.
    pub fn new(
        workspace: impl Into<String>,
        username: impl Into<String>,
        token: impl Into<String>,
    ) -> Result<Self, SourceError> {
        let http = Client::builder()
            .user_agent(concat!("bitbucket-migrator/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            http,
            api_base: DEFAULT_API_BASE.to_string(),
            workspace: workspace.into(),
            username: username.into(),
            token: token.into(),
        })
    }

    /// Points the client at a different API root (used by tests).
    #[must_use]
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    fn repo_url(&self, repo: &str, suffix: &str) -> String {
        format!(
            "{}/repositories/{}/{}{suffix}",
            self.api_base, self.workspace, repo
        )
    }

    fn authed(&self, request: RequestBuilder) -> RequestBuilder {
        request.basic_auth(&self.username, Some(&self.token))
    }

    async fn send(&self, request: RequestBuilder, what: &str) -> Result<Response, SourceError> {
        let response = self.authed(request).send().await?;

        match response.status() {
            status if status.is_success() => Ok(response),
            StatusCode::NOT_FOUND => Err(SourceError::NotFound(what.to_string())),
            StatusCode::UNAUTHORIZED => Err(SourceError::Unauthorized(what.to_string())),
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(SourceError::Api {
                    status: status.as_u16(),
                    message: error_message(&body),
                })
            }
        }
    }

    async fn get<T: DeserializeOwned>(&self, request: RequestBuilder, what: &str) -> Result<T, SourceError> {
        Ok(self.send(request, what).await?.json().await?)
    }

    async fn get_paginated<T: DeserializeOwned>(&self, url: String, what: &str) -> Result<Vec<T>, SourceError> {
        let mut items = Vec::new();
        let mut next = Some(url);

        while let Some(current) = next {
            let page: BitbucketPaginated<T> = self.get(self.http.get(&current), what).await?;
            items.extend(page.values);
            next = page.next;
        }

        Ok(items)
    }
}

/// Pulls the human readable message out of a Bitbucket error body.
fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .and_then(|e| e.get("message"))
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.to_string())
}

#[async_trait]
impl SourcePlatform for BitbucketClient {
    fn workspace(&self) -> &str {
        &self.workspace
    }

    async fn repository(&self, repo: &str) -> Result<RepositoryDescriptor, SourceError> {
        debug!(repo, "Fetching Bitbucket repository");
        let raw: BitbucketRepo = self
            .get(self.http.get(self.repo_url(repo, "")), repo)
            .await?;
        Ok(raw.into())
    }

    async fn pull_requests(
        &self,
        repo: &str,
        destination_branch: &str,
    ) -> Result<PullRequestCollection, SourceError> {
        debug!(repo, destination_branch, "Fetching Bitbucket pull requests");

        let query = format!("destination.branch.name=\"{destination_branch}\"");
        let first = self.http.get(self.repo_url(repo, "/pullrequests")).query(&[
            ("state", "OPEN"),
            ("state", "MERGED"),
            ("q", query.as_str()),
            ("pagelen", PAGE_LEN),
        ]);

        let page: Value = self.get(first, repo).await?;
        let mut collection = decode_pull_requests(&page)?;

        while let Some(next) = collection.next.clone() {
            let page: Value = self.get(self.http.get(&next), repo).await?;
            collection.append_page(decode_pull_requests(&page)?);
        }

        Ok(collection)
    }

    async fn user_permissions(&self, repo: &str) -> Result<Vec<UserPermission>, SourceError> {
        let raw: Vec<BitbucketUserPermission> = self
            .get_paginated(self.repo_url(repo, "/permissions-config/users"), repo)
            .await?;

        Ok(raw
            .into_iter()
            .map(|p| UserPermission {
                account_id: p.user.account_id,
                display_name: p.user.display_name,
                permission: p.permission,
            })
            .collect())
    }

    async fn group_permissions(&self, repo: &str) -> Result<Vec<GroupPermission>, SourceError> {
        let raw: Vec<BitbucketGroupPermission> = self
            .get_paginated(self.repo_url(repo, "/permissions-config/groups"), repo)
            .await?;

        Ok(raw
            .into_iter()
            .map(|p| GroupPermission {
                slug: p.group.slug,
                name: p.group.name,
                permission: p.permission,
            })
            .collect())
    }

    async fn set_user_permission(
        &self,
        repo: &str,
        account_id: &str,
        permission: &str,
    ) -> Result<(), SourceError> {
        let url = self.repo_url(repo, &format!("/permissions-config/users/{account_id}"));
        self.send(
            self.http.put(url).json(&json!({ "permission": permission })),
            account_id,
        )
        .await?;
        Ok(())
    }

    async fn set_group_permission(
        &self,
        repo: &str,
        group_slug: &str,
        permission: &str,
    ) -> Result<(), SourceError> {
        let url = self.repo_url(repo, &format!("/permissions-config/groups/{group_slug}"));
        self.send(
            self.http.put(url).json(&json!({ "permission": permission })),
            group_slug,
        )
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{basic_auth, body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> BitbucketClient {
        BitbucketClient::new("acme", "bot", "secret")
            .unwrap()
            .with_api_base(server.uri())
    }

    #[tokio::test]
    async fn fetches_repository_descriptor() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repositories/acme/api-server"))
            .and(basic_auth("bot", "secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "slug": "api-server",
                "name": "API Server",
                "is_private": true,
                "description": "Public API",
                "mainbranch": { "name": "develop" },
                "language": "rust",
                "project": { "name": "Core Services" }
            })))
            .mount(&server)
            .await;

        let repo = client(&server).repository("api-server").await.unwrap();

        assert_eq!(repo.slug, "api-server");
        assert!(repo.is_private);
        assert_eq!(repo.default_branch(), "develop");
        assert_eq!(repo.project_name, "Core Services");
    }

    #[tokio::test]
    async fn missing_repository_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repositories/acme/ghost"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let result = client(&server).repository("ghost").await;
        assert!(matches!(result, Err(SourceError::NotFound(_))));
    }

    #[tokio::test]
    async fn api_error_surfaces_message() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repositories/acme/locked"))
            .respond_with(ResponseTemplate::new(403).set_body_json(json!({
                "type": "error",
                "error": { "message": "Access denied" }
            })))
            .mount(&server)
            .await;

        match client(&server).repository("locked").await {
            Err(SourceError::Api { status, message }) => {
                assert_eq!(status, 403);
                assert_eq!(message, "Access denied");
            }
            other => panic!("expected api error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn follows_pull_request_pages() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repositories/acme/api/pullrequests"))
            .and(query_param("q", "destination.branch.name=\"main\""))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "page": 1,
                "pagelen": 50,
                "size": 3,
                "next": format!("{}/next-page", server.uri()),
                "values": [{ "id": 9, "state": "OPEN" }, { "id": 2, "state": "MERGED" }]
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/next-page"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "page": 2,
                "values": [{ "id": 4, "state": "MERGED" }]
            })))
            .mount(&server)
            .await;

        let prs = client(&server).pull_requests("api", "main").await.unwrap();
        let ids: Vec<u64> = prs.values.iter().map(|pr| pr.id).collect();

        assert_eq!(ids, vec![2, 4, 9]);
        assert_eq!(prs.page, 1);
        assert_eq!(prs.next, None);
    }

    #[tokio::test]
    async fn lists_and_sets_permissions() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repositories/acme/api/permissions-config/users"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "values": [{
                    "permission": "write",
                    "user": { "account_id": "557058:1", "display_name": "Jane" }
                }]
            })))
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/repositories/acme/api/permissions-config/users/557058:1"))
            .and(body_json(json!({ "permission": "read" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(1)
            .mount(&server)
            .await;

        let bitbucket = client(&server);
        let users = bitbucket.user_permissions("api").await.unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].permission, "write");

        bitbucket
            .set_user_permission("api", &users[0].account_id, "read")
            .await
            .unwrap();
    }
}
