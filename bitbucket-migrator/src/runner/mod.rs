//! Orchestrates repository migrations.
//!
//! Repositories are migrated one at a time. Each goes through the same
//! pipeline; the [`Phases`] in the configuration switch stages on or off.

mod config;
mod error;

pub use config::{parse_transform_program, CloneProtocol, MigrationConfig, Phases, NO_TRANSFORM};
pub use error::RunnerError;

use crate::destination::{DestinationPlatform, GitHubDestination};
use crate::mirror::{clone_mirror, push_mirror, Git, GitCli};
use crate::provisioning::{build_repository_request, create_repository, update_settings};
use crate::pull_requests::{replicate_merged, replicate_open, ReplicationReport};
use crate::rate_limit::pace;
use crate::source::{make_read_only, BitbucketClient, PullRequestCollection, SourcePlatform};
use crate::summary::{ProcessingResult, RunSummary};
use crate::templates::TemplateRenderer;
use tracing::{error, info, info_span, warn, Instrument};

/// Orchestrates a full migration run.
pub struct Runner {
    config: MigrationConfig,
    source: Box<dyn SourcePlatform>,
    destination: Box<dyn DestinationPlatform>,
    git: Box<dyn Git>,
    renderer: TemplateRenderer,
}

impl Runner {
    /// Builds a runner talking to Bitbucket Cloud, GitHub and the local
    /// `git` binary.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError`] if either HTTP client cannot be built.
    pub fn new(config: MigrationConfig) -> Result<Self, RunnerError> {
        let source = BitbucketClient::new(
            config.bitbucket_workspace(),
            config.bitbucket_username(),
            config.bitbucket_token(),
        )?;
        let destination = GitHubDestination::new(config.github_token(), config.github_org())?;
        Ok(Self::with_platforms(config, source, destination, GitCli::new()))
    }

    /// Builds a runner with explicit collaborators.
    pub fn with_platforms<S, D, G>(config: MigrationConfig, source: S, destination: D, git: G) -> Self
    where
        S: SourcePlatform + 'static,
        D: DestinationPlatform + 'static,
        G: Git + 'static,
    {
        Self {
            config,
            source: Box::new(source),
            destination: Box::new(destination),
            git: Box::new(git),
            renderer: TemplateRenderer::new(),
        }
    }

    /// Migrates each repository in order.
    ///
    /// A failing repository is recorded in the summary. Unless
    /// `continue_on_error` is set, it also stops the run and the summary is
    /// marked as aborted.
    ///
    /// # Errors
    ///
    /// Per-repository failures never surface here; they are part of the
    /// returned summary.
    pub async fn run(&self, repositories: &[String]) -> Result<RunSummary, RunnerError> {
        let mut summary = RunSummary::new(repositories.len(), self.config.dry_run());

        if repositories.is_empty() {
            warn!("No repositories to migrate");
            return Ok(summary);
        }

        info!(
            count = repositories.len(),
            source = self.source.workspace(),
            destination = self.destination.organization(),
            dry_run = self.config.dry_run(),
            "Starting migration"
        );

        for (index, repo) in repositories.iter().enumerate() {
            if index > 0 {
                pace(self.config.repository_delay()).await;
            }

            match self.migrate_repository(repo).await {
                Ok(result) => summary.record_result(result),
                Err(e) => {
                    error!(repo = %repo, error = %e, "Repository migration failed");
                    summary.record_result(ProcessingResult::Failed {
                        repository: repo.clone(),
                        error: e.to_string(),
                    });

                    if !self.config.continue_on_error() {
                        summary.aborted = true;
                        warn!(
                            remaining = summary.repositories_not_attempted(),
                            "Stopping after failure"
                        );
                        break;
                    }
                }
            }
        }

        Ok(summary)
    }

    /// Runs every enabled phase for one repository.
    ///
    /// # Errors
    ///
    /// Returns the first stage error.
    pub async fn migrate_repository(&self, repo: &str) -> Result<ProcessingResult, RunnerError> {
        let span = info_span!("repository", repo = %repo);

        async {
            let phases = self.config.phases();
            info!("Migrating repository");

            let descriptor = self.source.repository(repo).await?;

            let clone = if phases.contents {
                Some(clone_mirror(self.git.as_ref(), &self.config, repo).await?)
            } else {
                None
            };

            let pull_requests = if phases.any_pull_requests() {
                let prs = self
                    .source
                    .pull_requests(repo, descriptor.default_branch())
                    .await?;
                info!(
                    count = prs.values.len(),
                    branch = descriptor.default_branch(),
                    "Fetched pull requests"
                );
                prs
            } else {
                PullRequestCollection::default()
            };

            // Bitbucket may resolve the listed name to a differently cased or
            // renamed slug; every GitHub call uses the slug.
            let request = build_repository_request(&descriptor, &self.config);
            let target = request.name.as_str();
            if target != repo {
                info!(target, "Listed name resolves to a different slug");
            }
            create_repository(self.destination.as_ref(), &request, &self.config).await?;

            if let Some(clone) = &clone {
                push_mirror(self.git.as_ref(), clone.path(), target, &self.config).await?;
            }

            if phases.lock_source {
                make_read_only(self.source.as_ref(), repo, self.config.dry_run()).await?;
            }

            if phases.settings {
                update_settings(
                    self.destination.as_ref(),
                    &request,
                    &descriptor.project_name,
                    &self.config,
                )
                .await?;
            }

            let open = if phases.open_prs {
                replicate_open(
                    self.destination.as_ref(),
                    target,
                    &pull_requests,
                    &self.renderer,
                    &self.config,
                )
                .await?
            } else {
                ReplicationReport::default()
            };

            let merged = if phases.closed_prs {
                replicate_merged(
                    self.destination.as_ref(),
                    target,
                    &pull_requests,
                    &self.renderer,
                    &self.config,
                )
                .await?
            } else {
                ReplicationReport::default()
            };

            info!(
                pull_requests_created = open.created,
                issues_created = merged.created,
                "Repository migrated"
            );

            Ok(ProcessingResult::Migrated {
                repository: repo.to_string(),
                pull_requests_created: open.created,
                issues_created: merged.created,
                pull_requests_skipped: open.skipped + merged.skipped,
            })
        }
        .instrument(span)
        .await
    }
}
