//! Replication of Bitbucket pull requests onto GitHub.
//!
//! Open pull requests become native GitHub pull requests between the same
//! branches. Merged ones become closed issues, linked from a comment on the
//! merge commit so the history stays navigable.

mod error;
mod status;

pub use error::ReplicationError;
pub use status::{ReplicatedRecord, ReplicationReport, ReplicationStatus};

use crate::destination::{DestinationPlatform, NewIssue, NewPullRequest};
use crate::rate_limit::{pace, PULL_REQUEST_DELAY};
use crate::runner::MigrationConfig;
use crate::source::{PullRequest, PullRequestCollection, PullRequestState};
use crate::templates::{generate_pull_request_title, TemplateRenderer};
use tracing::{info, info_span, warn, Instrument};

/// Label put on issues that stand in for merged pull requests.
pub const MERGED_PULL_REQUEST_LABEL: &str = "bitbucket-pull-request";

/// Builds the GitHub pull request for an open Bitbucket one.
///
/// # Errors
///
/// Returns [`ReplicationError::Template`] if the body cannot be rendered.
pub fn build_pull_request(
    pr: &PullRequest,
    renderer: &TemplateRenderer,
) -> Result<NewPullRequest, ReplicationError> {
    Ok(NewPullRequest {
        title: generate_pull_request_title(pr),
        body: renderer.render_pull_request_body(pr)?,
        head: pr.source_branch.clone(),
        base: pr.destination_branch.clone(),
        draft: pr.draft,
    })
}

/// Builds the issue recording a merged Bitbucket pull request.
///
/// # Errors
///
/// Returns [`ReplicationError::Template`] if the body cannot be rendered.
pub fn build_issue(pr: &PullRequest, renderer: &TemplateRenderer) -> Result<NewIssue, ReplicationError> {
    Ok(NewIssue {
        title: generate_pull_request_title(pr),
        body: renderer.render_pull_request_body(pr)?,
        labels: vec![MERGED_PULL_REQUEST_LABEL.to_string()],
    })
}

/// Recreates every open pull request in `prs` on GitHub.
///
/// Pull requests GitHub reports as already existing are skipped; any other
/// failure stops replication.
///
/// # Errors
///
/// Returns [`ReplicationError`] on the first non-duplicate failure.
pub async fn replicate_open<D>(
    destination: &D,
    repo: &str,
    prs: &PullRequestCollection,
    renderer: &TemplateRenderer,
    config: &MigrationConfig,
) -> Result<ReplicationReport, ReplicationError>
where
    D: DestinationPlatform + ?Sized,
{
    let span = info_span!("open_pull_requests", repo = %repo);

    async {
        let mut report = ReplicationReport::default();

        for pr in prs.in_state(&PullRequestState::Open) {
            let request = build_pull_request(pr, renderer)?;

            if config.dry_run() {
                info!(
                    pr = pr.id,
                    head = %request.head,
                    base = %request.base,
                    "[DRY RUN] Would create pull request"
                );
                report.record(pr.id, ReplicationStatus::DryRun);
                continue;
            }

            match destination.create_pull_request(repo, &request).await {
                Ok(number) => {
                    info!(pr = pr.id, number, "Created pull request");
                    report.record(pr.id, ReplicationStatus::PullRequestCreated { number });
                    pace(PULL_REQUEST_DELAY).await;
                }
                Err(e) if e.is_already_exists() => {
                    warn!(pr = pr.id, error = %e, "Pull request already exists, skipping");
                    report.record(
                        pr.id,
                        ReplicationStatus::Skipped {
                            reason: e.to_string(),
                        },
                    );
                }
                Err(source) => {
                    return Err(ReplicationError::Destination {
                        pr: pr.id,
                        step: "create pull request",
                        source,
                    });
                }
            }
        }

        info!(created = report.created, skipped = report.skipped, "Open pull requests replicated");
        Ok(report)
    }
    .instrument(span)
    .await
}

/// Records every merged pull request in `prs` as a closed GitHub issue.
///
/// For each record, in order: create the issue, comment on the merge commit
/// with the issue number, close the issue. Records without a merge commit
/// get no comment.
///
/// # Errors
///
/// Returns [`ReplicationError`] on the first failing call.
pub async fn replicate_merged<D>(
    destination: &D,
    repo: &str,
    prs: &PullRequestCollection,
    renderer: &TemplateRenderer,
    config: &MigrationConfig,
) -> Result<ReplicationReport, ReplicationError>
where
    D: DestinationPlatform + ?Sized,
{
    let span = info_span!("merged_pull_requests", repo = %repo);

    async {
        let mut report = ReplicationReport::default();

        for pr in prs.in_state(&PullRequestState::Merged) {
            let issue = build_issue(pr, renderer)?;

            if config.dry_run() {
                info!(
                    pr = pr.id,
                    merge_commit = pr.merge_commit.as_deref().unwrap_or("none"),
                    "[DRY RUN] Would create closed issue"
                );
                report.record(pr.id, ReplicationStatus::DryRun);
                continue;
            }

            let status = replicate_merged_one(destination, repo, pr, &issue, renderer).await?;
            report.record(pr.id, status);
            pace(PULL_REQUEST_DELAY).await;
        }

        info!(created = report.created, "Merged pull requests replicated");
        Ok(report)
    }
    .instrument(span)
    .await
}

async fn replicate_merged_one<D>(
    destination: &D,
    repo: &str,
    pr: &PullRequest,
    issue: &NewIssue,
    renderer: &TemplateRenderer,
) -> Result<ReplicationStatus, ReplicationError>
where
    D: DestinationPlatform + ?Sized,
{
    let failed = |step: &'static str| {
        move |source| ReplicationError::Destination {
            pr: pr.id,
            step,
            source,
        }
    };

    let number = destination
        .create_issue(repo, issue)
        .await
        .map_err(failed("create issue"))?;

    let commented = match pr.merge_commit.as_deref() {
        Some(sha) => {
            let comment = renderer.render_commit_comment(number)?;
            destination
                .create_commit_comment(repo, sha, &comment)
                .await
                .map_err(failed("comment on merge commit"))?;
            true
        }
        None => {
            warn!(pr = pr.id, number, "Merged pull request has no merge commit, not commenting");
            false
        }
    };

    destination
        .close_issue(repo, number)
        .await
        .map_err(failed("close issue"))?;

    info!(pr = pr.id, number, "Recorded merged pull request as closed issue");
    Ok(ReplicationStatus::IssueCreated { number, commented })
}
