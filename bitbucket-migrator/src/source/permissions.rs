//! Locking a migrated Bitbucket repository down to read-only.

use super::error::SourceError;
use super::SourcePlatform;
use crate::rate_limit::{pace, PERMISSION_DELAY};
use tracing::{info, info_span, Instrument};

/// Permission every explicit grant is downgraded to.
pub const READ_ONLY: &str = "read";

/// What a lock pass changed (or would change, under dry-run).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LockOutcome {
    /// User grants downgraded.
    pub users: usize,
    /// Group grants downgraded.
    pub groups: usize,
}

/// Downgrades every explicit user and group permission on a repository to
/// [`READ_ONLY`], so nobody keeps pushing to the old location.
///
/// Grants that are already read-only are left alone. Permissions are still
/// listed under dry-run; only the updates are skipped.
///
/// # Errors
///
/// Returns [`SourceError`] if listing or updating a permission fails.
pub async fn make_read_only<S>(
    source: &S,
    repo: &str,
    dry_run: bool,
) -> Result<LockOutcome, SourceError>
where
    S: SourcePlatform + ?Sized,
{
    let span = info_span!("lock_source", repo = %repo);

    async {
        let users = source.user_permissions(repo).await?;
        let groups = source.group_permissions(repo).await?;
        let mut outcome = LockOutcome::default();

        for user in users.iter().filter(|u| u.permission != READ_ONLY) {
            if dry_run {
                info!(user = %user.display_name, from = %user.permission, "[DRY RUN] Would set user permission to read");
            } else {
                source
                    .set_user_permission(repo, &user.account_id, READ_ONLY)
                    .await?;
                pace(PERMISSION_DELAY).await;
            }
            outcome.users += 1;
        }

        for group in groups.iter().filter(|g| g.permission != READ_ONLY) {
            if dry_run {
                info!(group = %group.slug, from = %group.permission, "[DRY RUN] Would set group permission to read");
            } else {
                source
                    .set_group_permission(repo, &group.slug, READ_ONLY)
                    .await?;
                pace(PERMISSION_DELAY).await;
            }
            outcome.groups += 1;
        }

        info!(
            users = outcome.users,
            groups = outcome.groups,
            "Source repository permissions set to read-only"
        );
        Ok(outcome)
    }
    .instrument(span)
    .await
}
