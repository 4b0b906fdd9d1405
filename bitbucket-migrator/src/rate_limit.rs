//! Request pacing and GitHub rate limit handling.
//!
//! Both platforms throttle aggressive clients. The pipeline pauses for a
//! fixed time after every mutating call and, on the GitHub side, checks the
//! core rate limit before creating issues, comments and pull requests.

use octocrab::Octocrab;
use std::time::Duration;
use tracing::{info, warn};

/// Pause after each pull request, issue or comment operation on GitHub.
pub const PULL_REQUEST_DELAY: Duration = Duration::from_millis(500);

/// Pause between Bitbucket permission updates.
pub const PERMISSION_DELAY: Duration = Duration::from_millis(16);

/// Pause between two repositories.
pub const REPOSITORY_DELAY: Duration = Duration::from_secs(1);

/// Delay between availability checks of a freshly created repository.
pub const AVAILABILITY_POLL_INTERVAL: Duration = Duration::from_millis(1200);

/// Number of availability checks before giving up.
pub const AVAILABILITY_ATTEMPTS: u32 = 20;

/// Longest single pause while waiting for the core quota to refill.
const MAX_RESET_WAIT: Duration = Duration::from_secs(3600);

/// Remaining core requests below which creation calls hold off.
const LOW_QUOTA: u32 = 5;

/// Sleeps for a fixed pacing interval. Zero durations return immediately.
pub async fn pace(duration: Duration) {
    if !duration.is_zero() {
        tokio::time::sleep(duration).await;
    }
}

/// Snapshot of the GitHub core quota.
#[derive(Debug, Clone)]
pub struct RateLimitInfo {
    pub remaining: u32,
    /// Unix timestamp of the next quota refill.
    pub reset: u64,
    pub limit: u32,
}

impl RateLimitInfo {
    /// How long a caller should hold off at `now` (unix seconds), capped at
    /// one hour. `None` while enough quota is left or the reset has passed.
    pub fn pause_before_reset(&self, now: u64) -> Option<Duration> {
        if self.remaining >= LOW_QUOTA || self.reset <= now {
            return None;
        }
        Some(Duration::from_secs(self.reset - now).min(MAX_RESET_WAIT))
    }
}

/// Reads the core quota that issue, pull request and comment creation
/// draws from.
///
/// # Errors
///
/// Returns the octocrab error if `/rate_limit` cannot be fetched.
pub async fn check_core_rate_limit(octocrab: &Octocrab) -> Result<RateLimitInfo, octocrab::Error> {
    let core = octocrab.ratelimit().get().await?.resources.core;

    Ok(RateLimitInfo {
        remaining: core.remaining as u32,
        reset: core.reset,
        limit: core.limit as u32,
    })
}

/// Holds off until the core quota refills when it is nearly spent.
/// Returns true if the migration paused.
pub async fn wait_if_needed(info: &RateLimitInfo) -> bool {
    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();

    let Some(pause) = info.pause_before_reset(now) else {
        return false;
    };

    if pause == MAX_RESET_WAIT {
        warn!(
            reset = info.reset,
            "Quota resets more than an hour out, pausing for one hour only"
        );
    }
    info!(
        remaining = info.remaining,
        limit = info.limit,
        pause_secs = pause.as_secs(),
        "GitHub quota nearly spent, pausing migration before the next creation call"
    );

    tokio::time::sleep(pause).await;
    true
}

/// Called before every issue, pull request and commit comment creation.
///
/// # Errors
///
/// Returns the octocrab error if the quota cannot be read.
pub async fn ensure_core_rate_limit(octocrab: &Octocrab) -> Result<(), octocrab::Error> {
    let info = check_core_rate_limit(octocrab).await?;
    wait_if_needed(&info).await;
    Ok(())
}
