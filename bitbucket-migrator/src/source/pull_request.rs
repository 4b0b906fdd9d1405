//! Strongly typed Bitbucket pull requests.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Lifecycle state of a Bitbucket pull request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum PullRequestState {
    Open,
    Merged,
    Declined,
    Superseded,
    /// Any state this tool does not act on, including an absent one.
    Other(String),
}

impl PullRequestState {
    /// Maps the API's upper-case state name.
    #[must_use]
    pub fn from_api(state: &str) -> Self {
        match state {
            "OPEN" => Self::Open,
            "MERGED" => Self::Merged,
            "DECLINED" => Self::Declined,
            "SUPERSEDED" => Self::Superseded,
            other => Self::Other(other.to_string()),
        }
    }
}

impl Default for PullRequestState {
    fn default() -> Self {
        Self::Other(String::new())
    }
}

/// Text in the three forms Bitbucket returns it in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Content {
    pub raw: String,
    pub markup: String,
    pub html: String,
}

/// Rendered variants of the pull request text fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Rendered {
    pub title: Content,
    pub description: Content,
    pub reason: Content,
}

/// A Bitbucket account as embedded in a pull request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Account {
    pub display_name: String,
    pub nickname: String,
    pub account_id: String,
}

impl Account {
    /// Best human readable name for the account.
    #[must_use]
    pub fn name(&self) -> &str {
        if !self.display_name.is_empty() {
            &self.display_name
        } else if !self.nickname.is_empty() {
            &self.nickname
        } else {
            "unknown"
        }
    }
}

/// A single decoded pull request. Immutable once decoded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PullRequest {
    /// Repository-unique, monotonically assigned id.
    pub id: u64,
    pub title: String,
    /// Description as authored.
    pub summary: Content,
    pub rendered: Rendered,
    pub state: PullRequestState,
    pub author: Option<Account>,
    pub source_branch: String,
    pub destination_branch: String,
    /// Hash of the merge commit, only present once merged.
    pub merge_commit: Option<String>,
    pub comment_count: u64,
    pub task_count: u64,
    pub close_source_branch: bool,
    pub reason: String,
    pub created_on: Option<DateTime<Utc>>,
    pub updated_on: Option<DateTime<Utc>>,
    pub draft: bool,
}

impl PullRequest {
    /// Display name of the author, or `unknown`.
    #[must_use]
    pub fn author_name(&self) -> &str {
        self.author.as_ref().map_or("unknown", Account::name)
    }
}

/// A page (or merged pages) of pull requests.
///
/// `values` is always sorted by ascending id once it leaves the decoder so
/// replication happens in creation order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PullRequestCollection {
    pub page: u64,
    pub pagelen: u64,
    pub size: u64,
    /// Link to the next page, if any.
    pub next: Option<String>,
    pub values: Vec<PullRequest>,
}

impl PullRequestCollection {
    /// Appends the records of a following page and restores id order.
    pub fn append_page(&mut self, page: PullRequestCollection) {
        self.values.extend(page.values);
        self.next = page.next;
        self.sort();
    }

    /// Sorts records by ascending id. Stable.
    pub fn sort(&mut self) {
        self.values.sort_by_key(|pr| pr.id);
    }

    /// Iterates records in the given state.
    pub fn in_state<'a>(
        &'a self,
        state: &'a PullRequestState,
    ) -> impl Iterator<Item = &'a PullRequest> + 'a {
        self.values.iter().filter(move |pr| &pr.state == state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pr(id: u64) -> PullRequest {
        PullRequest {
            id,
            ..Default::default()
        }
    }

    #[test]
    fn maps_api_states() {
        assert_eq!(PullRequestState::from_api("OPEN"), PullRequestState::Open);
        assert_eq!(PullRequestState::from_api("MERGED"), PullRequestState::Merged);
        assert_eq!(
            PullRequestState::from_api("open"),
            PullRequestState::Other("open".to_string())
        );
    }

    #[test]
    fn appended_pages_stay_sorted() {
        let mut first = PullRequestCollection {
            values: vec![pr(3), pr(9)],
            next: Some("page-2".to_string()),
            ..Default::default()
        };
        first.append_page(PullRequestCollection {
            values: vec![pr(1), pr(5)],
            ..Default::default()
        });

        let ids: Vec<u64> = first.values.iter().map(|pr| pr.id).collect();
        assert_eq!(ids, vec![1, 3, 5, 9]);
        assert_eq!(first.next, None);
    }

    #[test]
    fn author_name_falls_back() {
        let mut record = pr(1);
        assert_eq!(record.author_name(), "unknown");

        record.author = Some(Account {
            nickname: "jdoe".to_string(),
            ..Default::default()
        });
        assert_eq!(record.author_name(), "jdoe");
    }
}
