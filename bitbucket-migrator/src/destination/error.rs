//! Destination platform error types.

use thiserror::Error;

/// Errors that can occur while talking to GitHub.
#[derive(Debug, Error)]
pub enum DestinationError {
    /// GitHub refused to create something that already exists.
    #[error("Already exists on GitHub: {message}")]
    AlreadyExists { message: String },

    /// The request was rejected before reaching GitHub.
    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    /// Any other GitHub API error.
    #[error("GitHub API error: {0}")]
    GitHubError(#[from] octocrab::Error),
}

impl DestinationError {
    /// Wraps an octocrab error, classifying "already exists" responses.
    #[must_use]
    pub fn from_github(error: octocrab::Error) -> Self {
        let text = github_error_text(&error);
        if is_already_exists_message(&text) {
            Self::AlreadyExists { message: text }
        } else {
            Self::GitHubError(error)
        }
    }

    /// Returns true for the recoverable "already exists" condition.
    #[must_use]
    pub fn is_already_exists(&self) -> bool {
        matches!(self, Self::AlreadyExists { .. })
    }
}

/// Flattens a GitHub error message and its detail entries into one string.
fn github_error_text(error: &octocrab::Error) -> String {
    match error {
        octocrab::Error::GitHub { source, .. } => {
            let mut text = source.message.clone();
            for detail in source.errors.iter().flatten() {
                text.push('\n');
                text.push_str(&detail.to_string());
            }
            text
        }
        other => other.to_string(),
    }
}

/// GitHub reports duplicates as validation failures whose detail reads
/// "name already exists on this account" or "A pull request already exists".
pub(crate) fn is_already_exists_message(text: &str) -> bool {
    text.to_lowercase().contains("already exists")
}
