//! Repository list loading and name sanitization.
//!
//! Bitbucket slugs cannot contain a handful of characters that people
//! routinely type into repository names. The list file may use the display
//! names; they are normalized here before any API call is made.

mod error;

pub use error::RepoListError;

use std::path::Path;
use tracing::{debug, info};

/// Characters that are not valid in a Bitbucket repository slug.
const DISALLOWED_CHARS: [char; 6] = [' ', '/', '+', '&', '(', ')'];

/// Cleans a single raw line from a repository list.
///
/// Returns `None` for blank lines and `#` comments. Every disallowed
/// character is replaced one-for-one with `-`, so the cleaned name has the
/// same length as the trimmed input.
#[must_use]
pub fn sanitize_repo_name(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return None;
    }

    Some(
        trimmed
            .chars()
            .map(|c| if DISALLOWED_CHARS.contains(&c) { '-' } else { c })
            .collect(),
    )
}

/// Cleans every line, dropping blanks and comments and keeping the order.
///
/// Duplicates are preserved.
pub fn sanitize_repo_names<'a, I>(lines: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    lines.into_iter().filter_map(sanitize_repo_name).collect()
}

/// Parses a repository list.
///
/// Multi-line input is treated as a list file with one name per line. A
/// single line is treated as a comma separated list, which is how the list
/// is passed through an environment variable.
#[must_use]
pub fn parse_repo_list(text: &str) -> Vec<String> {
    let trimmed = text.trim();
    if trimmed.lines().count() > 1 {
        sanitize_repo_names(trimmed.lines())
    } else {
        sanitize_repo_names(trimmed.split(','))
    }
}

/// Loads and sanitizes a newline-delimited repository list file.
///
/// # Errors
///
/// Returns [`RepoListError`] if the file cannot be read or names no
/// repositories.
pub fn load_repo_list(path: &Path) -> Result<Vec<String>, RepoListError> {
    info!(path = %path.display(), "Loading repository list");

    let text = std::fs::read_to_string(path).map_err(|e| RepoListError::IoError {
        path: path.display().to_string(),
        source: e,
    })?;

    let names = sanitize_repo_names(text.lines());
    if names.is_empty() {
        return Err(RepoListError::Empty {
            path: path.display().to_string(),
        });
    }

    debug!(count = names.len(), "Loaded repository names");
    Ok(names)
}
