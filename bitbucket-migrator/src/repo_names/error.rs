//! Repository list error types.

use thiserror::Error;

/// Errors that can occur while loading the repository list.
#[derive(Debug, Error)]
pub enum RepoListError {
    /// Failed to read the list file.
    #[error("Failed to read repository list '{path}': {source}")]
    IoError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The list contained no repository names after cleaning.
    #[error("Repository list '{path}' does not name any repositories")]
    Empty { path: String },
}
