//! Mirror transfer error types.

use thiserror::Error;

/// Errors that can occur while cloning or pushing a mirror.
#[derive(Debug, Error)]
pub enum MirrorError {
    /// Could not create the working directory.
    #[error("Failed to create temp directory: {0}")]
    TempDir(#[source] std::io::Error),

    /// The process could not be started at all.
    #[error("Failed to execute {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The process ran and exited non-zero.
    #[error("{command} failed: {output}")]
    CommandFailed { command: String, output: String },

    /// A remote URL could not be built.
    #[error("Invalid remote URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// Credentials could not be embedded into a remote URL.
    #[error("Cannot embed credentials into remote URL '{url}'")]
    Credentials { url: String },
}
