//! Source platform error types.

use thiserror::Error;

/// Errors that can occur while decoding a Bitbucket response payload.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The payload was not a JSON object.
    #[error("Expected a JSON object, found {found}")]
    NotAnObject { found: &'static str },

    /// A paginated payload had no `values` array.
    #[error("Paginated response has no `values` array")]
    MissingValues,

    /// Bitbucket answered with an error object instead of a resource.
    #[error("Bitbucket API error: {message}")]
    Platform { message: String },

    /// A known field had an unexpected type.
    #[error("Unexpected pull request shape: {source}")]
    Shape {
        #[source]
        source: serde_json::Error,
    },
}

/// Errors that can occur while talking to Bitbucket.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Repository (or other resource) does not exist.
    #[error("Bitbucket resource not found: {0}")]
    NotFound(String),

    /// Credentials were rejected.
    #[error("Bitbucket rejected the credentials for {0}")]
    Unauthorized(String),

    /// Any other non-success response.
    #[error("Bitbucket API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Transport level failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body could not be decoded.
    #[error(transparent)]
    Decode(#[from] DecodeError),
}
