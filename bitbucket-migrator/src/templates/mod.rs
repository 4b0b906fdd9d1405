//! Text derived from Bitbucket pull requests.
//!
//! Titles are plain formatting; bodies and comments go through Handlebars
//! so they render as markdown without HTML escaping.

mod error;
mod renderer;

pub use error::TemplateError;
pub use renderer::{
    create_handlebars_registry, TemplateRenderer, COMMIT_COMMENT_TEMPLATE,
    PULL_REQUEST_BODY_TEMPLATE,
};

use crate::source::PullRequest;

/// Smart-link markers Bitbucket's editor leaves in raw markdown.
const INLINE_MARKUP_TOKENS: [&str; 2] = ["{: data-inline-card='' }", "{: data-block-card='' }"];

/// Zero-width non-joiner Bitbucket inserts around mentions and links.
const INVISIBLE_CHAR: char = '\u{200c}';

/// Generates the title of the issue or pull request replicating `pr`.
///
/// Format: "Bitbucket PR #{id}: {title}"
#[must_use]
pub fn generate_pull_request_title(pr: &PullRequest) -> String {
    format!("Bitbucket PR #{}: {}", pr.id, pr.title)
}

/// Removes Bitbucket-only markup from a pull request description.
#[must_use]
pub fn clean_summary(raw: &str) -> String {
    let mut cleaned = raw.replace(INVISIBLE_CHAR, "");
    for token in INLINE_MARKUP_TOKENS {
        cleaned = cleaned.replace(token, "");
    }
    cleaned
}
