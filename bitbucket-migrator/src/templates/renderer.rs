//! Template renderer.

use super::{clean_summary, TemplateError};
use crate::source::PullRequest;
use handlebars::{no_escape, Handlebars};
use serde_json::{json, Value};

/// Body of the issue or pull request replicating a Bitbucket pull request.
pub const PULL_REQUEST_BODY_TEMPLATE: &str =
    "**Bitbucket PR created on {{created_on}} by {{author}}**\n\n{{summary}}";

/// Comment left on the merge commit of a replicated pull request.
pub const COMMIT_COMMENT_TEMPLATE: &str = "Bitbucket PR details: #{{issue_number}}";

/// Creates a configured Handlebars registry.
///
/// The registry is configured with:
/// - No HTML escaping (for markdown output)
/// - Strict mode (catches missing variables)
#[must_use]
pub fn create_handlebars_registry() -> Handlebars<'static> {
    let mut hbs = Handlebars::new();

    // Disable HTML escaping for markdown output
    hbs.register_escape_fn(no_escape);

    // Enable strict mode to catch missing variables
    hbs.set_strict_mode(true);

    hbs
}

/// Renders replicated pull request bodies and provenance comments.
pub struct TemplateRenderer {
    handlebars: Handlebars<'static>,
}

impl Default for TemplateRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateRenderer {
    /// Creates a new template renderer.
    #[must_use]
    pub fn new() -> Self {
        Self {
            handlebars: create_handlebars_registry(),
        }
    }

    /// Renders the body carrying a Bitbucket pull request's provenance and
    /// cleaned description.
    ///
    /// # Errors
    ///
    /// Returns an error if template rendering fails.
    pub fn render_pull_request_body(&self, pr: &PullRequest) -> Result<String, TemplateError> {
        let created_on = pr
            .created_on
            .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
            .unwrap_or_else(|| "an unknown date".to_string());

        let data = json!({
            "id": pr.id,
            "created_on": created_on,
            "author": pr.author_name(),
            "summary": clean_summary(&pr.summary.raw),
        });

        self.render_template(PULL_REQUEST_BODY_TEMPLATE, &data)
    }

    /// Renders the merge commit comment pointing at the replicated issue.
    ///
    /// # Errors
    ///
    /// Returns an error if template rendering fails.
    pub fn render_commit_comment(&self, issue_number: u64) -> Result<String, TemplateError> {
        self.render_template(
            COMMIT_COMMENT_TEMPLATE,
            &json!({ "issue_number": issue_number }),
        )
    }

    fn render_template(&self, template: &str, data: &Value) -> Result<String, TemplateError> {
        Ok(self.handlebars.render_template(template, data)?)
    }
}
