//! Bitbucket repository and permission snapshots.

use serde::Serialize;

/// Branch used when Bitbucket reports no main branch (empty repositories).
pub const FALLBACK_BRANCH: &str = "main";

/// Read-only snapshot of a Bitbucket repository, fetched once per migration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RepositoryDescriptor {
    /// URL slug, also used as the GitHub repository name.
    pub slug: String,

    /// Display name.
    pub name: String,

    /// Whether the repository is private on Bitbucket.
    pub is_private: bool,

    /// Free-text description.
    pub description: String,

    /// Main branch, if the repository has any commits.
    pub main_branch: Option<String>,

    /// Primary language as reported by Bitbucket.
    pub language: String,

    /// Name of the owning Bitbucket project.
    pub project_name: String,
}

impl RepositoryDescriptor {
    /// Returns the main branch, falling back to [`FALLBACK_BRANCH`].
    #[must_use]
    pub fn default_branch(&self) -> &str {
        self.main_branch.as_deref().unwrap_or(FALLBACK_BRANCH)
    }
}

/// Explicit permission a user holds on a repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserPermission {
    /// Atlassian account id, used to address the permission.
    pub account_id: String,

    /// Display name, for logging.
    pub display_name: String,

    /// Current permission (`read`, `write` or `admin`).
    pub permission: String,
}

/// Explicit permission a group holds on a repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupPermission {
    /// Group slug, used to address the permission.
    pub slug: String,

    /// Group display name.
    pub name: String,

    /// Current permission (`read`, `write` or `admin`).
    pub permission: String,
}
