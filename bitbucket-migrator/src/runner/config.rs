//! Runner configuration.

use crate::destination::Visibility;
use crate::rate_limit::REPOSITORY_DELAY;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// Value of the transformation program setting that disables it.
pub const NO_TRANSFORM: &str = "none";

/// How repositories are cloned from Bitbucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CloneProtocol {
    /// Basic-auth credentials embedded in the clone URL.
    #[default]
    Https,
    /// The running user's SSH keys.
    Ssh,
}

impl FromStr for CloneProtocol {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "https" => Ok(Self::Https),
            "ssh" => Ok(Self::Ssh),
            other => Err(format!("unknown clone protocol '{other}' (expected https or ssh)")),
        }
    }
}

impl fmt::Display for CloneProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Https => f.write_str("https"),
            Self::Ssh => f.write_str("ssh"),
        }
    }
}

/// Pipeline stages that can be switched on or off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Phases {
    /// Mirror clone and push.
    pub contents: bool,
    /// Default branch, topics and custom properties.
    pub settings: bool,
    pub open_prs: bool,
    /// Merged pull requests, replicated as closed issues.
    pub closed_prs: bool,
    /// Downgrade every source permission to read after the push.
    pub lock_source: bool,
}

impl Default for Phases {
    fn default() -> Self {
        Self {
            contents: true,
            settings: true,
            open_prs: true,
            closed_prs: true,
            lock_source: false,
        }
    }
}

impl Phases {
    /// Returns whether any pull request phase is enabled.
    #[must_use]
    pub fn any_pull_requests(&self) -> bool {
        self.open_prs || self.closed_prs
    }
}

/// Parses the transformation program setting. `none` (any case) and blank
/// values disable the step.
#[must_use]
pub fn parse_transform_program(value: &str) -> Option<PathBuf> {
    let value = value.trim();
    if value.is_empty() || value.eq_ignore_ascii_case(NO_TRANSFORM) {
        None
    } else {
        Some(PathBuf::from(value))
    }
}

/// Configuration for a migration run.
#[derive(Debug, Clone)]
pub struct MigrationConfig {
    /// Bitbucket workspace the repositories live in.
    bitbucket_workspace: String,
    bitbucket_username: String,
    /// Bitbucket app password or API token.
    bitbucket_token: String,
    /// GitHub organization the repositories are created in.
    github_org: String,
    github_token: String,
    clone_protocol: CloneProtocol,
    /// Whether to log mutating calls instead of making them.
    dry_run: bool,
    /// Whether an existing destination repository may be reused.
    overwrite: bool,
    phases: Phases,
    /// Visibility given to repositories that are private on Bitbucket.
    private_visibility: Visibility,
    custom_properties: bool,
    transform_program: Option<PathBuf>,
    continue_on_error: bool,
    /// Pause between repositories.
    repository_delay: Duration,
}

impl MigrationConfig {
    /// Creates a configuration with every optional setting at its default.
    pub fn new(
        bitbucket_workspace: impl Into<String>,
        bitbucket_username: impl Into<String>,
        bitbucket_token: impl Into<String>,
        github_org: impl Into<String>,
        github_token: impl Into<String>,
    ) -> Self {
        Self {
            bitbucket_workspace: bitbucket_workspace.into(),
            bitbucket_username: bitbucket_username.into(),
            bitbucket_token: bitbucket_token.into(),
            github_org: github_org.into(),
            github_token: github_token.into(),
            clone_protocol: CloneProtocol::default(),
            dry_run: false,
            overwrite: false,
            phases: Phases::default(),
            private_visibility: Visibility::Private,
            custom_properties: false,
            transform_program: None,
            continue_on_error: false,
            repository_delay: REPOSITORY_DELAY,
        }
    }

    pub fn with_clone_protocol(mut self, clone_protocol: CloneProtocol) -> Self {
        self.clone_protocol = clone_protocol;
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    pub fn with_phases(mut self, phases: Phases) -> Self {
        self.phases = phases;
        self
    }

    /// Sets the visibility for private sources. `Public` is treated as
    /// `Private` so private code is never exposed.
    pub fn with_private_visibility(mut self, visibility: Visibility) -> Self {
        self.private_visibility = match visibility {
            Visibility::Public => Visibility::Private,
            other => other,
        };
        self
    }

    pub fn with_custom_properties(mut self, custom_properties: bool) -> Self {
        self.custom_properties = custom_properties;
        self
    }

    pub fn with_transform_program(mut self, transform_program: Option<PathBuf>) -> Self {
        self.transform_program = transform_program;
        self
    }

    pub fn with_continue_on_error(mut self, continue_on_error: bool) -> Self {
        self.continue_on_error = continue_on_error;
        self
    }

    pub fn with_repository_delay(mut self, repository_delay: Duration) -> Self {
        self.repository_delay = repository_delay;
        self
    }

    pub fn bitbucket_workspace(&self) -> &str {
        &self.bitbucket_workspace
    }

    pub fn bitbucket_username(&self) -> &str {
        &self.bitbucket_username
    }

    pub fn bitbucket_token(&self) -> &str {
        &self.bitbucket_token
    }

    pub fn github_org(&self) -> &str {
        &self.github_org
    }

    pub fn github_token(&self) -> &str {
        &self.github_token
    }

    pub fn clone_protocol(&self) -> CloneProtocol {
        self.clone_protocol
    }

    /// Returns whether dry-run mode is enabled.
    pub fn dry_run(&self) -> bool {
        self.dry_run
    }

    pub fn overwrite(&self) -> bool {
        self.overwrite
    }

    pub fn phases(&self) -> Phases {
        self.phases
    }

    pub fn private_visibility(&self) -> Visibility {
        self.private_visibility
    }

    pub fn custom_properties(&self) -> bool {
        self.custom_properties
    }

    pub fn transform_program(&self) -> Option<&Path> {
        self.transform_program.as_deref()
    }

    pub fn continue_on_error(&self) -> bool {
        self.continue_on_error
    }

    pub fn repository_delay(&self) -> Duration {
        self.repository_delay
    }
}
