//! CLI for the Bitbucket to GitHub migrator.
//!
//! Every setting can come from a flag or an environment variable; a `.env`
//! file in the working directory is loaded first.

use bitbucket_migrator::{
    load_repo_list, parse_repo_list, parse_transform_program, CloneProtocol, MigrationConfig,
    Phases, RepoListError, RunSummary, Runner, RunnerError, Visibility,
};
use clap::{builder::BoolishValueParser, ArgAction, ArgGroup, Parser};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Bitbucket Migrator - Move repositories, settings and pull request history from Bitbucket Cloud to GitHub.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(group(ArgGroup::new("repo_list").required(true).multiple(true).args(["file", "repositories"])))]
struct Args {
    /// Bitbucket workspace to migrate from.
    #[arg(long, env = "BITBUCKET_WORKSPACE")]
    bitbucket_workspace: String,

    /// Bitbucket username.
    #[arg(long, env = "BITBUCKET_USER")]
    bitbucket_user: String,

    /// Bitbucket app password or API token.
    #[arg(long, env = "BITBUCKET_TOKEN", hide_env_values = true)]
    bitbucket_token: String,

    /// GitHub organization to migrate to.
    #[arg(long, env = "GITHUB_ORG")]
    github_org: String,

    /// GitHub Personal Access Token.
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    github_token: String,

    /// File listing one repository per line (`#` starts a comment).
    #[arg(long, env = "REPO_LIST_FILE")]
    file: Option<PathBuf>,

    /// Comma-separated repository names. Ignored when a file is given.
    #[arg(long, env = "REPOSITORIES")]
    repositories: Option<String>,

    /// Preview changes without mutating either platform.
    #[arg(long, env = "DRY_RUN", default_value = "false", action = ArgAction::Set, num_args = 0..=1, default_missing_value = "true", value_parser = BoolishValueParser::new())]
    dry_run: bool,

    /// Reuse destination repositories that already exist.
    #[arg(long, env = "OVERWRITE", default_value = "false", action = ArgAction::Set, num_args = 0..=1, default_missing_value = "true", value_parser = BoolishValueParser::new())]
    overwrite: bool,

    /// Mirror branches, tags and refs.
    #[arg(long, env = "MIGRATE_CONTENTS", default_value = "true", action = ArgAction::Set, num_args = 0..=1, default_missing_value = "true", value_parser = BoolishValueParser::new())]
    migrate_contents: bool,

    /// Sync default branch, topics and custom properties.
    #[arg(long, env = "MIGRATE_SETTINGS", default_value = "true", action = ArgAction::Set, num_args = 0..=1, default_missing_value = "true", value_parser = BoolishValueParser::new())]
    migrate_settings: bool,

    /// Recreate open pull requests.
    #[arg(long, env = "MIGRATE_OPEN_PRS", default_value = "true", action = ArgAction::Set, num_args = 0..=1, default_missing_value = "true", value_parser = BoolishValueParser::new())]
    migrate_open_prs: bool,

    /// Record merged pull requests as closed issues.
    #[arg(long, env = "MIGRATE_CLOSED_PRS", default_value = "true", action = ArgAction::Set, num_args = 0..=1, default_missing_value = "true", value_parser = BoolishValueParser::new())]
    migrate_closed_prs: bool,

    /// Downgrade every source permission to read after pushing.
    #[arg(long, env = "LOCK_SOURCE", default_value = "false", action = ArgAction::Set, num_args = 0..=1, default_missing_value = "true", value_parser = BoolishValueParser::new())]
    lock_source: bool,

    /// Clone over `https` (token) or `ssh` (local keys).
    #[arg(long, env = "CLONE_VIA", default_value = "https")]
    clone_via: CloneProtocol,

    /// Visibility for repositories that are private on Bitbucket (`private` or `internal`).
    #[arg(long, env = "PRIVATE_VISIBILITY", default_value = "private")]
    private_visibility: Visibility,

    /// Set the `migrated_from` and `bitbucket_project` custom properties.
    #[arg(long, env = "CUSTOM_PROPERTIES", default_value = "false", action = ArgAction::Set, num_args = 0..=1, default_missing_value = "true", value_parser = BoolishValueParser::new())]
    custom_properties: bool,

    /// Program run on each clone before pushing (`none` to disable).
    #[arg(long, env = "TRANSFORM_PROGRAM", default_value = "none")]
    transform_program: String,

    /// Keep going after a repository fails.
    #[arg(long, env = "CONTINUE_ON_ERROR", default_value = "false", action = ArgAction::Set, num_args = 0..=1, default_missing_value = "true", value_parser = BoolishValueParser::new())]
    continue_on_error: bool,
}

impl Args {
    /// Builds the library configuration from the parsed arguments.
    fn migration_config(&self) -> MigrationConfig {
        MigrationConfig::new(
            &self.bitbucket_workspace,
            &self.bitbucket_user,
            &self.bitbucket_token,
            &self.github_org,
            &self.github_token,
        )
        .with_dry_run(self.dry_run)
        .with_overwrite(self.overwrite)
        .with_phases(Phases {
            contents: self.migrate_contents,
            settings: self.migrate_settings,
            open_prs: self.migrate_open_prs,
            closed_prs: self.migrate_closed_prs,
            lock_source: self.lock_source,
        })
        .with_clone_protocol(self.clone_via)
        .with_private_visibility(self.private_visibility)
        .with_custom_properties(self.custom_properties)
        .with_transform_program(parse_transform_program(&self.transform_program))
        .with_continue_on_error(self.continue_on_error)
    }

    /// Reads the repository list from the file, or the inline list.
    fn repository_list(&self) -> Result<Vec<String>, RepoListError> {
        match (&self.file, &self.repositories) {
            (Some(path), _) => load_repo_list(path),
            (None, Some(list)) => Ok(parse_repo_list(list)),
            (None, None) => Ok(Vec::new()),
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // A missing .env file is fine; explicit env vars and flags still apply
    dotenvy::dotenv().ok();

    // Initialize tracing
    init_tracing();

    // octocrab and reqwest both pull in rustls; pick one provider for the process
    let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();

    // Parse arguments
    let args = Args::parse();

    let repositories = match args.repository_list() {
        Ok(repositories) => repositories,
        Err(e) => {
            error!(error = %e, "Failed to read repository list");
            return ExitCode::from(2);
        }
    };

    // Run the main logic
    match run(&args, &repositories).await {
        Ok(summary) => {
            print_summary(&summary);

            if summary.all_success() {
                ExitCode::from(0)
            } else {
                ExitCode::from(1)
            }
        }
        Err(e) => {
            error!(error = %e, "Critical failure");
            ExitCode::from(2)
        }
    }
}

/// Initializes tracing with environment filter support.
///
/// Sets up the global tracing subscriber with:
/// - Compact log formatting (single-line output)
/// - Log level filtering via `RUST_LOG` env var (defaults to "info")
fn init_tracing() {
    tracing_subscriber::registry()
        // Use compact formatting without module target paths for cleaner output
        .with(fmt::layer().compact().with_target(false))
        // Falls back to "info" level if RUST_LOG is not set or invalid
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
}

/// Main execution logic.
async fn run(args: &Args, repositories: &[String]) -> Result<RunSummary, RunnerError> {
    let runner = Runner::new(args.migration_config())?;
    runner.run(repositories).await
}

/// Prints the final run summary.
fn print_summary(summary: &RunSummary) {
    println!("\nSummary:");
    println!(
        "  Mode: {}",
        if summary.dry_run { "Dry Run" } else { "Live" }
    );
    println!("  Repositories requested: {}", summary.repositories_requested);
    println!("  Repositories migrated: {}", summary.repositories_migrated);
    println!("  Repositories failed: {}", summary.repositories_failed);

    if summary.aborted {
        println!(
            "  Stopped early; not attempted: {}",
            summary.repositories_not_attempted()
        );
    }

    if !summary.dry_run {
        println!("  Pull requests created: {}", summary.pull_requests_created);
        println!("  Pull requests skipped: {}", summary.pull_requests_skipped);
        println!("  Closed issues created: {}", summary.issues_created);
    }

    for result in &summary.results {
        if let bitbucket_migrator::ProcessingResult::Failed { repository, error } = result {
            println!("  FAILED {repository}: {error}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::Path;

    const REQUIRED: [(&str, Option<&str>); 5] = [
        ("BITBUCKET_WORKSPACE", Some("acme")),
        ("BITBUCKET_USER", Some("bot")),
        ("BITBUCKET_TOKEN", Some("s3cr3t")),
        ("GITHUB_ORG", Some("acme-gh")),
        ("GITHUB_TOKEN", Some("ghp_token")),
    ];

    const OPTIONAL: [&str; 15] = [
        "REPO_LIST_FILE",
        "REPOSITORIES",
        "DRY_RUN",
        "OVERWRITE",
        "MIGRATE_CONTENTS",
        "MIGRATE_SETTINGS",
        "MIGRATE_OPEN_PRS",
        "MIGRATE_CLOSED_PRS",
        "LOCK_SOURCE",
        "CLONE_VIA",
        "PRIVATE_VISIBILITY",
        "CUSTOM_PROPERTIES",
        "TRANSFORM_PROGRAM",
        "CONTINUE_ON_ERROR",
        "RUST_LOG",
    ];

    /// Runs `f` with the required variables set, `extra` applied on top and
    /// every other setting unset.
    fn with_env<R>(extra: &[(&str, Option<&str>)], f: impl FnOnce() -> R) -> R {
        let mut vars: Vec<(&str, Option<&str>)> = REQUIRED.to_vec();
        vars.extend(
            OPTIONAL
                .iter()
                .filter(|name| !extra.iter().any(|(key, _)| key == *name))
                .map(|name| (*name, None)),
        );
        vars.extend_from_slice(extra);
        temp_env::with_vars(vars, f)
    }

    #[test]
    fn reads_settings_from_env() {
        let args = with_env(
            &[
                ("REPOSITORIES", Some("api,web")),
                ("DRY_RUN", Some("true")),
                ("CLONE_VIA", Some("ssh")),
                ("PRIVATE_VISIBILITY", Some("internal")),
                ("MIGRATE_OPEN_PRS", Some("false")),
            ],
            || Args::try_parse_from(["bitbucket-migrator"]).unwrap(),
        );

        let config = args.migration_config();
        assert_eq!(config.bitbucket_workspace(), "acme");
        assert_eq!(config.github_org(), "acme-gh");
        assert!(config.dry_run());
        assert_eq!(config.clone_protocol(), CloneProtocol::Ssh);
        assert_eq!(config.private_visibility(), Visibility::Internal);
        assert!(!config.phases().open_prs);
        assert!(config.phases().closed_prs);
        assert_eq!(args.repository_list().unwrap(), vec!["api", "web"]);
    }

    #[test]
    fn defaults_match_documented_values() {
        let args = with_env(&[("REPOSITORIES", Some("api"))], || {
            Args::try_parse_from(["bitbucket-migrator"]).unwrap()
        });

        let config = args.migration_config();
        assert!(!config.dry_run());
        assert!(!config.overwrite());
        assert_eq!(config.phases(), Phases::default());
        assert_eq!(config.clone_protocol(), CloneProtocol::Https);
        assert_eq!(config.private_visibility(), Visibility::Private);
        assert!(!config.custom_properties());
        assert!(config.transform_program().is_none());
        assert!(!config.continue_on_error());
    }

    #[test]
    fn flags_override_env() {
        let args = with_env(&[("DRY_RUN", Some("false"))], || {
            Args::try_parse_from([
                "bitbucket-migrator",
                "--dry-run",
                "--repositories",
                "api",
                "--transform-program",
                "/opt/scrub",
            ])
            .unwrap()
        });

        let config = args.migration_config();
        assert!(config.dry_run());
        assert_eq!(config.transform_program(), Some(Path::new("/opt/scrub")));
    }

    #[test]
    fn missing_required_value_is_an_error() {
        let result = temp_env::with_vars(
            [
                ("BITBUCKET_WORKSPACE", None::<&str>),
                ("REPOSITORIES", Some("api")),
            ],
            || Args::try_parse_from(["bitbucket-migrator"]),
        );

        let err = result.unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn repository_list_is_required() {
        let result = with_env(&[], || Args::try_parse_from(["bitbucket-migrator"]));
        assert!(result.is_err());
    }

    #[test]
    fn file_takes_precedence_over_inline_list() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "# core\nbilling api\nweb").unwrap();
        let path = file.path().to_string_lossy().into_owned();

        let args = with_env(
            &[("REPO_LIST_FILE", Some(path.as_str())), ("REPOSITORIES", Some("ignored"))],
            || Args::try_parse_from(["bitbucket-migrator"]).unwrap(),
        );

        assert_eq!(args.repository_list().unwrap(), vec!["billing-api", "web"]);
    }
}
