//! Destination repository creation and settings sync.

mod error;

pub use error::ProvisionError;

use crate::destination::{CustomProperty, DestinationPlatform, NewRepository, Visibility};
use crate::rate_limit::{pace, AVAILABILITY_ATTEMPTS, AVAILABILITY_POLL_INTERVAL};
use crate::runner::MigrationConfig;
use crate::source::RepositoryDescriptor;
use tracing::{debug, info, info_span, warn, Instrument};

/// Topic added to every migrated repository.
pub const MIGRATED_TOPIC: &str = "migrated-from-bitbucket";

/// Custom property marking the origin platform.
pub const MIGRATED_FROM_PROPERTY: &str = "migrated_from";

/// Custom property carrying the Bitbucket project.
pub const PROJECT_PROPERTY: &str = "bitbucket_project";

/// How the destination repository came to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvisionOutcome {
    /// Freshly created and confirmed available.
    Created,
    /// Already existed and overwrite is enabled.
    Reused,
    /// Nothing was created.
    DryRun,
}

/// Turns a Bitbucket project name into a GitHub topic.
#[must_use]
pub fn clean_topic(project_name: &str) -> String {
    project_name.trim().to_lowercase().replace(' ', "-")
}

/// Builds the creation request for a Bitbucket repository.
#[must_use]
pub fn build_repository_request(
    descriptor: &RepositoryDescriptor,
    config: &MigrationConfig,
) -> NewRepository {
    let visibility = if descriptor.is_private {
        config.private_visibility()
    } else {
        Visibility::Public
    };

    let mut topics = vec![MIGRATED_TOPIC.to_string()];
    let project_topic = clean_topic(&descriptor.project_name);
    if !project_topic.is_empty() {
        topics.push(project_topic);
    }

    NewRepository {
        name: descriptor.slug.clone(),
        description: descriptor.description.clone(),
        visibility,
        default_branch: descriptor.default_branch().to_string(),
        language: descriptor.language.clone(),
        topics,
    }
}

/// Creates the destination repository, or reuses it when overwrite is set,
/// then waits until GitHub serves it.
///
/// # Errors
///
/// Returns [`ProvisionError`] if the repository exists without overwrite,
/// creation is rejected or it never becomes available.
pub async fn create_repository<D>(
    destination: &D,
    request: &NewRepository,
    config: &MigrationConfig,
) -> Result<ProvisionOutcome, ProvisionError>
where
    D: DestinationPlatform + ?Sized,
{
    let span = info_span!("provision", repo = %request.name);

    async {
        if config.dry_run() {
            info!(
                org = destination.organization(),
                visibility = %request.visibility,
                "[DRY RUN] Would create repository"
            );
            return Ok(ProvisionOutcome::DryRun);
        }

        match destination.create_repository(request).await {
            Ok(()) => {
                info!(visibility = %request.visibility, "Created repository");
            }
            Err(e) if e.is_already_exists() => {
                if config.overwrite() {
                    warn!("Repository already exists, reusing it");
                    return Ok(ProvisionOutcome::Reused);
                }
                return Err(ProvisionError::AlreadyExists {
                    repo: request.name.clone(),
                });
            }
            Err(source) => {
                return Err(ProvisionError::CreationFailed {
                    repo: request.name.clone(),
                    source,
                });
            }
        }

        wait_until_available(destination, &request.name).await?;
        Ok(ProvisionOutcome::Created)
    }
    .instrument(span)
    .await
}

async fn wait_until_available<D>(destination: &D, repo: &str) -> Result<(), ProvisionError>
where
    D: DestinationPlatform + ?Sized,
{
    for attempt in 1..=AVAILABILITY_ATTEMPTS {
        if destination.repository_exists(repo).await? {
            debug!(attempt, "Repository is available");
            return Ok(());
        }
        debug!(attempt, "Repository not available yet");
        pace(AVAILABILITY_POLL_INTERVAL).await;
    }

    Err(ProvisionError::NeverBecameAvailable {
        repo: repo.to_string(),
        attempts: AVAILABILITY_ATTEMPTS,
    })
}

/// Re-applies the default branch, replaces topics and, when enabled, sets
/// the custom properties.
///
/// A mirror push can move the default branch, so this runs after it.
///
/// # Errors
///
/// Returns [`ProvisionError::Destination`] on the first failing call.
pub async fn update_settings<D>(
    destination: &D,
    request: &NewRepository,
    project_name: &str,
    config: &MigrationConfig,
) -> Result<(), ProvisionError>
where
    D: DestinationPlatform + ?Sized,
{
    let span = info_span!("settings", repo = %request.name);

    async {
        let repo = request.name.as_str();
        let properties = if config.custom_properties() {
            vec![
                CustomProperty::new(MIGRATED_FROM_PROPERTY, "bitbucket"),
                CustomProperty::new(PROJECT_PROPERTY, clean_topic(project_name)),
            ]
        } else {
            Vec::new()
        };

        if config.dry_run() {
            info!(branch = %request.default_branch, "[DRY RUN] Would set default branch");
            info!(topics = ?request.topics, "[DRY RUN] Would replace topics");
            if !properties.is_empty() {
                info!(?properties, "[DRY RUN] Would set custom properties");
            }
            return Ok(());
        }

        destination
            .set_default_branch(repo, &request.default_branch)
            .await?;
        destination.replace_topics(repo, &request.topics).await?;
        if !properties.is_empty() {
            destination.set_custom_properties(repo, &properties).await?;
        }

        info!(branch = %request.default_branch, "Synced repository settings");
        Ok(())
    }
    .instrument(span)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::destination::{DestinationError, NewIssue, NewPullRequest};
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Destination fake that becomes available after `available_after`
    /// existence checks.
    #[derive(Default)]
    struct FakeDestination {
        already_exists: bool,
        available_after: u32,
        checks: Mutex<u32>,
        calls: Mutex<Vec<String>>,
    }

    impl FakeDestination {
        fn record(&self, call: String) {
            self.calls.lock().unwrap().push(call);
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl DestinationPlatform for FakeDestination {
        fn organization(&self) -> &str {
            "acme-gh"
        }

        async fn create_repository(&self, request: &NewRepository) -> Result<(), DestinationError> {
            self.record(format!("create {}", request.name));
            if self.already_exists {
                return Err(DestinationError::AlreadyExists {
                    message: "name already exists on this account".to_string(),
                });
            }
            Ok(())
        }

        async fn repository_exists(&self, _: &str) -> Result<bool, DestinationError> {
            let mut checks = self.checks.lock().unwrap();
            *checks += 1;
            Ok(*checks > self.available_after)
        }

        async fn set_default_branch(&self, _: &str, branch: &str) -> Result<(), DestinationError> {
            self.record(format!("branch {branch}"));
            Ok(())
        }

        async fn replace_topics(&self, _: &str, topics: &[String]) -> Result<(), DestinationError> {
            self.record(format!("topics {}", topics.join(",")));
            Ok(())
        }

        async fn set_custom_properties(
            &self,
            _: &str,
            properties: &[CustomProperty],
        ) -> Result<(), DestinationError> {
            let pairs: Vec<String> = properties
                .iter()
                .map(|p| format!("{}={}", p.name, p.value))
                .collect();
            self.record(format!("properties {}", pairs.join(",")));
            Ok(())
        }

        async fn create_issue(&self, _: &str, _: &NewIssue) -> Result<u64, DestinationError> {
            unreachable!()
        }

        async fn close_issue(&self, _: &str, _: u64) -> Result<(), DestinationError> {
            unreachable!()
        }

        async fn create_commit_comment(&self, _: &str, _: &str, _: &str) -> Result<(), DestinationError> {
            unreachable!()
        }

        async fn create_pull_request(&self, _: &str, _: &NewPullRequest) -> Result<u64, DestinationError> {
            unreachable!()
        }
    }

    fn config() -> MigrationConfig {
        MigrationConfig::new("acme", "bot", "s3cr3t", "acme-gh", "ghp_token")
    }

    fn descriptor() -> RepositoryDescriptor {
        RepositoryDescriptor {
            slug: "billing-api".to_string(),
            name: "Billing API".to_string(),
            is_private: true,
            description: "Invoices".to_string(),
            main_branch: Some("develop".to_string()),
            language: "rust".to_string(),
            project_name: "Core Services".to_string(),
        }
    }

    #[test]
    fn test_clean_topic() {
        assert_eq!(clean_topic("Core Services"), "core-services");
        assert_eq!(clean_topic("  Data  "), "data");
    }

    #[test]
    fn request_copies_descriptor() {
        let request = build_repository_request(&descriptor(), &config());
        assert_eq!(request.name, "billing-api");
        assert_eq!(request.visibility, Visibility::Private);
        assert_eq!(request.default_branch, "develop");
        assert_eq!(request.topics, vec!["migrated-from-bitbucket", "core-services"]);
    }

    #[test]
    fn request_visibility() {
        let config = config().with_private_visibility(Visibility::Internal);
        assert_eq!(
            build_repository_request(&descriptor(), &config).visibility,
            Visibility::Internal
        );

        let public = RepositoryDescriptor {
            is_private: false,
            ..descriptor()
        };
        assert_eq!(
            build_repository_request(&public, &config).visibility,
            Visibility::Public
        );
    }

    #[test]
    fn request_falls_back_to_main_for_empty_repositories() {
        let empty = RepositoryDescriptor {
            main_branch: None,
            ..descriptor()
        };
        assert_eq!(build_repository_request(&empty, &config()).default_branch, "main");
    }

    #[tokio::test(start_paused = true)]
    async fn creates_and_waits_for_availability() {
        let destination = FakeDestination {
            available_after: 3,
            ..Default::default()
        };
        let request = build_repository_request(&descriptor(), &config());

        let outcome = create_repository(&destination, &request, &config())
            .await
            .unwrap();

        assert_eq!(outcome, ProvisionOutcome::Created);
        assert_eq!(*destination.checks.lock().unwrap(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_twenty_checks() {
        let destination = FakeDestination {
            available_after: u32::MAX,
            ..Default::default()
        };
        let request = build_repository_request(&descriptor(), &config());

        let err = create_repository(&destination, &request, &config())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ProvisionError::NeverBecameAvailable { attempts: 20, .. }
        ));
        assert_eq!(*destination.checks.lock().unwrap(), 20);
    }

    #[tokio::test]
    async fn existing_repository_requires_overwrite() {
        let destination = FakeDestination {
            already_exists: true,
            ..Default::default()
        };
        let request = build_repository_request(&descriptor(), &config());

        let err = create_repository(&destination, &request, &config())
            .await
            .unwrap_err();
        assert!(matches!(err, ProvisionError::AlreadyExists { .. }));

        let outcome = create_repository(&destination, &request, &config().with_overwrite(true))
            .await
            .unwrap();
        assert_eq!(outcome, ProvisionOutcome::Reused);
    }

    #[tokio::test]
    async fn dry_run_creates_nothing() {
        let destination = FakeDestination::default();
        let config = config().with_dry_run(true);
        let request = build_repository_request(&descriptor(), &config);

        let outcome = create_repository(&destination, &request, &config)
            .await
            .unwrap();
        update_settings(&destination, &request, "Core Services", &config)
            .await
            .unwrap();

        assert_eq!(outcome, ProvisionOutcome::DryRun);
        assert!(destination.calls().is_empty());
    }

    #[tokio::test]
    async fn settings_include_custom_properties_when_enabled() {
        let destination = FakeDestination::default();
        let config = config().with_custom_properties(true);
        let request = build_repository_request(&descriptor(), &config);

        update_settings(&destination, &request, "Core Services", &config)
            .await
            .unwrap();

        assert_eq!(
            destination.calls(),
            vec![
                "branch develop",
                "topics migrated-from-bitbucket,core-services",
                "properties migrated_from=bitbucket,bitbucket_project=core-services",
            ]
        );
    }
}
