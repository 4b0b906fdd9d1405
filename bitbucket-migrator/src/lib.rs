#![doc = include_str!(concat!("../", env!("CARGO_PKG_README")))]

pub mod destination;
pub mod mirror;
pub mod provisioning;
pub mod pull_requests;
pub mod rate_limit;
pub mod repo_names;
pub mod runner;
pub mod source;
pub mod summary;
pub mod templates;

pub use destination::{DestinationError, DestinationPlatform, GitHubDestination, Visibility};
pub use mirror::{clone_mirror, push_mirror, Git, GitCli, MirrorClone, MirrorError};
pub use provisioning::{
    build_repository_request, clean_topic, create_repository, update_settings, ProvisionError,
    ProvisionOutcome,
};
pub use pull_requests::{replicate_merged, replicate_open, ReplicationError, ReplicationReport};
pub use rate_limit::{check_core_rate_limit, ensure_core_rate_limit, wait_if_needed, RateLimitInfo};
pub use repo_names::{
    load_repo_list, parse_repo_list, sanitize_repo_name, sanitize_repo_names, RepoListError,
};
pub use runner::{
    parse_transform_program, CloneProtocol, MigrationConfig, Phases, Runner, RunnerError,
};
pub use source::{
    decode_pull_request, decode_pull_requests, make_read_only, BitbucketClient, DecodeError,
    PullRequest, PullRequestCollection, PullRequestState, RepositoryDescriptor, SourceError,
    SourcePlatform,
};
pub use summary::{ProcessingResult, RunSummary};
pub use templates::{
    clean_summary, create_handlebars_registry, generate_pull_request_title, TemplateError,
    TemplateRenderer,
};
