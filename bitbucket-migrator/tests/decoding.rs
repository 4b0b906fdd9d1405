use std::path::PathBuf;

use bitbucket_migrator::{decode_pull_requests, DecodeError, PullRequestState};
use serde_json::{json, Value};

fn fixture(name: &str) -> Value {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name);
    let text = std::fs::read_to_string(path).unwrap();
    serde_json::from_str(&text).unwrap()
}

#[test]
fn decode_pull_requests_from_fixture() {
    let collection = decode_pull_requests(&fixture("pullrequests.json")).unwrap();

    assert_eq!(collection.size, 4);
    assert_eq!(collection.pagelen, 50);
    assert!(collection.next.is_none());

    let ids: Vec<u64> = collection.values.iter().map(|pr| pr.id).collect();
    assert_eq!(ids, vec![7, 9, 42, 43]);

    let merged = &collection.values[2];
    assert_eq!(merged.state, PullRequestState::Merged);
    assert_eq!(merged.merge_commit.as_deref(), Some("abc123def456"));
    assert_eq!(merged.source_branch, "feature/retry");
    assert_eq!(merged.destination_branch, "develop");
    assert_eq!(merged.author_name(), "Jane Doe");
    assert_eq!(merged.comment_count, 3);
    assert!(merged.close_source_branch);
    assert!(merged.created_on.is_some());
}

#[test]
fn decode_tolerates_missing_and_malformed_optional_fields() {
    let collection = decode_pull_requests(&fixture("pullrequests.json")).unwrap();
    let cleanup = collection.values.iter().find(|pr| pr.id == 43).unwrap();

    assert!(cleanup.author.is_none());
    assert_eq!(cleanup.author_name(), "unknown");
    assert!(cleanup.merge_commit.is_none());
    assert!(cleanup.created_on.is_none());
    assert!(cleanup.updated_on.is_none());
    assert_eq!(cleanup.task_count, 0);

    let draft = collection.values.iter().find(|pr| pr.id == 9).unwrap();
    assert!(draft.draft);
}

#[test]
fn decode_surfaces_platform_errors() {
    let payload = json!({
        "type": "error",
        "error": { "message": "Repository not found" }
    });

    let err = decode_pull_requests(&payload).unwrap_err();
    match err {
        DecodeError::Platform { message } => assert_eq!(message, "Repository not found"),
        other => panic!("unexpected error: {other:?}"),
    }
}
