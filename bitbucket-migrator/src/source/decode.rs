//! Decoding of Bitbucket pull request payloads.
//!
//! Payloads are first deserialized into an all-optional intermediate shape
//! and then converted, so a missing field takes its zero value while a field
//! of the wrong type surfaces as one [`DecodeError::Shape`].

use super::error::DecodeError;
use super::pull_request::{
    Account, Content, PullRequest, PullRequestCollection, PullRequestState, Rendered,
};
use chrono::{DateTime, Utc};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawPullRequest {
    #[serde(deserialize_with = "whole_number")]
    id: Option<u64>,
    title: Option<String>,
    summary: Option<RawContent>,
    rendered: Option<RawRendered>,
    state: Option<String>,
    author: Option<RawAccount>,
    source: Option<RawEndpoint>,
    destination: Option<RawEndpoint>,
    merge_commit: Option<RawCommit>,
    #[serde(deserialize_with = "whole_number")]
    comment_count: Option<u64>,
    #[serde(deserialize_with = "whole_number")]
    task_count: Option<u64>,
    close_source_branch: Option<bool>,
    reason: Option<String>,
    created_on: Option<String>,
    updated_on: Option<String>,
    draft: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawContent {
    raw: Option<String>,
    markup: Option<String>,
    html: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawRendered {
    title: Option<RawContent>,
    description: Option<RawContent>,
    reason: Option<RawContent>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawAccount {
    display_name: Option<String>,
    nickname: Option<String>,
    account_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawEndpoint {
    branch: Option<RawBranch>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawBranch {
    name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawCommit {
    hash: Option<String>,
}

impl From<RawContent> for Content {
    fn from(raw: RawContent) -> Self {
        Self {
            raw: raw.raw.unwrap_or_default(),
            markup: raw.markup.unwrap_or_default(),
            html: raw.html.unwrap_or_default(),
        }
    }
}

impl From<RawAccount> for Account {
    fn from(raw: RawAccount) -> Self {
        Self {
            display_name: raw.display_name.unwrap_or_default(),
            nickname: raw.nickname.unwrap_or_default(),
            account_id: raw.account_id.unwrap_or_default(),
        }
    }
}

impl RawEndpoint {
    fn branch_name(self) -> String {
        self.branch.and_then(|b| b.name).unwrap_or_default()
    }
}

impl From<RawPullRequest> for PullRequest {
    fn from(raw: RawPullRequest) -> Self {
        let rendered = raw.rendered.unwrap_or_default();
        Self {
            id: raw.id.unwrap_or_default(),
            title: raw.title.unwrap_or_default(),
            summary: raw.summary.map(Content::from).unwrap_or_default(),
            rendered: Rendered {
                title: rendered.title.map(Content::from).unwrap_or_default(),
                description: rendered.description.map(Content::from).unwrap_or_default(),
                reason: rendered.reason.map(Content::from).unwrap_or_default(),
            },
            state: raw
                .state
                .as_deref()
                .map(PullRequestState::from_api)
                .unwrap_or_default(),
            author: raw.author.map(Account::from),
            source_branch: raw.source.map(RawEndpoint::branch_name).unwrap_or_default(),
            destination_branch: raw
                .destination
                .map(RawEndpoint::branch_name)
                .unwrap_or_default(),
            merge_commit: raw.merge_commit.and_then(|c| c.hash),
            comment_count: raw.comment_count.unwrap_or_default(),
            task_count: raw.task_count.unwrap_or_default(),
            close_source_branch: raw.close_source_branch.unwrap_or_default(),
            reason: raw.reason.unwrap_or_default(),
            created_on: raw.created_on.as_deref().and_then(parse_timestamp),
            updated_on: raw.updated_on.as_deref().and_then(parse_timestamp),
            draft: raw.draft.unwrap_or_default(),
        }
    }
}

/// Accepts counters and ids encoded either as integers or as whole floats
/// (`42.0`), which some Bitbucket proxies and exports produce.
fn whole_number<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_u64()
            .or_else(|| {
                n.as_f64()
                    .filter(|f| f.is_finite() && *f >= 0.0 && f.fract() == 0.0)
                    .map(|f| f as u64)
            })
            .map(Some)
            .ok_or_else(|| D::Error::custom(format!("invalid number {n}, expected a whole number"))),
        Some(other) => Err(D::Error::custom(format!(
            "invalid type: {}, expected a whole number",
            kind_of(&other)
        ))),
    }
}

/// Parses Bitbucket's `2006-01-02T15:04:05.000000+00:00` timestamps.
///
/// Anything that is not RFC 3339 is left unset rather than rejected.
fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn as_object(value: &Value) -> Result<&Map<String, Value>, DecodeError> {
    value.as_object().ok_or(DecodeError::NotAnObject {
        found: kind_of(value),
    })
}

/// Extracts the message of a `{"type": "error", "error": {...}}` payload.
fn platform_error(object: &Map<String, Value>) -> DecodeError {
    let message = object
        .get("error")
        .and_then(|e| e.get("message"))
        .and_then(Value::as_str)
        .unwrap_or("unknown error")
        .to_string();
    DecodeError::Platform { message }
}

fn is_error_payload(object: &Map<String, Value>) -> bool {
    object.get("type").and_then(Value::as_str) == Some("error")
}

/// Reads an optional paging number, treating absent or non-numeric as zero.
fn number_field(object: &Map<String, Value>, key: &str) -> u64 {
    object
        .get(key)
        .and_then(|v| v.as_u64().or_else(|| v.as_f64().map(|f| f as u64)))
        .unwrap_or(0)
}

/// Decodes a single pull request resource.
///
/// # Errors
///
/// Returns [`DecodeError::NotAnObject`] for non-object input,
/// [`DecodeError::Platform`] when Bitbucket returned an error object, and
/// [`DecodeError::Shape`] when a known field has the wrong type.
pub fn decode_pull_request(value: &Value) -> Result<PullRequest, DecodeError> {
    let object = as_object(value)?;
    if is_error_payload(object) {
        return Err(platform_error(object));
    }

    let raw = RawPullRequest::deserialize(value).map_err(|source| DecodeError::Shape { source })?;
    Ok(raw.into())
}

/// Decodes a paginated list of pull requests.
///
/// The first failing record aborts the whole decode. The returned values
/// are sorted by ascending id.
///
/// # Errors
///
/// Returns [`DecodeError`] if the page or any of its records is malformed.
pub fn decode_pull_requests(value: &Value) -> Result<PullRequestCollection, DecodeError> {
    let object = as_object(value)?;
    if is_error_payload(object) {
        return Err(platform_error(object));
    }

    let values = object
        .get("values")
        .and_then(Value::as_array)
        .ok_or(DecodeError::MissingValues)?
        .iter()
        .map(decode_pull_request)
        .collect::<Result<Vec<_>, _>>()?;

    let mut collection = PullRequestCollection {
        page: number_field(object, "page"),
        pagelen: number_field(object, "pagelen"),
        size: number_field(object, "size"),
        next: object
            .get("next")
            .and_then(Value::as_str)
            .map(str::to_string),
        values,
    };
    collection.sort();
    Ok(collection)
}
