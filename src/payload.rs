//! Typed webhook payloads and event classification.
//!
//! A decoded payload is sorted into one of three categories by the
//! presence of marker fields, checked in precedence order:
//! `pull_request`, then `comment`, then push. Payloads that match a
//! category but are missing required fields fail with
//! [`RelayError::PayloadMalformed`] instead of panicking.

use serde::Deserialize;

use crate::error::{RelayError, Result};

/// Repository info shared by all event categories. `pulls_url` is the
/// templated pull-request listing endpoint; only comment handling needs it.
#[derive(Debug, Clone, Deserialize)]
pub struct RepoInfo {
    pub name: String,
    pub pulls_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommitAuthor {
    pub email: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HeadCommit {
    pub author: CommitAuthor,
    pub message: String,
    pub timestamp: String,
    pub url: String,
}

/// A push (commit) event.
#[derive(Debug, Deserialize)]
pub struct PushPayload {
    #[serde(rename = "ref")]
    pub git_ref: String,
    pub after: String,
    pub head_commit: HeadCommit,
    pub repository: RepoInfo,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PrUser {
    pub login: String,
    pub avatar_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PrBase {
    #[serde(rename = "ref")]
    pub ref_name: String,
}

/// Pull-request detail, as delivered in `pull_request` events and returned
/// by the pull-request fetch endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct PullRequest {
    pub number: u64,
    pub title: String,
    pub user: PrUser,
    pub base: PrBase,
    pub html_url: String,
    pub updated_at: String,
    pub comments_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PullRequestPayload {
    pub action: String,
    pub pull_request: PullRequest,
    pub repository: RepoInfo,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IssueUser {
    pub login: String,
}

/// Link from an issue to the pull request it fronts. Present only when the
/// commented-on issue actually is a PR.
#[derive(Debug, Clone, Deserialize)]
pub struct IssuePrLink {
    pub html_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Issue {
    pub pull_request: Option<IssuePrLink>,
    pub user: IssueUser,
}

#[derive(Debug, Deserialize)]
pub struct Comment {
    pub user: IssueUser,
    pub body: String,
}

#[derive(Debug, Deserialize)]
pub struct IssueCommentPayload {
    pub issue: Issue,
    pub comment: Comment,
    pub repository: RepoInfo,
}

/// A classified webhook event.
#[derive(Debug)]
pub enum Event {
    Push(PushPayload),
    PullRequest(PullRequestPayload),
    IssueComment(IssueCommentPayload),
}

impl Event {
    /// The repository the event belongs to; used to resolve the project.
    pub fn repository(&self) -> &RepoInfo {
        match self {
            Event::Push(p) => &p.repository,
            Event::PullRequest(p) => &p.repository,
            Event::IssueComment(p) => &p.repository,
        }
    }
}

fn malformed(e: serde_json::Error) -> RelayError {
    RelayError::PayloadMalformed(e.to_string())
}

/// Classifies a decoded payload into its event category and deserializes
/// the matching shape.
pub fn classify(payload: serde_json::Value) -> Result<Event> {
    if payload.get("pull_request").is_some() {
        let parsed: PullRequestPayload = serde_json::from_value(payload).map_err(malformed)?;
        return Ok(Event::PullRequest(parsed));
    }
    if payload.get("comment").is_some() {
        let parsed: IssueCommentPayload = serde_json::from_value(payload).map_err(malformed)?;
        return Ok(Event::IssueComment(parsed));
    }
    let parsed: PushPayload = serde_json::from_value(payload).map_err(malformed)?;
    Ok(Event::Push(parsed))
}

/// Extracts the JSON payload from a webhook request body.
///
/// Hooks registered for form encoding deliver
/// `application/x-www-form-urlencoded` with the JSON in a `payload` field;
/// everything else is treated as a raw JSON body. The signature is always
/// computed over the raw body, so this runs only after verification.
pub fn decode_body(content_type: Option<&str>, body: &[u8]) -> Result<serde_json::Value> {
    #[derive(Deserialize)]
    struct PayloadForm {
        payload: String,
    }

    if content_type.is_some_and(|ct| ct.starts_with("application/x-www-form-urlencoded")) {
        let form: PayloadForm = serde_urlencoded::from_bytes(body)
            .map_err(|e| RelayError::PayloadMalformed(e.to_string()))?;
        serde_json::from_str(&form.payload).map_err(malformed)
    } else {
        serde_json::from_slice(body).map_err(malformed)
    }
}
