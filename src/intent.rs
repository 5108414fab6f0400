//! Job factories: pure translation from classified payloads into
//! [`JobIntent`] values for the policy engine.

use serde::Serialize;

use crate::avatar::avatar_url;
use crate::payload::{PullRequest, PushPayload};

/// Prefix that marks a push ref as a named branch.
pub const BRANCH_REF_PREFIX: &str = "refs/heads/";

const PLUGIN_NAME: &str = "github";

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum TriggerKind {
    Commit,
    PullRequest,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TriggerAuthor {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub login: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub image: String,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TriggerSource {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub plugin: &'static str,
}

impl TriggerSource {
    fn plugin() -> Self {
        Self { kind: "plugin", plugin: PLUGIN_NAME }
    }
}

/// What human action caused a job. Embedded verbatim into the emitted job.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Trigger {
    #[serde(rename = "type")]
    pub kind: TriggerKind,
    pub author: TriggerAuthor,
    pub url: String,
    pub message: String,
    pub timestamp: String,
    pub source: TriggerSource,
}

/// Pointer to the exact code state to build: a named branch at a commit,
/// or an arbitrary fetchable ref.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum RefSpec {
    Branch { branch: String, id: String },
    Fetch { fetch: String },
}

impl RefSpec {
    /// The merge ref the hosting service maintains for a pull request.
    pub fn pull_request_merge(number: u64) -> Self {
        RefSpec::Fetch { fetch: format!("refs/pull/{number}/merge") }
    }
}

/// A job request before policy evaluation. `deploy` is what the trigger
/// asks for; the policy engine has the final say.
#[derive(Debug, Clone)]
pub struct JobIntent {
    pub branch: Option<String>,
    pub trigger: Trigger,
    pub deploy: bool,
    pub ref_spec: RefSpec,
}

/// Builds the intent for a push event. Branch refs resolve to the branch
/// at the payload's `after` commit; tags and other refs are carried as a
/// raw fetch path. Pushes always request deploy; policy may override.
pub fn push_job(payload: &PushPayload) -> JobIntent {
    let (branch, ref_spec) = match payload.git_ref.strip_prefix(BRANCH_REF_PREFIX) {
        Some(name) => (
            Some(name.to_string()),
            RefSpec::Branch { branch: name.to_string(), id: payload.after.clone() },
        ),
        None => (None, RefSpec::Fetch { fetch: payload.git_ref.clone() }),
    };

    let commit = &payload.head_commit;
    JobIntent {
        branch,
        trigger: Trigger {
            kind: TriggerKind::Commit,
            author: TriggerAuthor {
                login: None,
                email: Some(commit.author.email.clone()),
                image: avatar_url(&commit.author.email, false),
            },
            url: commit.url.clone(),
            message: commit.message.clone(),
            timestamp: commit.timestamp.clone(),
            source: TriggerSource::plugin(),
        },
        deploy: true,
        ref_spec,
    }
}

/// Builds the intent for a pull request: the base branch at the PR's merge
/// ref. Pull requests never auto-deploy.
pub fn pull_request_job(pr: &PullRequest) -> JobIntent {
    JobIntent {
        branch: Some(pr.base.ref_name.clone()),
        trigger: Trigger {
            kind: TriggerKind::PullRequest,
            author: TriggerAuthor {
                login: Some(pr.user.login.clone()),
                email: None,
                image: pr.user.avatar_url.clone(),
            },
            url: pr.html_url.clone(),
            message: pr.title.clone(),
            timestamp: pr.updated_at.clone(),
            source: TriggerSource::plugin(),
        },
        deploy: false,
        ref_spec: RefSpec::pull_request_merge(pr.number),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::{CommitAuthor, HeadCommit, PrBase, PrUser, RepoInfo};

    fn push_payload(git_ref: &str) -> PushPayload {
        PushPayload {
            git_ref: git_ref.to_string(),
            after: "abc123".to_string(),
            head_commit: HeadCommit {
                author: CommitAuthor { email: "dev@example.com".to_string() },
                message: "fix widget".to_string(),
                timestamp: "2014-01-01T00:00:00Z".to_string(),
                url: "https://example.com/commit/abc123".to_string(),
            },
            repository: RepoInfo { name: "widget".to_string(), pulls_url: None },
        }
    }

    fn pull_request(number: u64) -> PullRequest {
        PullRequest {
            number,
            title: "Add widget".to_string(),
            user: PrUser {
                login: "contributor".to_string(),
                avatar_url: "https://img.example.com/contributor".to_string(),
            },
            base: PrBase { ref_name: "master".to_string() },
            html_url: format!("https://example.com/pull/{number}"),
            updated_at: "2014-01-02T00:00:00Z".to_string(),
            comments_url: None,
        }
    }

    #[test]
    fn push_to_branch_ref_resolves_branch_and_commit() {
        let intent = push_job(&push_payload("refs/heads/feature-x"));
        assert_eq!(intent.branch.as_deref(), Some("feature-x"));
        assert_eq!(
            intent.ref_spec,
            RefSpec::Branch { branch: "feature-x".to_string(), id: "abc123".to_string() }
        );
        assert!(intent.deploy);
        assert_eq!(intent.trigger.kind, TriggerKind::Commit);
        assert_eq!(intent.trigger.author.email.as_deref(), Some("dev@example.com"));
    }

    #[test]
    fn push_to_tag_keeps_raw_ref() {
        let intent = push_job(&push_payload("refs/tags/v1.2.0"));
        assert_eq!(intent.branch, None);
        assert_eq!(intent.ref_spec, RefSpec::Fetch { fetch: "refs/tags/v1.2.0".to_string() });
    }

    #[test]
    fn push_author_image_is_deterministic() {
        let a = push_job(&push_payload("refs/heads/x"));
        let b = push_job(&push_payload("refs/heads/x"));
        assert_eq!(a.trigger.author.image, b.trigger.author.image);
    }

    #[test]
    fn pull_request_uses_merge_ref() {
        let intent = pull_request_job(&pull_request(42));
        assert_eq!(intent.branch.as_deref(), Some("master"));
        assert_eq!(intent.ref_spec, RefSpec::Fetch { fetch: "refs/pull/42/merge".to_string() });
        assert!(!intent.deploy);
        assert_eq!(intent.trigger.kind, TriggerKind::PullRequest);
        assert_eq!(intent.trigger.author.login.as_deref(), Some("contributor"));
    }

    #[test]
    fn merge_ref_shape_holds_for_any_number() {
        for number in [1_u64, 42, 9999] {
            assert_eq!(
                RefSpec::pull_request_merge(number),
                RefSpec::Fetch { fetch: format!("refs/pull/{number}/merge") }
            );
        }
    }

    #[test]
    fn ref_spec_serializes_flat() {
        let branch = RefSpec::Branch { branch: "master".to_string(), id: "abc".to_string() };
        assert_eq!(
            serde_json::to_value(&branch).unwrap(),
            serde_json::json!({ "branch": "master", "id": "abc" })
        );
        let fetch = RefSpec::pull_request_merge(7);
        assert_eq!(
            serde_json::to_value(&fetch).unwrap(),
            serde_json::json!({ "fetch": "refs/pull/7/merge" })
        );
    }
}
