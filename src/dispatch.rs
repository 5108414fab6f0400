//! Event dispatch: wires classified payloads through the job factories and
//! the policy engine, applying the pull-request trust gates along the way.
//!
//! Everything here runs after the webhook has already been acknowledged,
//! so outcomes are logged rather than surfaced to the sender.

use std::sync::LazyLock;

use regex::Regex;
use tracing::{error, info, warn};

use crate::intent::{pull_request_job, push_job};
use crate::payload::{self, Event, IssueCommentPayload, PullRequestPayload, PushPayload};
use crate::policy::make_job;
use crate::{AccountConfig, AppState, ProjectConfig, ProviderConfig, PullRequestPolicy};

/// PR actions that can start a build; everything else is ignored.
const PR_ACTION_OPENED: &str = "opened";
const PR_ACTION_SYNCHRONIZE: &str = "synchronize";

// Whole words delimited by whitespace or string edges, case-sensitive.
// Hyphenated compounds ("conveyor-test") deliberately do not count.
static MENTION_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|\s)conveyor(?:\s|$)").expect("static pattern"));
static TEST_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|\s)test(?:\s|$)").expect("static pattern"));

/// Whether a comment body asks for a test run: both the product mention
/// and the word "test" must appear as whole words, in any order.
pub fn comment_requests_test(body: &str) -> bool {
    MENTION_WORD.is_match(body) && TEST_WORD.is_match(body)
}

/// Routes a decoded payload to its handler. Runs in a spawned task after
/// the 204 acknowledgment; all failures end here as log lines.
pub async fn route_event(state: &AppState, payload: serde_json::Value) {
    let event = match payload::classify(payload) {
        Ok(event) => event,
        Err(e) => {
            error!("Dropping unprocessable webhook payload: {}", e);
            return;
        }
    };

    // Snapshot configuration for the duration of this event.
    let repo_name = event.repository().name.clone();
    let (provider, account, project) = {
        let config = state.config.read().unwrap();
        let Some(project) = config.find_project(&repo_name).cloned() else {
            warn!("No matching project for repository '{}', skipping.", repo_name);
            return;
        };
        (config.provider.clone(), config.account.clone(), project)
    };

    match event {
        Event::PullRequest(p) => {
            if provider.pull_requests == PullRequestPolicy::None {
                info!("Got pull request, but testing pull requests is disabled");
                return;
            }
            start_from_pull_request(state, &provider, &account, &project, p).await;
        }
        Event::IssueComment(p) => {
            if provider.pull_requests != PullRequestPolicy::Whitelist {
                return;
            }
            start_from_comment(state, &provider, &account, &project, p).await;
        }
        Event::Push(p) => start_from_commit(state, &project, p).await,
    }
}

/// Push path. Pushes to branches the project has not seen yet request
/// branch creation first; a creation failure is logged and the job is
/// still attempted with the synthesized default branch policy.
pub async fn start_from_commit(state: &AppState, project: &ProjectConfig, payload: PushPayload) {
    let intent = push_job(&payload);

    if let Some(name) = intent.branch.as_deref() {
        if project.branch(name).is_none() {
            if let Err(e) = state.add_branch(&project.name, name) {
                error!("Failed to add branch '{}': {}", name, e);
            }
        }
    }

    if let Some(job) = make_job(project, intent) {
        info!("Prepared {:?} job {} for project '{}'", job.kind, job.id, job.project);
        state.jobs.prepare(job);
    }
}

/// Outcome of the pull-request trust gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrGate {
    /// Author is trusted (or policy is permissive): build it.
    Run,
    /// Ignore the event entirely.
    Drop,
    /// Drop the event, but post a confirmation request on the PR.
    AskToTest,
}

/// Pure decision for a pull-request event. Only "opened" and
/// "synchronize" can run; under the whitelist policy an unknown author is
/// dropped, with a one-time ask on "opened" when enabled. "synchronize"
/// never asks, so repeated pushes to a PR don't re-prompt.
pub fn pr_gate(provider: &ProviderConfig, action: &str, author: &str) -> PrGate {
    if action != PR_ACTION_OPENED && action != PR_ACTION_SYNCHRONIZE {
        return PrGate::Drop;
    }
    if provider.pull_requests == PullRequestPolicy::Whitelist && !provider.whitelisted(author) {
        if action == PR_ACTION_OPENED && provider.ask_to_pr {
            return PrGate::AskToTest;
        }
        return PrGate::Drop;
    }
    PrGate::Run
}

pub async fn start_from_pull_request(
    state: &AppState,
    provider: &ProviderConfig,
    account: &AccountConfig,
    project: &ProjectConfig,
    payload: PullRequestPayload,
) {
    let pr = payload.pull_request;
    match pr_gate(provider, &payload.action, &pr.user.login) {
        PrGate::Drop => {}
        PrGate::AskToTest => match pr.comments_url.as_deref() {
            Some(comments_url) => {
                info!("Asking whether PR #{} by '{}' should be tested", pr.number, pr.user.login);
                state.github.ask_to_test_pr(comments_url, &account.access_token).await;
            }
            None => warn!("PR #{} has no comments URL; cannot ask to test", pr.number),
        },
        PrGate::Run => {
            if let Some(job) = make_job(project, pull_request_job(&pr)) {
                info!("Prepared {:?} job {} for PR #{}", job.kind, job.id, pr.number);
                state.jobs.prepare(job);
            }
        }
    }
}

/// Pure decision for a comment event: returns the PR number to fetch, or
/// `None` for the benign no-op cases (not a PR, untrusted commenter,
/// already-approved author, no trigger phrase).
pub fn comment_decision(provider: &ProviderConfig, payload: &IssueCommentPayload) -> Option<u64> {
    let pr_url = payload.issue.pull_request.as_ref()?.html_url.as_deref()?;
    if !provider.whitelisted(&payload.comment.user.login) {
        return None;
    }
    // An issue opened by a whitelisted user is treated as pre-approved;
    // the PR event already triggered a build.
    if provider.whitelisted(&payload.issue.user.login) {
        return None;
    }
    if !comment_requests_test(&payload.comment.body) {
        return None;
    }
    parse_pr_number(pr_url)
}

/// The PR number is the trailing path segment of the issue's PR link.
pub fn parse_pr_number(html_url: &str) -> Option<u64> {
    html_url.trim_end_matches('/').rsplit('/').next()?.parse().ok()
}

pub async fn start_from_comment(
    state: &AppState,
    provider: &ProviderConfig,
    account: &AccountConfig,
    project: &ProjectConfig,
    payload: IssueCommentPayload,
) {
    let Some(number) = comment_decision(provider, &payload) else {
        return;
    };
    let Some(pulls_url) = payload.repository.pulls_url.as_deref() else {
        warn!("Comment event for '{}' carries no pulls URL; cannot fetch PR", project.name);
        return;
    };

    match state.github.fetch_pull_request(pulls_url, number, &account.access_token).await {
        Ok(pr) => {
            if let Some(job) = make_job(project, pull_request_job(&pr)) {
                info!("Prepared {:?} job {} for PR #{} (by comment)", job.kind, job.id, number);
                state.jobs.prepare(job);
            }
        }
        Err(e) => error!("Failed to get pull request #{}: {}", number, e),
    }
}
