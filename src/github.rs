//! Outbound calls to the hosting service: fetching pull-request detail and
//! posting the ask-to-test confirmation comment. Both are best-effort and
//! at-most-once; failures are logged by the caller or here, never retried.

use std::time::Duration;

use reqwest::StatusCode;
use reqwest::header::AUTHORIZATION;
use serde_json::json;
use tracing::warn;

use crate::error::{RelayError, Result};
use crate::payload::PullRequest;

const OUTBOUND_TIMEOUT: Duration = Duration::from_secs(10);

/// URI-template parameter in the repository's `pulls_url`.
const NUMBER_TEMPLATE: &str = "{/number}";

/// Comment posted on pull requests from non-whitelisted authors.
pub const ASK_TO_TEST_BODY: &str = "Should this PR be tested?";

/// Expands a templated pull-request listing endpoint for one PR, e.g.
/// `.../pulls{/number}` becomes `.../pulls/42`.
pub fn expand_pulls_url(pulls_url: &str, number: u64) -> String {
    if pulls_url.contains(NUMBER_TEMPLATE) {
        pulls_url.replace(NUMBER_TEMPLATE, &format!("/{number}"))
    } else {
        format!("{}/{}", pulls_url.trim_end_matches('/'), number)
    }
}

/// Thin client for the two outbound hosting-service calls.
#[derive(Debug, Clone)]
pub struct HostClient {
    http: reqwest::Client,
}

impl HostClient {
    pub fn new() -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(OUTBOUND_TIMEOUT)
            .user_agent(concat!("conveyor/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { http })
    }

    /// Fetches full pull-request detail from the repository's templated
    /// listing endpoint, authenticated with the account token.
    pub async fn fetch_pull_request(
        &self,
        pulls_url: &str,
        number: u64,
        token: &str,
    ) -> Result<PullRequest> {
        let url = expand_pulls_url(pulls_url, number);
        let response = self
            .http
            .get(&url)
            .header(AUTHORIZATION, format!("token {token}"))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RelayError::UnexpectedStatus { status: status.as_u16(), body });
        }
        Ok(response.json().await?)
    }

    /// Posts a comment asking a whitelisted user to confirm testing.
    /// Fire-and-forget: a non-201 response or transport failure is logged
    /// as a warning and swallowed.
    pub async fn ask_to_test_pr(&self, comments_url: &str, token: &str) {
        let result = self
            .http
            .post(comments_url)
            .header(AUTHORIZATION, format!("token {token}"))
            .json(&json!({ "body": ASK_TO_TEST_BODY }))
            .send()
            .await;

        match result {
            Ok(response) if response.status() != StatusCode::CREATED => {
                let status = response.status();
                let text = response.text().await.unwrap_or_default();
                warn!("Unexpected response to comment creation: {} {}", status, text);
            }
            Ok(_) => {}
            Err(e) => warn!("Failed to post confirmation comment: {}", e),
        }
    }
}
