//! Webhook receiver for hosting-service push, pull-request and
//! issue-comment events.
//!
//! The sender only ever sees three outcomes: 401 for a bad signature, 400
//! for a body that is not JSON, and 204 otherwise. Classification, policy
//! and outbound calls happen in a spawned task after the acknowledgment,
//! so the sender never waits on job creation.

use axum::{
    body::Bytes,
    extract::State as AxumState,
    http::{HeaderMap, StatusCode, header},
};
use tracing::{error, warn};

use crate::SharedState;
use crate::dispatch;
use crate::payload::decode_body;
use crate::signature::verify_signature;

const SIGNATURE_HEADER: &str = "X-Hub-Signature";

/// Handles the webhook POST request.
pub async fn handle_webhook(
    AxumState(state): AxumState<SharedState>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    let secret = {
        let config = state.config.read().unwrap();
        config.provider.secret.clone()
    };

    let signature = headers.get(SIGNATURE_HEADER).and_then(|v| v.to_str().ok());
    if !verify_signature(signature, &secret, &body) {
        // Best effort at naming the repository in the log; the body is
        // untrusted at this point so a parse failure is fine.
        let repo = serde_json::from_slice::<serde_json::Value>(&body)
            .ok()
            .and_then(|v| v.get("repository")?.get("name")?.as_str().map(String::from));
        warn!(
            "Someone hit the webhook for '{}' and it failed to validate",
            repo.as_deref().unwrap_or("<unknown>")
        );
        return StatusCode::UNAUTHORIZED;
    }

    let content_type = headers.get(header::CONTENT_TYPE).and_then(|v| v.to_str().ok());
    let payload = match decode_body(content_type, &body) {
        Ok(value) => value,
        Err(e) => {
            error!("Webhook payload failed to parse as JSON: {}", e);
            return StatusCode::BAD_REQUEST;
        }
    };

    // Acknowledge now; translate and emit asynchronously.
    let shared = state.clone();
    tokio::spawn(async move {
        dispatch::route_event(&shared, payload).await;
    });

    StatusCode::NO_CONTENT
}
