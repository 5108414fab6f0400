//! Server status endpoints

use axum::{Json, extract::State as AxumState, response::IntoResponse};
use serde_json::json;

use crate::SharedState;

pub async fn root() -> &'static str {
    "conveyor webhook relay"
}

/// Returns the current server status
pub async fn status(AxumState(state): AxumState<SharedState>) -> impl IntoResponse {
    let total_projects = {
        let config = state.config.read().unwrap();
        config.project.len()
    };

    Json(json!({
        "server": {
            "name": env!("CARGO_PKG_NAME"),
            "version": env!("CARGO_PKG_VERSION"),
            "started_at": state.started_at,
            "uptime_seconds": state.start_time.elapsed().as_secs(),
        },
        "config": {
            "total_projects": total_projects,
        }
    }))
}
