use axum::{Router, routing};
use conveyor::api::{handle_webhook, root, status, stream_jobs};
use conveyor::error::RelayError;
use conveyor::{AppState, RelayConfig};
use std::fs;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tracing::{self, info};

const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:8888";
const DEFAULT_CONFIG_PATH: &str = "conveyor.toml";

/// Load and parse the configuration file
fn load_config(path: &str) -> Result<RelayConfig, RelayError> {
    let config_str = fs::read_to_string(path).map_err(|e| {
        RelayError::Config(format!("Failed to read config file '{}': {}", path, e))
    })?;

    let config: RelayConfig = toml::from_str(&config_str).map_err(|e| {
        RelayError::Config(format!("Failed to parse config file '{}': {}", path, e))
    })?;

    Ok(config)
}

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();

    let bind_address =
        std::env::var("BIND_ADDRESS").unwrap_or_else(|_| DEFAULT_BIND_ADDRESS.to_string());
    let config_path =
        std::env::var("CONVEYOR_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());

    let config: RelayConfig = match load_config(&config_path) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt::init();

    let state = match AppState::new(config) {
        Ok(state) => Arc::new(state),
        Err(e) => {
            eprintln!("Startup error: {}", e);
            std::process::exit(1);
        }
    };

    // Log prepared jobs so a deployment without an attached scheduler still
    // shows what would be built.
    let mut rx = state.jobs.subscribe();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(job) => info!(
                    "job.prepare: {} for project '{}' ({:?})",
                    job.id, job.project, job.kind
                ),
                Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => break,
            }
        }
    });

    let app = Router::new()
        .route("/", routing::get(root))
        .route("/webhook", routing::post(handle_webhook))
        .route("/status", routing::get(status))
        .route("/jobs/stream", routing::get(stream_jobs))
        .with_state(state);

    info!("Listening on {}", bind_address);
    info!("Using config at {:?}", config_path);
    let listener = tokio::net::TcpListener::bind(bind_address).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
