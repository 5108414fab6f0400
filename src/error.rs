use std::io;

/// Custom error type for conveyor operations
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("Webhook signature missing or invalid")]
    SignatureInvalid,

    #[error("Webhook payload malformed: {0}")]
    PayloadMalformed(String),

    #[error("Unknown project: {0}")]
    UnknownProject(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Hosting service request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected response from hosting service: {status} {body}")]
    UnexpectedStatus { status: u16, body: String },

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("TOML parsing error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

/// Helper type for Results that use RelayError
pub type Result<T> = std::result::Result<T, RelayError>;
