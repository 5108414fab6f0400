//! API module for all HTTP handlers

pub mod status;
pub mod stream;
pub mod webhook;

// Re-export handlers
pub use status::{root, status};
pub use stream::stream_jobs;
pub use webhook::handle_webhook;
