//! Error type shared by the tracker

use thiserror::Error;

pub type Result<T> = std::result::Result<T, TrackerError>;

#[derive(Error, Debug)]
pub enum TrackerError {
    #[error("telemetry source unavailable: {0}")]
    SourceUnavailable(String),

    #[error("HTTP error {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error {0}")]
    Json(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    Config(String),

    /// The identity map or selection state is inconsistent. Never expected at runtime.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),
}
