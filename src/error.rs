// ABOUTME: Error types with structured exit codes for CLI
// ABOUTME: Separates fatal, transient, and per-item failure kinds

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("API error {status} on {endpoint}: {message}")]
    Api {
        endpoint: String,
        status: u16,
        message: String,
    },

    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Checkpoint write failed: {0}")]
    Persistence(#[source] std::io::Error),

    #[error("Relay error: {0}")]
    Relay(String),

    #[error("Media download failed for {url}: {reason}")]
    MediaResolution { url: String, reason: String },

    #[error("Publish failed: {0}")]
    Publish(String),

    #[error("Filesystem error: {0}")]
    Filesystem(#[from] std::io::Error),
}

impl Error {
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Config(_) => 2,
            Error::Network(_) => 3,
            Error::Api { .. } => 4,
            Error::Parse(_) => 5,
            Error::Persistence(_) => 6,
            Error::Relay(_) => 7,
            Error::MediaResolution { .. } => 8,
            Error::Publish(_) => 9,
            Error::Filesystem(_) => 10,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
