//! Error types for the remote store and the local cache.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("remote store unavailable: {0}")]
    Unavailable(String),

    #[error("remote {operation} timed out after {after_ms} ms")]
    Timeout { operation: &'static str, after_ms: u64 },

    #[error("remote store rejected request with status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("could not decode remote row: {0}")]
    Decode(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
}

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("cache snapshot is not valid json: {0}")]
    Serde(#[from] serde_json::Error),
}
