//! Unified error type for the NDFD series pipeline.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("upstream returned {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("XML parse error: {0}")]
    Xml(String),

    #[error("missing data section in bulletin")]
    MissingData,

    #[error("document not found: {0}")]
    NotFound(String),

    #[error("cache store error: {0}")]
    Store(String),

    #[error("queue disposed")]
    QueueDisposed,

    #[error("config error: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// True for the cache-miss signal, which is control flow rather than a failure.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }
}
