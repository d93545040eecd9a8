//! Error types for tinyblob

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    // === Client Errors ===
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    #[error("Key not found: {0}")]
    NotFound(String),

    // === Replica Errors ===
    #[error("Replica {endpoint} unavailable: {reason}")]
    UpstreamUnavailable { endpoint: String, reason: String },

    #[error("Replication failed after {succeeded}/{total} replicas: {cause}")]
    PartialReplicationFailure {
        succeeded: usize,
        total: usize,
        cause: Box<Error>,
    },

    #[error("No healthy replica for key: {0}")]
    Unavailable(String),

    // === Index Errors ===
    #[error("Index error: {0}")]
    Index(#[from] rocksdb::Error),

    #[error("Index corrupted: {0}")]
    IndexCorrupted(String),

    // === Volume Errors ===
    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),

    // === Config Errors ===
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // === Generic ===
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Is this a retryable error?
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::UpstreamUnavailable { .. }
                | Error::PartialReplicationFailure { .. }
                | Error::Unavailable(_)
        )
    }

    /// Convert to HTTP status code
    pub fn to_http_status(&self) -> StatusCode {
        match self {
            Error::InvalidKey(_) => StatusCode::BAD_REQUEST,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::UpstreamUnavailable { .. } | Error::PartialReplicationFailure { .. } => {
                StatusCode::BAD_GATEWAY
            }
            Error::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to hand to clients. Server faults are reduced to their
    /// category so filesystem paths and database internals stay in the logs.
    pub fn public_message(&self) -> String {
        match self {
            Error::Storage(_) => "storage error".to_string(),
            Error::Index(_) | Error::IndexCorrupted(_) => "index error".to_string(),
            Error::InvalidConfig(_) | Error::Internal(_) => "internal error".to_string(),
            _ => self.to_string(),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.to_http_status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        (status, axum::Json(json!({ "error": self.public_message() }))).into_response()
    }
}

impl From<config::ConfigError> for Error {
    fn from(e: config::ConfigError) -> Self {
        Error::InvalidConfig(e.to_string())
    }
}

impl From<bincode::Error> for Error {
    fn from(e: bincode::Error) -> Self {
        Error::IndexCorrupted(e.to_string())
    }
}
