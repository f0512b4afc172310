//! Error types for lang_price_sync

use std::path::PathBuf;
use thiserror::Error;

/// Unified error type for sync operations
#[derive(Debug, Error)]
pub enum SyncError {
    /// HTTP request failed (network error, timeout, etc.)
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Remote endpoint answered with a non-2xx status
    #[error("HTTP error {status} from {url}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
    },

    /// Response body was not the expected JSON
    #[error("Parse error in {context}: {source}")]
    Parse {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// Eligible item document lacks a field the pipeline needs
    #[error("Document {document} has no `{field}` field")]
    MissingField {
        document: String,
        field: &'static str,
    },

    /// Target file could not be opened, read or written
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    /// The caller abandoned the run
    #[error("Sync cancelled")]
    Cancelled,

    /// A per-item worker task panicked or was aborted
    #[error("Worker task failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

impl SyncError {
    /// Network failures and non-2xx responses, the only errors worth retrying
    pub fn is_transport(&self) -> bool {
        matches!(self, SyncError::Network(_) | SyncError::HttpStatus { .. })
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SyncError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn parse(context: impl Into<String>, source: serde_json::Error) -> Self {
        SyncError::Parse {
            context: context.into(),
            source,
        }
    }
}

/// Result alias for sync operations
pub type Result<T> = std::result::Result<T, SyncError>;
