//! Error types for evidence sinks and audit stores.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while storing an evidence artifact.
#[derive(Debug, Error)]
pub enum SinkError {
    /// Serialization error
    #[error("Failed to serialize evidence artifact: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error with path context
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path involved in the operation.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Backend-specific error
    #[error("Evidence sink {sink} failed: {message}")]
    Backend {
        /// Name of the failing sink.
        sink: &'static str,
        /// Error message.
        message: String,
    },
}

/// Errors that can occur while reading or writing the audit trail.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error with path context
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path involved in the operation.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A stored row could not be decoded.
    #[error("Corrupt audit record: {reason}")]
    Corrupt {
        /// What was wrong with the row.
        reason: String,
    },

    /// Backend-specific error
    #[error("Audit store error: {0}")]
    Backend(String),
}
