//! Error types for extraction.

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur while extracting a structured event.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// The extraction service could not be reached.
    #[error("Failed to reach extraction service at {url}: {source}")]
    Request {
        /// Endpoint URL.
        url: String,
        /// Underlying error.
        #[source]
        source: reqwest::Error,
    },

    /// The extraction service answered with an error status.
    #[error("Extraction service returned HTTP {status}: {message}")]
    HttpStatus {
        /// HTTP status code.
        status: u16,
        /// Response body.
        message: String,
    },

    /// The service answered but the payload was not a JSON object.
    #[error("Failed to decode extraction result: {reason}")]
    Decode {
        /// What was wrong with the payload.
        reason: String,
    },

    /// The extraction did not finish in time.
    #[error("Extraction timed out after {after:?}")]
    Timeout {
        /// Configured timeout.
        after: Duration,
    },

    /// The extractor configuration is invalid.
    #[error("Invalid extractor configuration: {reason}")]
    InvalidConfig {
        /// Reason the configuration is invalid.
        reason: String,
    },
}

impl From<url::ParseError> for ExtractionError {
    fn from(err: url::ParseError) -> Self {
        Self::InvalidConfig {
            reason: format!("invalid URL: {err}"),
        }
    }
}
