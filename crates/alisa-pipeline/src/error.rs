//! Error types for the audit pipeline.

use std::path::PathBuf;

use alisa_audit::{SinkError, StoreError};
use alisa_extract::ExtractionError;
use thiserror::Error;

/// Result type alias using [`PipelineError`].
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Errors that can occur while building or running the pipeline.
///
/// Extraction failures are not listed here: the pipeline recovers from them.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A baseline or finding could not be persisted.
    #[error("Audit trail write failed: {0}")]
    Persistence(#[from] StoreError),

    /// An evidence artifact could not be stored.
    #[error("Evidence emission failed: {0}")]
    Evidence(#[from] SinkError),

    /// The conflict policy could not be loaded and the pipeline fails closed.
    #[error("Policy load failed: {0}")]
    Policy(#[source] alisa_core::Error),

    /// The extractor could not be constructed.
    #[error("Extractor setup failed: {0}")]
    Extractor(#[from] ExtractionError),

    /// The configuration file could not be read.
    #[error("Failed to read config {path}: {source}")]
    ConfigRead {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is malformed.
    #[error("Invalid config: {reason}")]
    Config {
        /// What is wrong with the configuration.
        reason: String,
    },

    /// The builder is missing a required component.
    #[error("Pipeline is missing its {component}")]
    Incomplete {
        /// The missing component.
        component: &'static str,
    },
}

impl From<serde_yaml::Error> for PipelineError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Config {
            reason: err.to_string(),
        }
    }
}
