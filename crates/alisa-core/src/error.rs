//! Error types for ALISA core operations.
//!
//! This module defines the error types used throughout the `alisa-core` crate.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in ALISA core operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Policy file could not be read.
    #[error("Failed to read conflict policy from {path}: {source}")]
    PolicyRead {
        /// Path to the policy file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Policy document is not valid YAML or has the wrong shape.
    #[error("Failed to parse conflict policy: {reason}")]
    PolicyParse {
        /// Reason for the parse failure.
        reason: String,
    },

    /// A rule in the policy document is malformed.
    #[error("Invalid conflict rule '{rule}': {reason}")]
    PolicyValidation {
        /// Name of the offending rule.
        rule: String,
        /// Reason the rule was rejected.
        reason: String,
    },

    /// An integrity digest could not be decoded.
    #[error("Invalid integrity digest: {reason}")]
    InvalidDigest {
        /// Reason the digest is invalid.
        reason: String,
    },
}

impl Error {
    /// Returns true if this error came from loading a conflict policy.
    #[must_use]
    pub const fn is_policy_error(&self) -> bool {
        matches!(
            self,
            Self::PolicyRead { .. } | Self::PolicyParse { .. } | Self::PolicyValidation { .. }
        )
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Self {
        Self::PolicyParse {
            reason: err.to_string(),
        }
    }
}
