//! Audit trail rows: log baselines and audit findings.

use std::fmt;
use std::str::FromStr;

use alisa_core::{integrity, IntegrityDigest};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::artifact::EvidenceArtifact;
use crate::error::StoreError;

/// Identifier of a persisted log baseline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LogId(pub i64);

/// Identifier of a persisted audit finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuditId(pub i64);

impl fmt::Display for LogId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for AuditId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Compliance verdict of a finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    /// No control was violated
    Clear,
    /// A control was violated
    Violation,
}

impl Verdict {
    /// Returns the stored text form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Clear => "Clear",
            Self::Violation => "Violation",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Verdict {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Clear" => Ok(Self::Clear),
            "Violation" => Ok(Self::Violation),
            other => Err(StoreError::Corrupt {
                reason: format!("unknown verdict '{other}'"),
            }),
        }
    }
}

/// Evidence attached to a finding.
///
/// Usually an [`EvidenceArtifact`]; clear findings carry an empty object and
/// historical records may carry free-form notes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EvidencePayload {
    /// A full evidence artifact
    Artifact(Box<EvidenceArtifact>),
    /// Any other JSON object, including the empty object
    Other(Map<String, Value>),
}

impl Default for EvidencePayload {
    fn default() -> Self {
        Self::Other(Map::new())
    }
}

impl EvidencePayload {
    /// Creates a free-form note payload.
    #[must_use]
    pub fn note(text: &str) -> Self {
        let mut map = Map::new();
        map.insert("note".to_string(), Value::String(text.to_string()));
        Self::Other(map)
    }

    /// Returns the artifact, if this payload is one.
    #[must_use]
    pub fn artifact(&self) -> Option<&EvidenceArtifact> {
        match self {
            Self::Artifact(artifact) => Some(artifact),
            Self::Other(_) => None,
        }
    }

    /// Returns true for the empty object.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Other(map) if map.is_empty())
    }
}

impl From<EvidenceArtifact> for EvidencePayload {
    fn from(artifact: EvidenceArtifact) -> Self {
        Self::Artifact(Box::new(artifact))
    }
}

/// One audit decision about one log line, before it has an `AuditID`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditFinding {
    /// Baseline row this finding refers to
    #[serde(rename = "LogID")]
    pub log_id: LogId,

    /// When the finding was made
    #[serde(rename = "Timestamp")]
    pub timestamp: DateTime<Utc>,

    /// Actor, or "unknown"
    #[serde(rename = "UserID")]
    pub user_id: String,

    /// Action, or "unknown"
    #[serde(rename = "Action")]
    pub action: String,

    /// Compliance verdict
    #[serde(rename = "Verdict")]
    pub verdict: Verdict,

    /// Control the verdict relates to
    #[serde(rename = "NIST_Control")]
    pub control_id: String,

    /// Evidence for the verdict
    #[serde(rename = "EvidenceArtifact", default)]
    pub evidence: EvidencePayload,
}

/// Placeholder recorded for a missing actor or action.
pub const UNKNOWN: &str = "unknown";

impl AuditFinding {
    /// Creates a clear finding with an empty evidence payload.
    #[must_use]
    pub fn clear(log_id: LogId, actor: Option<&str>, action: Option<&str>, control_id: &str) -> Self {
        Self {
            log_id,
            timestamp: Utc::now(),
            user_id: actor.unwrap_or(UNKNOWN).to_string(),
            action: action.unwrap_or(UNKNOWN).to_string(),
            verdict: Verdict::Clear,
            control_id: control_id.to_string(),
            evidence: EvidencePayload::default(),
        }
    }

    /// Creates a violation finding backed by `artifact`.
    ///
    /// The finding's control is the artifact's control.
    #[must_use]
    pub fn violation(
        log_id: LogId,
        actor: Option<&str>,
        action: Option<&str>,
        artifact: EvidenceArtifact,
    ) -> Self {
        Self {
            log_id,
            timestamp: Utc::now(),
            user_id: actor.unwrap_or(UNKNOWN).to_string(),
            action: action.unwrap_or(UNKNOWN).to_string(),
            verdict: Verdict::Violation,
            control_id: artifact.control_id.clone(),
            evidence: artifact.into(),
        }
    }

    /// Replaces the evidence payload.
    #[must_use]
    pub fn with_evidence(mut self, evidence: impl Into<EvidencePayload>) -> Self {
        self.evidence = evidence.into();
        self
    }
}

/// A finding as read back from the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredFinding {
    /// Store-assigned identifier
    #[serde(rename = "AuditID")]
    pub audit_id: AuditId,

    /// The finding itself
    #[serde(flatten)]
    pub finding: AuditFinding,
}

/// A raw log line and the digest recorded for it when it was first seen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogBaseline {
    /// Store-assigned identifier
    #[serde(rename = "LogID")]
    pub log_id: LogId,

    /// Raw log text
    #[serde(rename = "LogLine")]
    pub log_line: String,

    /// Digest of the raw text at ingestion
    #[serde(rename = "HashSHA256")]
    pub digest: IntegrityDigest,

    /// When the baseline was recorded
    #[serde(rename = "Timestamp")]
    pub timestamp: DateTime<Utc>,
}

impl LogBaseline {
    /// Returns true if the stored text still matches the stored digest.
    #[must_use]
    pub fn verify(&self) -> bool {
        integrity::verify(&self.log_line, &self.digest)
    }
}
