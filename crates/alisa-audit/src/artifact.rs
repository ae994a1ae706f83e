//! Evidence artifact definitions.

use alisa_core::StructuredEvent;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::{Timestamp, Uuid};

/// Violation reason recorded when a log line no longer matches its baseline.
pub const TAMPER_REASON: &str = "Hash Mismatch - Potential Log Tampering";

/// Generates a new v7 UUID for evidence artifacts.
fn new_evidence_id() -> Uuid {
    let ts = Timestamp::now(uuid::NoContext);
    Uuid::new_v7(ts)
}

/// Outcome recorded in an evidence artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EvidenceStatus {
    /// The record satisfied every control
    Compliant,
    /// The record violated a control or failed its integrity check
    Violation,
}

/// The raw log line an artifact is about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLog {
    /// Raw log text
    #[serde(rename = "Raw")]
    pub raw: String,

    /// Whether the text matched its integrity baseline
    #[serde(rename = "IntegrityVerified")]
    pub integrity_verified: bool,
}

/// Self-contained, immutable record of one audit decision.
///
/// Serializes to
/// `{EvidenceID, Timestamp, NIST_Control, Status, SourceLog: {Raw, IntegrityVerified}, Details, ViolationReason?}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceArtifact {
    /// Unique artifact ID
    #[serde(rename = "EvidenceID")]
    pub id: Uuid,

    /// Creation timestamp
    #[serde(rename = "Timestamp")]
    pub timestamp: DateTime<Utc>,

    /// Control the decision relates to
    #[serde(rename = "NIST_Control")]
    pub control_id: String,

    /// Decision outcome
    #[serde(rename = "Status")]
    pub status: EvidenceStatus,

    /// The log line the decision is about
    #[serde(rename = "SourceLog")]
    pub source_log: SourceLog,

    /// Structured event extracted from the log line
    #[serde(rename = "Details")]
    pub details: StructuredEvent,

    /// Why the record is a violation
    #[serde(
        rename = "ViolationReason",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub violation_reason: Option<String>,
}

impl EvidenceArtifact {
    /// Creates a violation artifact.
    #[must_use]
    pub fn violation(
        control_id: &str,
        raw: &str,
        integrity_verified: bool,
        details: StructuredEvent,
        reason: &str,
    ) -> Self {
        Self {
            id: new_evidence_id(),
            timestamp: Utc::now(),
            control_id: control_id.to_string(),
            status: EvidenceStatus::Violation,
            source_log: SourceLog {
                raw: raw.to_string(),
                integrity_verified,
            },
            details,
            violation_reason: Some(reason.to_string()),
        }
    }

    /// Creates a compliant artifact for a verified log line.
    #[must_use]
    pub fn compliant(control_id: &str, raw: &str, details: StructuredEvent) -> Self {
        Self {
            id: new_evidence_id(),
            timestamp: Utc::now(),
            control_id: control_id.to_string(),
            status: EvidenceStatus::Compliant,
            source_log: SourceLog {
                raw: raw.to_string(),
                integrity_verified: true,
            },
            details,
            violation_reason: None,
        }
    }

    /// Creates the artifact for a log line that failed its integrity check.
    #[must_use]
    pub fn tampering(control_id: &str, raw: &str) -> Self {
        let details = StructuredEvent::empty().with_field("Event", "Tampering Detected");
        Self::violation(control_id, raw, false, details, TAMPER_REASON)
    }

    /// Returns true if this artifact records a violation.
    #[must_use]
    pub fn is_violation(&self) -> bool {
        self.status == EvidenceStatus::Violation
    }

    /// Serializes the artifact to indented JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
