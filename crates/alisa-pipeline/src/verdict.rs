//! Pipeline outcome types.

use alisa_audit::{AuditId, LogId, Verdict};
use alisa_core::{IntegrityDigest, StructuredEvent, Violation};
use uuid::Uuid;

/// Where the evaluated event came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionSource {
    /// The extractor returned an event with an action.
    Extractor,
    /// The textual fallback pattern matched.
    Fallback,
    /// Neither produced an action; the event is partial or empty.
    Unresolved,
}

/// The control signal returned by [`crate::AuditPipeline::process`].
///
/// This says whether processing ran to completion, not whether the line
/// was compliant. A completed run can still carry violations.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineVerdict {
    /// All stages ran.
    Completed(ProcessReport),
    /// The integrity check failed and later stages were skipped.
    Aborted(TamperReport),
}

impl PipelineVerdict {
    /// Returns true if processing ran to completion.
    #[must_use]
    pub const fn is_completed(&self) -> bool {
        matches!(self, Self::Completed(_))
    }

    /// Returns the report of a completed run.
    #[must_use]
    pub const fn report(&self) -> Option<&ProcessReport> {
        match self {
            Self::Completed(report) => Some(report),
            Self::Aborted(_) => None,
        }
    }

    /// Returns the report of an aborted run.
    #[must_use]
    pub const fn tamper(&self) -> Option<&TamperReport> {
        match self {
            Self::Completed(_) => None,
            Self::Aborted(report) => Some(report),
        }
    }
}

/// What a completed run produced.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessReport {
    /// Baseline row recorded for the line.
    pub log_id: LogId,
    /// Digest of the line.
    pub digest: IntegrityDigest,
    /// True if the line was checked against a supplied baseline.
    pub baseline_checked: bool,
    /// The event the engine evaluated.
    pub event: StructuredEvent,
    /// Where `event` came from.
    pub source: ExtractionSource,
    /// Violations raised for this line, in policy order.
    pub violations: Vec<Violation>,
    /// Findings written for this line.
    pub finding_ids: Vec<AuditId>,
    /// Evidence artifacts emitted for this line.
    pub evidence_ids: Vec<Uuid>,
}

impl ProcessReport {
    /// Returns the compliance verdict of the line.
    #[must_use]
    pub fn verdict(&self) -> Verdict {
        if self.violations.is_empty() {
            Verdict::Clear
        } else {
            Verdict::Violation
        }
    }
}

/// What an aborted run recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TamperReport {
    /// The baseline the caller supplied.
    pub expected: IntegrityDigest,
    /// The digest of the line as received.
    pub actual: IntegrityDigest,
    /// The tamper evidence artifact.
    pub evidence_id: Uuid,
}
