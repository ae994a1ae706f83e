//! Assertion helpers for audit trail and evidence checks.

use alisa_audit::{
    EvidenceArtifact, EvidenceStatus, InMemoryEvidenceSink, StoredFinding, Verdict, TAMPER_REASON,
};

/// Asserts `sink` holds exactly one artifact and that it records tampering.
///
/// # Panics
///
/// Panics if the assertion fails.
pub fn assert_single_tamper_artifact(sink: &InMemoryEvidenceSink) -> EvidenceArtifact {
    let artifacts = sink.artifacts();
    assert_eq!(artifacts.len(), 1, "expected exactly one artifact, got {artifacts:?}");

    let artifact = artifacts[0].clone();
    assert_eq!(artifact.status, EvidenceStatus::Violation);
    assert!(!artifact.source_log.integrity_verified);
    assert_eq!(artifact.violation_reason.as_deref(), Some(TAMPER_REASON));
    artifact
}

/// Asserts `finding` is a violation under `control_id`.
///
/// # Panics
///
/// Panics if the assertion fails.
pub fn assert_violation_finding(finding: &StoredFinding, control_id: &str) {
    assert_eq!(finding.finding.verdict, Verdict::Violation, "finding: {finding:?}");
    assert_eq!(finding.finding.control_id, control_id);

    let artifact = finding
        .finding
        .evidence
        .artifact()
        .unwrap_or_else(|| panic!("violation finding without artifact: {finding:?}"));
    assert_eq!(artifact.control_id, control_id);
    assert!(artifact.is_violation());
}

/// Asserts `finding` is clear with the given actor and action columns.
///
/// # Panics
///
/// Panics if the assertion fails.
pub fn assert_clear_finding(finding: &StoredFinding, user_id: &str, action: &str) {
    assert_eq!(finding.finding.verdict, Verdict::Clear, "finding: {finding:?}");
    assert_eq!(finding.finding.user_id, user_id);
    assert_eq!(finding.finding.action, action);
}
