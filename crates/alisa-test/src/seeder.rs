//! Bulk seeding of an audit trail with synthetic history.

use alisa_audit::{AuditFinding, AuditStore, EvidencePayload, StoreError, Verdict};
use alisa_core::integrity;
use alisa_extract::parse_fallback;
use tracing::info;

use crate::generator::LogGenerator;

/// Control recorded on seeded normal activity.
pub const SEED_NORMAL_CONTROL: &str = "AC-6 (Least Privilege)";

/// Control recorded on seeded SoD history.
pub const SEED_SOD_CONTROL: &str = "AC-5 (Separation of Duties)";

/// Number of historical SoD sequences written by [`seed_audit_trail`].
pub const SEED_SOD_SEQUENCES: usize = 3;

/// Rows written by a seeding run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedSummary {
    /// Baseline rows written.
    pub baselines: usize,
    /// Clear findings written.
    pub clear: usize,
    /// Violation findings written.
    pub violations: usize,
}

/// Writes `count` normal lines and three historical SoD sequences.
///
/// Normal lines get clear findings for a random `user_NNN` with action
/// `SYSTEM_INFO` on every fifth row and `LOGIN_SUCCESS` otherwise. In the
/// SoD sequences the approval row is a violation carrying a note.
///
/// # Errors
///
/// Returns an error if any row cannot be written.
pub fn seed_audit_trail(
    store: &dyn AuditStore,
    generator: &mut LogGenerator,
    count: usize,
) -> Result<SeedSummary, StoreError> {
    let mut summary = SeedSummary::default();

    info!(count, "Seeding normal logs");
    for i in 0..count {
        let line = generator.normal_log();
        let log_id = store.append_log_baseline(&line, &integrity::digest(&line))?;
        let user = format!("user_{}", generator.number(100, 999));
        let action = if i % 5 == 0 { "SYSTEM_INFO" } else { "LOGIN_SUCCESS" };

        store.append_finding(&AuditFinding::clear(
            log_id,
            Some(&user),
            Some(action),
            SEED_NORMAL_CONTROL,
        ))?;
        summary.baselines += 1;
        summary.clear += 1;
    }

    info!(sequences = SEED_SOD_SEQUENCES, "Seeding historical SoD violations");
    for _ in 0..SEED_SOD_SEQUENCES {
        for line in generator.sod_violation_sequence() {
            let log_id = store.append_log_baseline(&line, &integrity::digest(&line))?;
            let event = parse_fallback(&line).unwrap_or_default();
            let action = event.action().unwrap_or_default();

            let mut finding =
                AuditFinding::clear(log_id, event.actor(), event.action(), SEED_SOD_CONTROL);
            if action.contains("Approve") {
                finding.verdict = Verdict::Violation;
                finding = finding.with_evidence(EvidencePayload::note("Historical SoD record"));
                summary.violations += 1;
            } else {
                summary.clear += 1;
            }

            store.append_finding(&finding)?;
            summary.baselines += 1;
        }
    }

    info!(
        baselines = summary.baselines,
        violations = summary.violations,
        "Seeding completed"
    );
    Ok(summary)
}
