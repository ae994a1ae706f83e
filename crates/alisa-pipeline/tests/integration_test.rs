//! Integration tests for the audit pipeline.
//!
//! These tests drive whole log lines through the pipeline against in-memory
//! and SQLite stores and check the resulting audit trail and evidence.

use std::sync::Arc;
use std::time::{Duration, Instant};

use alisa_audit::{
    AuditFinding, AuditId, AuditStore, EvidenceStatus, FileEvidenceSink, InMemoryAuditStore,
    InMemoryEvidenceSink, LogBaseline, LogId, SqliteAuditStore, StoreError, StoredFinding,
    Verdict, TAMPER_REASON,
};
use alisa_core::{integrity, ConflictPolicy, IntegrityDigest, SoDRuleEngine, StructuredEvent};
use alisa_extract::{Extractor, PatternExtractor};
use alisa_pipeline::{
    AuditPipeline, ExtractionSource, PipelineError, PipelineVerdict, ProcessReport,
    ReportingConfig,
};
use alisa_test::assertions::{
    assert_clear_finding, assert_single_tamper_artifact, assert_violation_finding,
};
use alisa_test::fixtures::{self, action_line, LOGHUB_AUTH_FAILURE, LOGHUB_TAMPERED};
use alisa_test::{FailingExtractor, LogGenerator, ScriptedExtractor, SlowExtractor};
use tempfile::TempDir;

struct Harness {
    pipeline: AuditPipeline,
    store: Arc<InMemoryAuditStore>,
    sink: Arc<InMemoryEvidenceSink>,
}

fn harness_with(policy: ConflictPolicy, extractor: Arc<dyn Extractor>) -> Harness {
    harness_with_reporting(policy, extractor, ReportingConfig::default())
}

fn harness_with_reporting(
    policy: ConflictPolicy,
    extractor: Arc<dyn Extractor>,
    reporting: ReportingConfig,
) -> Harness {
    let store = Arc::new(InMemoryAuditStore::new());
    let sink = Arc::new(InMemoryEvidenceSink::new());
    let pipeline = AuditPipeline::builder()
        .with_engine(Arc::new(SoDRuleEngine::new(policy)))
        .with_extractor(extractor)
        .with_store(store.clone())
        .with_sink(sink.clone())
        .with_reporting(reporting)
        .with_extraction_timeout(Duration::from_millis(200))
        .build()
        .expect("pipeline builds");
    Harness {
        pipeline,
        store,
        sink,
    }
}

fn harness() -> Harness {
    harness_with(fixtures::invoice_policy("AC-5"), Arc::new(PatternExtractor::new()))
}

fn actor_only(actor: &str) -> StructuredEvent {
    serde_json::from_value(serde_json::json!({ "user": actor })).unwrap()
}

fn completed(verdict: PipelineVerdict) -> ProcessReport {
    match verdict {
        PipelineVerdict::Completed(report) => report,
        PipelineVerdict::Aborted(tamper) => panic!("unexpected abort: {tamper:?}"),
    }
}

#[tokio::test]
async fn test_tamper_short_circuits_every_later_stage() {
    let extractor = Arc::new(ScriptedExtractor::new());
    let h = harness_with(fixtures::invoice_policy("AC-5"), extractor.clone());
    let pair = LogGenerator::seeded(3).tampered_pair();
    let baseline = integrity::digest(&pair.original);

    let verdict = h.pipeline.process(&pair.tampered, Some(&baseline)).await.unwrap();

    assert!(!verdict.is_completed());
    let artifact = assert_single_tamper_artifact(&h.sink);
    assert_eq!(artifact.source_log.raw, pair.tampered);
    assert_eq!(artifact.control_id, "AU-9");
    assert_eq!(
        serde_json::to_value(&artifact.details).unwrap(),
        serde_json::json!({"Event": "Tampering Detected"})
    );
    assert_eq!(verdict.tamper().unwrap().evidence_id, artifact.id);

    assert_eq!(extractor.calls(), 0);
    assert_eq!(h.store.baseline_count(), 0);
    assert_eq!(h.store.finding_count(), 0);
    assert_eq!(h.pipeline.engine().actor_count(), 0);
}

#[tokio::test]
async fn test_loghub_tamper_scenario() {
    let h = harness();
    let baseline = integrity::digest(LOGHUB_AUTH_FAILURE);

    let verdict = h.pipeline.process(LOGHUB_TAMPERED, Some(&baseline)).await.unwrap();

    assert!(!verdict.is_completed());
    let tamper = verdict.tamper().unwrap();
    assert_eq!(tamper.expected, baseline);
    assert_eq!(tamper.actual, integrity::digest(LOGHUB_TAMPERED));

    let artifact = assert_single_tamper_artifact(&h.sink);
    let json = serde_json::to_value(&artifact).unwrap();
    assert_eq!(json["ViolationReason"], TAMPER_REASON);
    assert_eq!(json["Status"], "VIOLATION");
    assert_eq!(json["SourceLog"]["IntegrityVerified"], false);
}

#[tokio::test]
async fn test_untampered_line_with_baseline_completes() {
    let h = harness();
    let baseline = integrity::digest(LOGHUB_AUTH_FAILURE);

    let report = completed(
        h.pipeline
            .process(LOGHUB_AUTH_FAILURE, Some(&baseline))
            .await
            .unwrap(),
    );

    assert!(report.baseline_checked);
    assert_eq!(report.verdict(), Verdict::Clear);
    assert_eq!(h.store.baseline_count(), 1);
    assert!(h.sink.is_empty());
}

#[tokio::test]
async fn test_sod_scenario_on_sqlite() {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(SqliteAuditStore::open(dir.path().join("alisa_audit.db")).unwrap());
    let files = Arc::new(FileEvidenceSink::new(dir.path().join("artifacts")).unwrap());
    let pipeline = AuditPipeline::builder()
        .with_engine(Arc::new(SoDRuleEngine::new(fixtures::invoice_policy("AC-5"))))
        .with_extractor(Arc::new(PatternExtractor::new()))
        .with_store(store.clone())
        .with_sink(files.clone())
        .build()
        .unwrap();

    let [create, approve] = LogGenerator::seeded(1).sod_violation_sequence();
    let first = completed(pipeline.process(&create, None).await.unwrap());
    let second = completed(pipeline.process(&approve, None).await.unwrap());

    assert_eq!(first.verdict(), Verdict::Clear);
    assert_eq!(second.verdict(), Verdict::Violation);
    assert_eq!(second.violations[0].action_a, "Create_Invoice");
    assert_eq!(second.violations[0].action_b, "Approve_Payment");

    let findings = store.findings().unwrap();
    assert_eq!(findings.len(), 2);
    assert_clear_finding(&findings[0], "u_finance_01", "Create_Invoice");
    assert_violation_finding(&findings[1], "AC-5");
    assert_eq!(findings[1].finding.log_id, second.log_id);
    assert_eq!(findings[1].finding.user_id, "u_finance_01");
    assert_eq!(findings[1].finding.action, "Approve_Payment");

    let evidence_path = files.path_for(second.evidence_ids[0]);
    assert!(evidence_path.exists());
    let written: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(evidence_path).unwrap()).unwrap();
    assert_eq!(written["NIST_Control"], "AC-5");
    assert_eq!(written["SourceLog"]["IntegrityVerified"], true);
    assert_eq!(written["Details"]["user"], "u_finance_01");
    assert_eq!(
        written["ViolationReason"],
        "SoD VIOLATION DETECTED (AC-5): User 'u_finance_01' performed conflicting actions: Create_Invoice + Approve_Payment"
    );

    for baseline in store.baselines().unwrap() {
        assert!(baseline.verify());
    }
}

#[tokio::test]
async fn test_violation_retriggers_on_later_events() {
    let h = harness();

    h.pipeline
        .process(&action_line("bob", "Create_Invoice"), None)
        .await
        .unwrap();
    h.pipeline
        .process(&action_line("bob", "Approve_Payment"), None)
        .await
        .unwrap();
    let third = completed(
        h.pipeline
            .process(&action_line("bob", "View_Report"), None)
            .await
            .unwrap(),
    );

    assert_eq!(third.verdict(), Verdict::Violation);
    assert_eq!(h.sink.len(), 2);
    assert_eq!(h.store.finding_count(), 3);
}

#[tokio::test]
async fn test_one_finding_per_violation_in_policy_order() {
    let h = harness_with(fixtures::sample_policy(), Arc::new(PatternExtractor::new()));

    for action in ["Create_Vendor", "Create_Invoice"] {
        h.pipeline
            .process(&action_line("carol", action), None)
            .await
            .unwrap();
    }
    let report = completed(
        h.pipeline
            .process(&action_line("carol", "Approve_Payment"), None)
            .await
            .unwrap(),
    );

    let pairs: Vec<_> = report
        .violations
        .iter()
        .map(|v| (v.action_a.as_str(), v.action_b.as_str()))
        .collect();
    assert_eq!(
        pairs,
        vec![
            ("Create_Invoice", "Approve_Payment"),
            ("Create_Vendor", "Approve_Payment"),
        ]
    );
    assert_eq!(report.finding_ids.len(), 2);
    assert_eq!(report.evidence_ids.len(), 2);

    let findings = h.store.findings().unwrap();
    assert!(findings[2..]
        .iter()
        .all(|f| f.finding.log_id == report.log_id && f.finding.verdict == Verdict::Violation));
}

#[tokio::test]
async fn test_extractor_result_is_preferred() {
    let line = "Jun 15 10:00:00 erp audit[7]: invoice INV-9 created by dave";
    let extractor = Arc::new(
        ScriptedExtractor::new().with_response(
            line,
            StructuredEvent::new("dave", "Create_Invoice").with_field("Component", "erp"),
        ),
    );
    let h = harness_with(fixtures::invoice_policy("AC-5"), extractor.clone());

    let report = completed(h.pipeline.process(line, None).await.unwrap());

    assert_eq!(report.source, ExtractionSource::Extractor);
    assert_eq!(report.event.extra["Component"], "erp");
    assert_eq!(extractor.calls(), 1);
    assert_eq!(
        h.pipeline.engine().actions_for("dave").unwrap().into_iter().collect::<Vec<_>>(),
        vec!["Create_Invoice".to_string()]
    );
}

#[tokio::test]
async fn test_fallback_when_extractor_misses_action() {
    let line = action_line("erin", "Create_Invoice");
    let extractor = Arc::new(
        ScriptedExtractor::new()
            .with_response(line.clone(), actor_only("erin")),
    );
    let h = harness_with(fixtures::invoice_policy("AC-5"), extractor);

    let report = completed(h.pipeline.process(&line, None).await.unwrap());

    assert_eq!(report.source, ExtractionSource::Fallback);
    assert_eq!(report.event.action(), Some("Create_Invoice"));
}

#[tokio::test]
async fn test_fallback_when_extractor_fails() {
    let h = harness_with(fixtures::invoice_policy("AC-5"), Arc::new(FailingExtractor));

    h.pipeline
        .process(&action_line("frank", "Create_Invoice"), None)
        .await
        .unwrap();
    let report = completed(
        h.pipeline
            .process(&action_line("frank", "Approve_Payment"), None)
            .await
            .unwrap(),
    );

    assert_eq!(report.source, ExtractionSource::Fallback);
    assert_eq!(report.verdict(), Verdict::Violation);
}

#[tokio::test]
async fn test_slow_extractor_times_out_and_falls_back() {
    let slow = SlowExtractor::new(
        Duration::from_secs(10),
        StructuredEvent::new("ignored", "Ignored"),
    );
    let h = harness_with(fixtures::invoice_policy("AC-5"), Arc::new(slow));
    let started = Instant::now();

    let report = completed(
        h.pipeline
            .process(&action_line("grace", "Create_Invoice"), None)
            .await
            .unwrap(),
    );

    assert!(started.elapsed() < Duration::from_secs(5));
    assert_eq!(report.source, ExtractionSource::Fallback);
    assert_eq!(report.event.actor(), Some("grace"));
}

#[tokio::test]
async fn test_unresolved_line_is_still_recorded() {
    let h = harness_with(fixtures::invoice_policy("AC-5"), Arc::new(FailingExtractor));

    let report = completed(h.pipeline.process(LOGHUB_AUTH_FAILURE, None).await.unwrap());

    assert_eq!(report.source, ExtractionSource::Unresolved);
    assert!(report.event.is_empty());
    assert_eq!(h.pipeline.engine().actor_count(), 0);

    let findings = h.store.findings().unwrap();
    assert_eq!(findings.len(), 1);
    assert_clear_finding(&findings[0], "unknown", "unknown");
    assert_eq!(findings[0].finding.control_id, "AC-5");
    assert!(findings[0].finding.evidence.is_empty());
}

#[tokio::test]
async fn test_partial_event_keeps_known_fields() {
    let extractor = Arc::new(ScriptedExtractor::new().with_response(
        LOGHUB_AUTH_FAILURE,
        actor_only("root"),
    ));
    let h = harness_with(fixtures::invoice_policy("AC-5"), extractor);

    let report = completed(h.pipeline.process(LOGHUB_AUTH_FAILURE, None).await.unwrap());

    assert_eq!(report.source, ExtractionSource::Unresolved);
    assert_eq!(h.pipeline.engine().actor_count(), 0);
    assert_clear_finding(&h.store.findings().unwrap()[0], "root", "unknown");
}

#[tokio::test]
async fn test_clear_control_defaults_when_policy_is_empty() {
    let reporting = ReportingConfig::default().with_default_control("AC-2");
    let h = harness_with_reporting(
        ConflictPolicy::empty(),
        Arc::new(PatternExtractor::new()),
        reporting,
    );

    h.pipeline
        .process(&action_line("heidi", "Create_Invoice"), None)
        .await
        .unwrap();

    assert_eq!(h.store.findings().unwrap()[0].finding.control_id, "AC-2");
}

#[tokio::test]
async fn test_compliant_evidence_is_attached_when_enabled() {
    let reporting = ReportingConfig::default().with_compliant_evidence(true);
    let h = harness_with_reporting(
        fixtures::invoice_policy("AC-5"),
        Arc::new(PatternExtractor::new()),
        reporting,
    );

    let report = completed(
        h.pipeline
            .process(&action_line("ivan", "Create_Invoice"), None)
            .await
            .unwrap(),
    );

    assert_eq!(report.evidence_ids.len(), 1);
    let artifact = h.sink.get(report.evidence_ids[0]).unwrap();
    assert_eq!(artifact.status, EvidenceStatus::Compliant);
    assert!(artifact.violation_reason.is_none());

    let finding = &h.store.findings().unwrap()[0];
    assert_eq!(finding.finding.verdict, Verdict::Clear);
    assert_eq!(finding.finding.evidence.artifact(), Some(&artifact));
}

#[derive(Debug)]
struct BrokenStore;

impl AuditStore for BrokenStore {
    fn append_log_baseline(&self, _raw: &str, _digest: &IntegrityDigest) -> Result<LogId, StoreError> {
        Err(StoreError::Backend("disk full".to_string()))
    }

    fn append_finding(&self, _finding: &AuditFinding) -> Result<AuditId, StoreError> {
        Err(StoreError::Backend("disk full".to_string()))
    }

    fn baseline(&self, _log_id: LogId) -> Result<Option<LogBaseline>, StoreError> {
        Ok(None)
    }

    fn baselines(&self) -> Result<Vec<LogBaseline>, StoreError> {
        Ok(Vec::new())
    }

    fn findings(&self) -> Result<Vec<StoredFinding>, StoreError> {
        Ok(Vec::new())
    }

    fn name(&self) -> &'static str {
        "broken"
    }
}

#[tokio::test]
async fn test_persistence_failure_is_surfaced() {
    let pipeline = AuditPipeline::builder()
        .with_engine(Arc::new(SoDRuleEngine::new(fixtures::invoice_policy("AC-5"))))
        .with_extractor(Arc::new(PatternExtractor::new()))
        .with_store(Arc::new(BrokenStore))
        .build()
        .unwrap();

    let err = pipeline
        .process(&action_line("judy", "Create_Invoice"), None)
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::Persistence(_)));
    assert!(err.to_string().contains("disk full"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_lines_share_one_engine() {
    let h = harness();
    let pipeline = Arc::new(h.pipeline);

    let mut handles = Vec::new();
    for i in 0..8 {
        let pipeline = Arc::clone(&pipeline);
        handles.push(tokio::spawn(async move {
            let actor = format!("clerk_{i}");
            for action in ["Create_Invoice", "Approve_Payment"] {
                pipeline
                    .process(&action_line(&actor, action), None)
                    .await
                    .unwrap();
            }
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(pipeline.engine().actor_count(), 8);
    assert_eq!(h.store.baseline_count(), 16);
    assert_eq!(h.sink.len(), 8);

    let violations = h
        .store
        .findings()
        .unwrap()
        .into_iter()
        .filter(|f| f.finding.verdict == Verdict::Violation)
        .count();
    assert_eq!(violations, 8);
}
