//! The audit pipeline.
//!
//! One log line flows through five stages, strictly in order:
//!
//! 1. Integrity: digest the line and, when a baseline is supplied, verify it.
//!    A mismatch emits tamper evidence and stops here.
//! 2. Extraction: ask the extractor for an event, falling back to the textual
//!    pattern. Extraction never fails the pipeline.
//! 3. Evaluation: run the event through the rule engine.
//! 4. Persistence: record the line and its digest as a baseline row.
//! 5. Reporting: one finding (and artifact) per violation, or one clear finding.
//!
//! An unresolved event stays partial and never reaches engine history.
//! `unknown` appears only in the finding row for each missing field.

use std::sync::Arc;
use std::time::Duration;

use alisa_audit::{AuditFinding, AuditStore, EvidenceArtifact, EvidenceEmitter, EvidenceSink};
use alisa_core::{integrity, IntegrityDigest, SoDRuleEngine, StructuredEvent, Violation};
use alisa_extract::{parse_fallback, Extractor};
use tracing::{debug, error, info, warn};

use crate::config::ReportingConfig;
use crate::error::{PipelineError, Result};
use crate::verdict::{ExtractionSource, PipelineVerdict, ProcessReport, TamperReport};

/// Default bound on a single extraction call.
pub const DEFAULT_EXTRACTION_TIMEOUT: Duration = Duration::from_secs(30);

/// Sequences integrity verification, extraction, rule evaluation and
/// reporting for individual log lines.
///
/// The engine is shared across calls, so one pipeline should serve the
/// whole process.
#[derive(Debug, Clone)]
pub struct AuditPipeline {
    engine: Arc<SoDRuleEngine>,
    extractor: Arc<dyn Extractor>,
    store: Arc<dyn AuditStore>,
    evidence: EvidenceEmitter,
    reporting: ReportingConfig,
    extraction_timeout: Duration,
}

impl AuditPipeline {
    /// Creates a builder for configuring the pipeline.
    #[must_use]
    pub fn builder() -> AuditPipelineBuilder {
        AuditPipelineBuilder::default()
    }

    /// Returns the rule engine.
    #[must_use]
    pub fn engine(&self) -> &SoDRuleEngine {
        &self.engine
    }

    /// Returns the audit store.
    #[must_use]
    pub fn store(&self) -> &dyn AuditStore {
        self.store.as_ref()
    }

    /// Returns the reporting options.
    #[must_use]
    pub const fn reporting(&self) -> &ReportingConfig {
        &self.reporting
    }

    /// Runs `raw_log` through every stage.
    ///
    /// `expected` is the baseline digest recorded when the line was first
    /// seen. When it is supplied and does not match, the run is aborted.
    ///
    /// # Errors
    ///
    /// Returns an error if a baseline, finding or evidence artifact cannot be
    /// written. Extraction problems are recovered from and never returned.
    pub async fn process(
        &self,
        raw_log: &str,
        expected: Option<&IntegrityDigest>,
    ) -> Result<PipelineVerdict> {
        let digest = integrity::digest(raw_log);

        if let Some(expected) = expected {
            if !integrity::verify(raw_log, expected) {
                return self.abort_tampered(raw_log, *expected, digest);
            }
        }

        let (event, source) = self.resolve_event(raw_log).await;
        let violations = self.engine.analyze(&event);
        let log_id = self.store.append_log_baseline(raw_log, &digest)?;

        let mut report = ProcessReport {
            log_id,
            digest,
            baseline_checked: expected.is_some(),
            event,
            source,
            violations,
            finding_ids: Vec::new(),
            evidence_ids: Vec::new(),
        };

        if report.violations.is_empty() {
            self.report_clear(raw_log, &mut report)?;
        } else {
            self.report_violations(raw_log, &mut report)?;
        }

        info!(
            log_id = %report.log_id,
            verdict = %report.verdict(),
            findings = report.finding_ids.len(),
            "Log line processed"
        );
        Ok(PipelineVerdict::Completed(report))
    }

    fn abort_tampered(
        &self,
        raw_log: &str,
        expected: IntegrityDigest,
        actual: IntegrityDigest,
    ) -> Result<PipelineVerdict> {
        error!(
            expected = %expected,
            actual = %actual,
            "Integrity check failed, potential log tampering"
        );

        let artifact = EvidenceArtifact::tampering(&self.reporting.integrity_control, raw_log);
        self.evidence.emit(&artifact)?;

        Ok(PipelineVerdict::Aborted(TamperReport {
            expected,
            actual,
            evidence_id: artifact.id,
        }))
    }

    async fn resolve_event(&self, raw_log: &str) -> (StructuredEvent, ExtractionSource) {
        let extracted = self.extract(raw_log).await;

        if let Some(event) = extracted.as_ref().filter(|e| e.action().is_some()) {
            return (event.clone(), ExtractionSource::Extractor);
        }

        if let Some(event) = parse_fallback(raw_log) {
            debug!(actor = event.actor(), action = event.action(), "Fallback pattern matched");
            return (event, ExtractionSource::Fallback);
        }

        warn!(
            extractor = self.extractor.name(),
            "No action could be extracted, evaluating partial event"
        );
        (extracted.unwrap_or_default(), ExtractionSource::Unresolved)
    }

    async fn extract(&self, raw_log: &str) -> Option<StructuredEvent> {
        match tokio::time::timeout(self.extraction_timeout, self.extractor.extract(raw_log)).await
        {
            Ok(Ok(event)) => Some(event),
            Ok(Err(e)) => {
                warn!(
                    extractor = self.extractor.name(),
                    error = %e,
                    "Extraction failed"
                );
                None
            }
            Err(_) => {
                warn!(
                    extractor = self.extractor.name(),
                    timeout_ms = u64::try_from(self.extraction_timeout.as_millis()).unwrap_or(u64::MAX),
                    "Extraction timed out"
                );
                None
            }
        }
    }

    fn report_violations(&self, raw_log: &str, report: &mut ProcessReport) -> Result<()> {
        let actor = report.event.actor();
        let action = report.event.action();

        for violation in &report.violations {
            log_violation(violation);

            let artifact = EvidenceArtifact::violation(
                &violation.control_id,
                raw_log,
                true,
                report.event.clone(),
                &violation.message,
            );
            self.evidence.emit(&artifact)?;
            report.evidence_ids.push(artifact.id);

            let finding = AuditFinding::violation(report.log_id, actor, action, artifact);
            report.finding_ids.push(self.store.append_finding(&finding)?);
        }
        Ok(())
    }

    fn report_clear(&self, raw_log: &str, report: &mut ProcessReport) -> Result<()> {
        let control = self
            .engine
            .policy()
            .primary_control()
            .unwrap_or(self.reporting.default_control.as_str());

        let mut finding = AuditFinding::clear(
            report.log_id,
            report.event.actor(),
            report.event.action(),
            control,
        );

        if self.reporting.emit_compliant_evidence {
            let artifact = EvidenceArtifact::compliant(control, raw_log, report.event.clone());
            self.evidence.emit(&artifact)?;
            report.evidence_ids.push(artifact.id);
            finding = finding.with_evidence(artifact);
        }

        report.finding_ids.push(self.store.append_finding(&finding)?);
        Ok(())
    }
}

fn log_violation(violation: &Violation) {
    error!(
        control = %violation.control_id,
        rule = %violation.rule,
        actor = %violation.actor,
        "{}",
        violation.message
    );
}

/// Builder for configuring an [`AuditPipeline`].
#[derive(Debug)]
pub struct AuditPipelineBuilder {
    engine: Option<Arc<SoDRuleEngine>>,
    extractor: Option<Arc<dyn Extractor>>,
    store: Option<Arc<dyn AuditStore>>,
    evidence: EvidenceEmitter,
    reporting: ReportingConfig,
    extraction_timeout: Duration,
}

impl Default for AuditPipelineBuilder {
    fn default() -> Self {
        Self {
            engine: None,
            extractor: None,
            store: None,
            evidence: EvidenceEmitter::new(),
            reporting: ReportingConfig::default(),
            extraction_timeout: DEFAULT_EXTRACTION_TIMEOUT,
        }
    }
}

impl AuditPipelineBuilder {
    /// Sets the rule engine.
    #[must_use]
    pub fn with_engine(mut self, engine: Arc<SoDRuleEngine>) -> Self {
        self.engine = Some(engine);
        self
    }

    /// Sets the extractor.
    #[must_use]
    pub fn with_extractor(mut self, extractor: Arc<dyn Extractor>) -> Self {
        self.extractor = Some(extractor);
        self
    }

    /// Sets the audit store.
    #[must_use]
    pub fn with_store(mut self, store: Arc<dyn AuditStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Adds an evidence sink.
    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn EvidenceSink>) -> Self {
        self.evidence.add_sink(sink);
        self
    }

    /// Sets the reporting options.
    #[must_use]
    pub fn with_reporting(mut self, reporting: ReportingConfig) -> Self {
        self.reporting = reporting;
        self
    }

    /// Sets the bound on a single extraction call.
    #[must_use]
    pub const fn with_extraction_timeout(mut self, timeout: Duration) -> Self {
        self.extraction_timeout = timeout;
        self
    }

    /// Builds the pipeline.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine, extractor or store was not set.
    pub fn build(self) -> Result<AuditPipeline> {
        let engine = self
            .engine
            .ok_or(PipelineError::Incomplete { component: "engine" })?;
        let extractor = self
            .extractor
            .ok_or(PipelineError::Incomplete { component: "extractor" })?;
        let store = self
            .store
            .ok_or(PipelineError::Incomplete { component: "store" })?;

        if self.evidence.sink_count() == 0 {
            warn!("Pipeline has no evidence sinks, artifacts will not be kept");
        }

        Ok(AuditPipeline {
            engine,
            extractor,
            store,
            evidence: self.evidence,
            reporting: self.reporting,
            extraction_timeout: self.extraction_timeout,
        })
    }
}
