//! Composition root: wires the pipeline's collaborators from configuration.

use std::sync::Arc;

use alisa_audit::{FileEvidenceSink, SqliteAuditStore, TracingEvidenceSink};
use alisa_core::{ConflictPolicy, SoDRuleEngine};
use alisa_extract::{Extractor, ExtractorConfig, ExtractorKind, OllamaExtractor, PatternExtractor};
use tracing::info;

use crate::config::{PipelineConfig, PolicyConfig, StorageConfig};
use crate::error::{PipelineError, Result};
use crate::pipeline::AuditPipeline;

/// Builds a pipeline from `config`.
///
/// Loads the policy with the configured failure mode, opens the SQLite
/// audit trail, and attaches file and tracing evidence sinks.
///
/// # Errors
///
/// Returns an error if the policy fails to load in closed mode, or if the
/// store, artifact directory or extractor cannot be set up.
pub fn build_pipeline(config: &PipelineConfig) -> Result<AuditPipeline> {
    let policy = load_policy(&config.policy)?;
    let engine = SoDRuleEngine::with_config(policy, config.engine);
    let store = open_store(&config.storage)?;
    let file_sink = FileEvidenceSink::new(&config.storage.artifacts_dir)?;
    let extractor = build_extractor(&config.extractor)?;

    info!(
        extractor = extractor.name(),
        database = %config.storage.database.display(),
        artifacts = %config.storage.artifacts_dir.display(),
        rules = engine.policy().rules().len(),
        "Pipeline ready"
    );

    AuditPipeline::builder()
        .with_engine(Arc::new(engine))
        .with_extractor(extractor)
        .with_store(store)
        .with_sink(Arc::new(file_sink))
        .with_sink(Arc::new(TracingEvidenceSink::new()))
        .with_reporting(config.reporting.clone())
        .with_extraction_timeout(config.extractor.timeout())
        .build()
}

/// Loads the conflict policy, honouring the configured failure mode.
///
/// # Errors
///
/// Returns an error if loading fails and the mode is closed.
pub fn load_policy(config: &PolicyConfig) -> Result<ConflictPolicy> {
    ConflictPolicy::load_with_mode(&config.path, config.on_error).map_err(PipelineError::Policy)
}

/// Opens the SQLite audit trail.
///
/// # Errors
///
/// Returns an error if the database cannot be opened or initialised.
pub fn open_store(config: &StorageConfig) -> Result<Arc<SqliteAuditStore>> {
    Ok(Arc::new(SqliteAuditStore::open(&config.database)?))
}

/// Creates the configured extractor.
///
/// # Errors
///
/// Returns an error if the Ollama extractor cannot be created.
pub fn build_extractor(config: &ExtractorConfig) -> Result<Arc<dyn Extractor>> {
    Ok(match config.kind {
        ExtractorKind::Ollama => Arc::new(OllamaExtractor::new(config.clone())?),
        ExtractorKind::Pattern => Arc::new(PatternExtractor::new()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use alisa_core::PolicyFailureMode;

    #[test]
    fn test_build_pipeline_from_config() {
        let dir = tempfile::tempdir().unwrap();
        let policy_path = dir.path().join("policy.yaml");
        std::fs::write(&policy_path, alisa_test::fixtures::SAMPLE_POLICY).unwrap();

        let config = PipelineConfig::default()
            .with_policy(PolicyConfig::default().with_path(&policy_path))
            .with_storage(
                StorageConfig::default()
                    .with_database(dir.path().join("audit.db"))
                    .with_artifacts_dir(dir.path().join("artifacts")),
            )
            .with_extractor(ExtractorConfig::new().with_kind(ExtractorKind::Pattern));

        let pipeline = build_pipeline(&config).unwrap();
        assert_eq!(pipeline.engine().policy().primary_control(), Some("AC-5"));
        assert!(dir.path().join("artifacts").is_dir());
        assert!(dir.path().join("audit.db").exists());
    }

    #[test]
    fn test_missing_policy_fails_closed() {
        let dir = tempfile::tempdir().unwrap();
        let config = PolicyConfig::default().with_path(dir.path().join("missing.yaml"));

        let result = load_policy(&config);
        assert!(matches!(result, Err(PipelineError::Policy(_))));
    }

    #[test]
    fn test_missing_policy_fails_open() {
        let dir = tempfile::tempdir().unwrap();
        let config = PolicyConfig::default()
            .with_path(dir.path().join("missing.yaml"))
            .with_on_error(PolicyFailureMode::Open);

        let policy = load_policy(&config).unwrap();
        assert!(policy.is_empty());
    }

    #[test]
    fn test_build_extractor_kinds() {
        let ollama = build_extractor(&ExtractorConfig::default()).unwrap();
        assert_eq!(ollama.name(), "ollama");

        let pattern =
            build_extractor(&ExtractorConfig::new().with_kind(ExtractorKind::Pattern)).unwrap();
        assert_eq!(pattern.name(), "pattern");
    }
}
