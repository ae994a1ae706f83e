//! Evidence sinks.
//!
//! An [`EvidenceSink`] durably keeps evidence artifacts keyed by their id.
//! Storing the same artifact twice is allowed and leaves one copy.
//! [`EvidenceEmitter`] fans one artifact out to several sinks.

use std::fmt::Debug;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::artifact::EvidenceArtifact;
use crate::error::SinkError;

/// Backend trait for evidence artifact storage.
pub trait EvidenceSink: Send + Sync + Debug {
    /// Stores an artifact.
    ///
    /// # Errors
    ///
    /// Returns an error if the artifact cannot be stored.
    fn store(&self, artifact: &EvidenceArtifact) -> Result<(), SinkError>;

    /// Returns the sink name for identification.
    fn name(&self) -> &'static str;
}

/// Sends each artifact to every configured sink.
#[derive(Debug, Default, Clone)]
pub struct EvidenceEmitter {
    sinks: Vec<Arc<dyn EvidenceSink>>,
}

impl EvidenceEmitter {
    /// Creates an emitter with no sinks.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a builder for configuring the emitter.
    #[must_use]
    pub fn builder() -> EvidenceEmitterBuilder {
        EvidenceEmitterBuilder::default()
    }

    /// Adds a sink.
    pub fn add_sink(&mut self, sink: Arc<dyn EvidenceSink>) {
        self.sinks.push(sink);
    }

    /// Stores `artifact` in every sink.
    ///
    /// Every sink is attempted even if an earlier one fails.
    ///
    /// # Errors
    ///
    /// Returns the first sink error encountered.
    pub fn emit(&self, artifact: &EvidenceArtifact) -> Result<(), SinkError> {
        let mut first_error = None;

        for sink in &self.sinks {
            if let Err(e) = sink.store(artifact) {
                error!(
                    sink = sink.name(),
                    evidence_id = %artifact.id,
                    error = %e,
                    "Failed to store evidence artifact"
                );
                if first_error.is_none() {
                    first_error = Some(e);
                }
            }
        }

        first_error.map_or(Ok(()), Err)
    }

    /// Returns the number of configured sinks.
    #[must_use]
    pub fn sink_count(&self) -> usize {
        self.sinks.len()
    }
}

/// Builder for configuring an evidence emitter.
#[derive(Debug, Default)]
pub struct EvidenceEmitterBuilder {
    sinks: Vec<Arc<dyn EvidenceSink>>,
}

impl EvidenceEmitterBuilder {
    /// Adds a sink.
    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn EvidenceSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    /// Builds the emitter.
    #[must_use]
    pub fn build(self) -> EvidenceEmitter {
        EvidenceEmitter { sinks: self.sinks }
    }
}

/// Writes each artifact to `<dir>/<EvidenceID>.json`.
#[derive(Debug)]
pub struct FileEvidenceSink {
    dir: PathBuf,
}

impl FileEvidenceSink {
    /// Creates a sink writing into `dir`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, SinkError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| SinkError::Io {
            path: dir.clone(),
            source: e,
        })?;
        Ok(Self { dir })
    }

    /// Returns the artifact directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Returns the file an artifact with `id` is written to.
    #[must_use]
    pub fn path_for(&self, id: Uuid) -> PathBuf {
        self.dir.join(format!("{id}.json"))
    }
}

impl EvidenceSink for FileEvidenceSink {
    fn store(&self, artifact: &EvidenceArtifact) -> Result<(), SinkError> {
        let json = artifact.to_json_pretty()?;
        let path = self.path_for(artifact.id);
        let io_err = |e| SinkError::Io {
            path: path.clone(),
            source: e,
        };

        let mut file = File::create(&path).map_err(io_err)?;
        file.write_all(json.as_bytes()).map_err(io_err)?;
        file.sync_all().map_err(io_err)?;

        info!(path = %path.display(), "Evidence artifact saved");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "file"
    }
}

/// Tracing-based sink that mirrors artifacts into the log stream.
#[derive(Debug, Default)]
pub struct TracingEvidenceSink;

impl TracingEvidenceSink {
    /// Creates a new tracing sink.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl EvidenceSink for TracingEvidenceSink {
    fn store(&self, artifact: &EvidenceArtifact) -> Result<(), SinkError> {
        let json = serde_json::to_string(artifact)?;

        if artifact.is_violation() {
            warn!(
                evidence_id = %artifact.id,
                control = %artifact.control_id,
                evidence = %json,
                "Violation evidence"
            );
        } else {
            info!(
                evidence_id = %artifact.id,
                control = %artifact.control_id,
                evidence = %json,
                "Compliance evidence"
            );
        }

        Ok(())
    }

    fn name(&self) -> &'static str {
        "tracing"
    }
}

/// In-memory sink for testing.
#[derive(Debug, Default)]
pub struct InMemoryEvidenceSink {
    artifacts: Mutex<Vec<EvidenceArtifact>>,
}

impl InMemoryEvidenceSink {
    /// Creates a new in-memory sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all stored artifacts in first-stored order.
    #[must_use]
    pub fn artifacts(&self) -> Vec<EvidenceArtifact> {
        self.artifacts.lock().clone()
    }

    /// Returns the artifact with `id`.
    #[must_use]
    pub fn get(&self, id: Uuid) -> Option<EvidenceArtifact> {
        self.artifacts.lock().iter().find(|a| a.id == id).cloned()
    }

    /// Returns the number of stored artifacts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.artifacts.lock().len()
    }

    /// Returns true if nothing has been stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.artifacts.lock().is_empty()
    }

    /// Clears all stored artifacts.
    pub fn clear(&self) {
        self.artifacts.lock().clear();
    }
}

impl EvidenceSink for InMemoryEvidenceSink {
    fn store(&self, artifact: &EvidenceArtifact) -> Result<(), SinkError> {
        let mut artifacts = self.artifacts.lock();
        match artifacts.iter_mut().find(|a| a.id == artifact.id) {
            Some(existing) => *existing = artifact.clone(),
            None => artifacts.push(artifact.clone()),
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "in_memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct FailingSink;

    impl EvidenceSink for FailingSink {
        fn store(&self, _artifact: &EvidenceArtifact) -> Result<(), SinkError> {
            Err(SinkError::Backend {
                sink: "failing",
                message: "unavailable".to_string(),
            })
        }

        fn name(&self) -> &'static str {
            "failing"
        }
    }

    #[test]
    fn test_emitter_with_in_memory_sink() {
        let sink = Arc::new(InMemoryEvidenceSink::new());
        let emitter = EvidenceEmitter::builder().with_sink(sink.clone()).build();

        let artifact = EvidenceArtifact::tampering("AU-9", "line");
        emitter.emit(&artifact).unwrap();

        assert_eq!(sink.len(), 1);
        assert_eq!(sink.get(artifact.id), Some(artifact));
    }

    #[test]
    fn test_emitter_tries_every_sink() {
        let sink = Arc::new(InMemoryEvidenceSink::new());
        let emitter = EvidenceEmitter::builder()
            .with_sink(Arc::new(FailingSink))
            .with_sink(sink.clone())
            .build();

        let err = emitter
            .emit(&EvidenceArtifact::tampering("AU-9", "line"))
            .unwrap_err();

        assert!(err.to_string().contains("unavailable"));
        assert_eq!(sink.len(), 1);
        assert_eq!(emitter.sink_count(), 2);
    }

    #[test]
    fn test_in_memory_store_is_idempotent() {
        let sink = InMemoryEvidenceSink::new();
        let artifact = EvidenceArtifact::tampering("AU-9", "line");

        sink.store(&artifact).unwrap();
        sink.store(&artifact).unwrap();
        assert_eq!(sink.len(), 1);

        sink.clear();
        assert!(sink.is_empty());
    }

    #[test]
    fn test_file_sink_writes_json() {
        let dir = tempfile::tempdir().unwrap();
        let sink = FileEvidenceSink::new(dir.path().join("artifacts")).unwrap();
        let artifact = EvidenceArtifact::tampering("AU-9", "line");

        sink.store(&artifact).unwrap();
        sink.store(&artifact).unwrap();

        let path = sink.path_for(artifact.id);
        let written: EvidenceArtifact =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written, artifact);
        assert_eq!(fs::read_dir(sink.dir()).unwrap().count(), 1);
    }

    #[test]
    fn test_tracing_sink() {
        let sink = TracingEvidenceSink::new();
        sink.store(&EvidenceArtifact::tampering("AU-9", "line"))
            .unwrap();
        assert_eq!(sink.name(), "tracing");
    }
}
