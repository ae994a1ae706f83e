//! Pipeline configuration.
//!
//! Loaded from YAML. Every section and field is optional:
//!
//! ```yaml
//! policy:
//!   path: config/policy.yaml
//!   on_error: closed
//! engine:
//!   history: { mode: window, max_actions: 50 }
//!   reporting: first_occurrence
//! extractor:
//!   kind: ollama
//!   url: http://localhost:11434
//!   model: phi3
//!   timeout_secs: 30
//! storage:
//!   database: data/alisa_audit.db
//!   artifacts_dir: data/artifacts
//! reporting:
//!   integrity_control: AU-9
//!   default_control: AC-5
//!   emit_compliant_evidence: false
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use alisa_core::{EngineConfig, PolicyFailureMode};
use alisa_extract::ExtractorConfig;
use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};

/// Top-level pipeline configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Where the conflict policy comes from.
    pub policy: PolicyConfig,
    /// Rule engine options.
    pub engine: EngineConfig,
    /// Extractor selection and settings.
    pub extractor: ExtractorConfig,
    /// Audit trail and evidence locations.
    pub storage: StorageConfig,
    /// Control ids and evidence options.
    pub reporting: ReportingConfig,
}

impl PipelineConfig {
    /// Parses a configuration from YAML.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML is malformed.
    ///
    /// # Examples
    ///
    /// ```
    /// use alisa_pipeline::PipelineConfig;
    ///
    /// let config = PipelineConfig::from_yaml_str("storage:\n  database: \":memory:\"\n").unwrap();
    /// assert_eq!(config.storage.database.to_str(), Some(":memory:"));
    /// assert_eq!(config.reporting.integrity_control, "AU-9");
    /// ```
    pub fn from_yaml_str(source: &str) -> Result<Self> {
        if source.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(source)?)
    }

    /// Loads a configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is malformed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = fs::read_to_string(path).map_err(|e| PipelineError::ConfigRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_yaml_str(&source).map_err(|e| PipelineError::Config {
            reason: format!("{}: {e}", path.display()),
        })
    }

    /// Sets the policy section.
    #[must_use]
    pub fn with_policy(mut self, policy: PolicyConfig) -> Self {
        self.policy = policy;
        self
    }

    /// Sets the engine section.
    #[must_use]
    pub const fn with_engine(mut self, engine: EngineConfig) -> Self {
        self.engine = engine;
        self
    }

    /// Sets the extractor section.
    #[must_use]
    pub fn with_extractor(mut self, extractor: ExtractorConfig) -> Self {
        self.extractor = extractor;
        self
    }

    /// Sets the storage section.
    #[must_use]
    pub fn with_storage(mut self, storage: StorageConfig) -> Self {
        self.storage = storage;
        self
    }

    /// Sets the reporting section.
    #[must_use]
    pub fn with_reporting(mut self, reporting: ReportingConfig) -> Self {
        self.reporting = reporting;
        self
    }
}

/// Policy source settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    /// Path to the policy YAML.
    pub path: PathBuf,
    /// What to do if the policy cannot be loaded.
    pub on_error: PolicyFailureMode,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("config/policy.yaml"),
            on_error: PolicyFailureMode::Closed,
        }
    }
}

impl PolicyConfig {
    /// Sets the policy path.
    #[must_use]
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = path.into();
        self
    }

    /// Sets the failure mode.
    #[must_use]
    pub const fn with_on_error(mut self, on_error: PolicyFailureMode) -> Self {
        self.on_error = on_error;
        self
    }
}

/// Audit trail and evidence locations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// SQLite database path, or `:memory:`.
    pub database: PathBuf,
    /// Directory evidence artifacts are written to.
    pub artifacts_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database: PathBuf::from("data/alisa_audit.db"),
            artifacts_dir: PathBuf::from("data/artifacts"),
        }
    }
}

impl StorageConfig {
    /// Sets the database path.
    #[must_use]
    pub fn with_database(mut self, database: impl Into<PathBuf>) -> Self {
        self.database = database.into();
        self
    }

    /// Sets the artifacts directory.
    #[must_use]
    pub fn with_artifacts_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.artifacts_dir = dir.into();
        self
    }
}

/// Control ids used in findings and evidence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportingConfig {
    /// Control recorded on tamper evidence.
    pub integrity_control: String,
    /// Control recorded on clear findings when the policy has no rules.
    pub default_control: String,
    /// Also emit COMPLIANT evidence for clear findings.
    pub emit_compliant_evidence: bool,
}

impl Default for ReportingConfig {
    fn default() -> Self {
        Self {
            integrity_control: "AU-9".to_string(),
            default_control: "AC-5".to_string(),
            emit_compliant_evidence: false,
        }
    }
}

impl ReportingConfig {
    /// Sets the tamper evidence control.
    #[must_use]
    pub fn with_integrity_control(mut self, control: impl Into<String>) -> Self {
        self.integrity_control = control.into();
        self
    }

    /// Sets the fallback control for clear findings.
    #[must_use]
    pub fn with_default_control(mut self, control: impl Into<String>) -> Self {
        self.default_control = control.into();
        self
    }

    /// Enables or disables COMPLIANT evidence.
    #[must_use]
    pub const fn with_compliant_evidence(mut self, enabled: bool) -> Self {
        self.emit_compliant_evidence = enabled;
        self
    }
}
