//! Configuration types for extractors.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::ExtractionError;

/// Which extractor the pipeline uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractorKind {
    /// A local Ollama model, with the textual pattern as fallback.
    #[default]
    Ollama,
    /// The textual pattern only.
    Pattern,
}

/// Configuration for the extraction service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Extractor to use.
    pub kind: ExtractorKind,

    /// Base URL of the Ollama server (e.g., "<http://localhost:11434>").
    pub url: String,

    /// Model name.
    pub model: String,

    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            kind: ExtractorKind::Ollama,
            url: "http://localhost:11434".to_string(),
            model: "phi3".to_string(),
            timeout_secs: 30,
        }
    }
}

impl ExtractorConfig {
    /// Creates the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the extractor kind.
    #[must_use]
    pub const fn with_kind(mut self, kind: ExtractorKind) -> Self {
        self.kind = kind;
        self
    }

    /// Sets the server URL.
    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// Sets the model name.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_secs = timeout.as_secs();
        self
    }

    /// Returns the request timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Returns the generate endpoint under the configured base URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is invalid.
    ///
    /// # Examples
    ///
    /// ```
    /// use alisa_extract::ExtractorConfig;
    ///
    /// let config = ExtractorConfig::new().with_url("http://gpu-box:11434/ollama");
    /// assert_eq!(
    ///     config.generate_endpoint().unwrap().as_str(),
    ///     "http://gpu-box:11434/ollama/api/generate"
    /// );
    /// ```
    pub fn generate_endpoint(&self) -> Result<Url, ExtractionError> {
        let mut base = Url::parse(&self.url)?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(base.join("api/generate")?)
    }
}
