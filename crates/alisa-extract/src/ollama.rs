//! Ollama-backed extraction.
//!
//! Sends each log line to a local model via `POST /api/generate` with JSON
//! output forced, and decodes the model's `response` string as the event.

use alisa_core::StructuredEvent;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::config::ExtractorConfig;
use crate::error::ExtractionError;
use crate::extractor::Extractor;

const USER_AGENT: &str = concat!("alisa/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: String,
    stream: bool,
    format: &'static str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: Option<String>,
}

/// Builds the prompt asking the model to structure one log line.
#[must_use]
pub fn generate_prompt(log_line: &str) -> String {
    format!(
        r#"Parse the following log line into JSON: "{log_line}"
JSON Schema:
{{
  "Month": string,
  "Date": number,
  "Time": string,
  "Level": string,
  "Component": string,
  "PID": number,
  "Content": string,
  "user": string,
  "action": string
}}
Output ONLY THE JSON."#
    )
}

/// Extractor backed by an Ollama server.
#[derive(Debug)]
pub struct OllamaExtractor {
    config: ExtractorConfig,
    endpoint: Url,
    http: reqwest::Client,
}

impl OllamaExtractor {
    /// Creates a new extractor with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid or the HTTP client cannot be created.
    ///
    /// # Examples
    ///
    /// ```
    /// use alisa_extract::{ExtractorConfig, OllamaExtractor};
    ///
    /// let extractor = OllamaExtractor::new(ExtractorConfig::default())?;
    /// assert_eq!(extractor.endpoint().path(), "/api/generate");
    /// # Ok::<(), alisa_extract::ExtractionError>(())
    /// ```
    pub fn new(config: ExtractorConfig) -> Result<Self, ExtractionError> {
        let endpoint = config.generate_endpoint()?;
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| ExtractionError::InvalidConfig {
                reason: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            config,
            endpoint,
            http,
        })
    }

    /// Returns the extractor configuration.
    #[must_use]
    pub const fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Returns the generate endpoint.
    #[must_use]
    pub const fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    fn request_error(&self, source: reqwest::Error) -> ExtractionError {
        if source.is_timeout() {
            ExtractionError::Timeout {
                after: self.config.timeout(),
            }
        } else {
            ExtractionError::Request {
                url: self.endpoint.to_string(),
                source,
            }
        }
    }
}

#[async_trait]
impl Extractor for OllamaExtractor {
    async fn extract(&self, raw_log: &str) -> Result<StructuredEvent, ExtractionError> {
        let request = GenerateRequest {
            model: &self.config.model,
            prompt: generate_prompt(raw_log),
            stream: false,
            format: "json",
        };

        let response = self
            .http
            .post(self.endpoint.clone())
            .json(&request)
            .send()
            .await
            .map_err(|e| self.request_error(e))?;

        if !response.status().is_success() {
            return Err(ExtractionError::HttpStatus {
                status: response.status().as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }

        let body: GenerateResponse = response
            .json()
            .await
            .map_err(|e| ExtractionError::Decode {
                reason: e.to_string(),
            })?;

        let event = decode_response(body.response.as_deref())?;
        debug!(
            model = %self.config.model,
            actor = event.actor().unwrap_or_default(),
            action = event.action().unwrap_or_default(),
            "Log line extracted"
        );
        Ok(event)
    }

    fn name(&self) -> &'static str {
        "ollama"
    }
}

/// Decodes the model's `response` string. A missing response is an empty object.
fn decode_response(response: Option<&str>) -> Result<StructuredEvent, ExtractionError> {
    let text = response.unwrap_or("{}");
    let value: Value = serde_json::from_str(text).map_err(|e| ExtractionError::Decode {
        reason: format!("model output is not JSON: {e}"),
    })?;

    match value {
        Value::Object(fields) => Ok(StructuredEvent::from(fields)),
        other => Err(ExtractionError::Decode {
            reason: format!("expected a JSON object, got {}", kind_of(&other)),
        }),
    }
}

const fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
