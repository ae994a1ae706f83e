//! Extractor test doubles.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use alisa_core::StructuredEvent;
use alisa_extract::{ExtractionError, Extractor};
use async_trait::async_trait;
use parking_lot::Mutex;

/// Returns a preset event per log line and an empty event otherwise.
///
/// Counts every call so tests can assert extraction was skipped.
#[derive(Debug, Default)]
pub struct ScriptedExtractor {
    responses: Mutex<HashMap<String, StructuredEvent>>,
    calls: AtomicUsize,
}

impl ScriptedExtractor {
    /// Creates an extractor with no scripted responses.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Scripts the event returned for `line`.
    #[must_use]
    pub fn with_response(self, line: impl Into<String>, event: StructuredEvent) -> Self {
        self.responses.lock().insert(line.into(), event);
        self
    }

    /// Returns how many times `extract` was called.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Extractor for ScriptedExtractor {
    async fn extract(&self, raw_log: &str) -> Result<StructuredEvent, ExtractionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.responses.lock().get(raw_log).cloned().unwrap_or_default())
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

/// Always fails as if the model server were down.
#[derive(Debug, Default, Clone, Copy)]
pub struct FailingExtractor;

#[async_trait]
impl Extractor for FailingExtractor {
    async fn extract(&self, _raw_log: &str) -> Result<StructuredEvent, ExtractionError> {
        Err(ExtractionError::HttpStatus {
            status: 503,
            message: "model unavailable".to_string(),
        })
    }

    fn name(&self) -> &'static str {
        "failing"
    }
}

/// Sleeps before answering with a fixed event.
#[derive(Debug, Clone)]
pub struct SlowExtractor {
    delay: Duration,
    event: StructuredEvent,
}

impl SlowExtractor {
    /// Creates an extractor that answers `event` after `delay`.
    #[must_use]
    pub const fn new(delay: Duration, event: StructuredEvent) -> Self {
        Self { delay, event }
    }
}

#[async_trait]
impl Extractor for SlowExtractor {
    async fn extract(&self, _raw_log: &str) -> Result<StructuredEvent, ExtractionError> {
        tokio::time::sleep(self.delay).await;
        Ok(self.event.clone())
    }

    fn name(&self) -> &'static str {
        "slow"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scripted_extractor() {
        let extractor = ScriptedExtractor::new()
            .with_response("line", StructuredEvent::new("alice", "Create_Invoice"));

        let event = extractor.extract("line").await.unwrap();
        assert_eq!(event.action(), Some("Create_Invoice"));
        assert!(extractor.extract("other").await.unwrap().is_empty());
        assert_eq!(extractor.calls(), 2);
    }

    #[tokio::test]
    async fn test_failing_extractor() {
        assert!(FailingExtractor.extract("line").await.is_err());
    }

    #[tokio::test]
    async fn test_slow_extractor() {
        let extractor = SlowExtractor::new(Duration::from_millis(10), StructuredEvent::empty());
        assert!(extractor.extract("line").await.unwrap().is_empty());
    }
}
