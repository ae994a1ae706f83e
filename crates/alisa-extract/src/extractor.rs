//! The extraction seam.

use std::fmt::Debug;

use alisa_core::StructuredEvent;
use async_trait::async_trait;

use crate::error::ExtractionError;

/// Turns a raw log line into a [`StructuredEvent`].
///
/// Implementations may return a partial event. Either field may be missing,
/// and callers decide how to treat that.
#[async_trait]
pub trait Extractor: Send + Sync + Debug {
    /// Extracts a structured event from `raw_log`.
    ///
    /// # Errors
    ///
    /// Returns an error if the extraction backend fails.
    async fn extract(&self, raw_log: &str) -> Result<StructuredEvent, ExtractionError>;

    /// Returns the extractor name for identification.
    fn name(&self) -> &'static str;
}
