//! Semantic extraction for the ALISA log audit pipeline.
//!
//! Raw log lines are turned into [`alisa_core::StructuredEvent`]s by an
//! [`Extractor`]. Two implementations are provided:
//!
//! - [`OllamaExtractor`] asks a local model to structure the line
//! - [`PatternExtractor`] applies the `User <actor> executed action: <action>` pattern
//!
//! [`parse_fallback`] is exposed on its own so callers can recover an event
//! when the model omits the action or fails.
//!
//! # Example
//!
//! ```rust
//! use alisa_extract::{Extractor, PatternExtractor};
//!
//! let extractor = PatternExtractor::new();
//! assert_eq!(extractor.name(), "pattern");
//! ```

mod config;
mod error;
mod extractor;
mod fallback;
mod ollama;

pub use config::{ExtractorConfig, ExtractorKind};
pub use error::ExtractionError;
pub use extractor::Extractor;
pub use fallback::{parse_fallback, PatternExtractor};
pub use ollama::{generate_prompt, OllamaExtractor};
