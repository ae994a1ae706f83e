//! # ALISA Pipeline
//!
//! Runs individual log lines through integrity verification, semantic
//! extraction, segregation-of-duties evaluation and reporting.
//!
//! - [`AuditPipeline`] - The per-line protocol, with a tamper short-circuit
//! - [`PipelineVerdict`] - Whether a run completed or was aborted
//! - [`PipelineConfig`] - YAML configuration for every collaborator
//! - [`bootstrap`] - Builds a pipeline from configuration
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use alisa_audit::{InMemoryAuditStore, InMemoryEvidenceSink};
//! use alisa_core::{integrity, ConflictPolicy, SoDRuleEngine};
//! use alisa_extract::PatternExtractor;
//! use alisa_pipeline::AuditPipeline;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), alisa_pipeline::PipelineError> {
//! let sink = Arc::new(InMemoryEvidenceSink::new());
//! let pipeline = AuditPipeline::builder()
//!     .with_engine(Arc::new(SoDRuleEngine::new(ConflictPolicy::empty())))
//!     .with_extractor(Arc::new(PatternExtractor::new()))
//!     .with_store(Arc::new(InMemoryAuditStore::new()))
//!     .with_sink(sink.clone())
//!     .build()?;
//!
//! let baseline = integrity::digest("authentication failure; user=root");
//! let verdict = pipeline.process("accepted password; user=root", Some(&baseline)).await?;
//! assert!(!verdict.is_completed());
//! assert_eq!(sink.len(), 1);
//! # Ok(())
//! # }
//! ```

pub mod bootstrap;
mod config;
mod error;
mod pipeline;
mod verdict;

pub use bootstrap::build_pipeline;
pub use config::{PipelineConfig, PolicyConfig, ReportingConfig, StorageConfig};
pub use error::{PipelineError, Result};
pub use pipeline::{AuditPipeline, AuditPipelineBuilder, DEFAULT_EXTRACTION_TIMEOUT};
pub use verdict::{ExtractionSource, PipelineVerdict, ProcessReport, TamperReport};
