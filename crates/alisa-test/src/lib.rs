//! # ALISA Test
//!
//! Test support for the ALISA log audit pipeline.
//!
//! This crate provides:
//!
//! - Seeded generation of synthetic auth logs, SoD sequences and tampered pairs
//! - The sample conflict policy and LogHub reference lines
//! - Extractor test doubles (scripted, failing, slow)
//! - Bulk seeding of an audit trail with synthetic history
//! - Assertion helpers for findings and evidence
//!
//! ## Example
//!
//! ```rust
//! use alisa_core::{integrity, SoDRuleEngine};
//! use alisa_extract::parse_fallback;
//! use alisa_test::{fixtures, LogGenerator};
//!
//! let engine = SoDRuleEngine::new(fixtures::sample_policy());
//! let mut generator = LogGenerator::seeded(1);
//!
//! let [create, approve] = generator.sod_violation_sequence();
//! assert!(engine.analyze(&parse_fallback(&create).unwrap()).is_empty());
//! assert_eq!(engine.analyze(&parse_fallback(&approve).unwrap()).len(), 1);
//!
//! let pair = generator.tampered_pair();
//! assert!(!integrity::verify(&pair.tampered, &integrity::digest(&pair.original)));
//! ```

pub mod assertions;
pub mod extractors;
pub mod fixtures;
pub mod generator;
pub mod seeder;

pub use extractors::{FailingExtractor, ScriptedExtractor, SlowExtractor};
pub use generator::{LogGenerator, TamperedPair};
pub use seeder::{seed_audit_trail, SeedSummary};
