//! # ALISA Core
//!
//! Core types for the ALISA log audit pipeline.
//!
//! This crate holds the parts of the pipeline that have no I/O:
//!
//! - [`integrity`] - SHA-256 integrity digests for tamper-evident baselines
//! - [`ConflictPolicy`] - Conflicting action pairs per compliance control
//! - [`SoDRuleEngine`] - Per-actor action history and segregation-of-duties evaluation
//! - [`StructuredEvent`] and [`Violation`] - Engine input and output
//!
//! ## Example
//!
//! ```rust
//! use alisa_core::{integrity, ConflictPolicy, SoDRuleEngine, StructuredEvent};
//!
//! let policy = ConflictPolicy::from_yaml_str(r#"
//! rules:
//!   nist_ac2_sod:
//!     id: "AC-5"
//!     conflict_actions:
//!       - [Create_Invoice, Approve_Payment]
//! "#).unwrap();
//! let engine = SoDRuleEngine::new(policy);
//!
//! let line = "User u_finance_01 executed action: Approve_Payment ID=INV-2024-001";
//! let baseline = integrity::digest(line);
//! assert!(integrity::verify(line, &baseline));
//!
//! let _ = engine.analyze(&StructuredEvent::new("u_finance_01", "Create_Invoice"));
//! let violations = engine.analyze(&StructuredEvent::new("u_finance_01", "Approve_Payment"));
//! assert_eq!(violations.len(), 1);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod engine;
pub mod error;
pub mod event;
pub mod integrity;
pub mod policy;


pub use engine::{EngineConfig, HistoryMode, ReportingMode, SoDRuleEngine};
pub use error::{Error, Result};
pub use event::{StructuredEvent, Violation};
pub use integrity::IntegrityDigest;
pub use policy::{ConflictPair, ConflictPolicy, ConflictRule, PolicyFailureMode};
