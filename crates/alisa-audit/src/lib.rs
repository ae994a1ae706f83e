//! Audit trail and evidence for the ALISA log audit pipeline.
//!
//! This crate provides:
//! - Evidence artifacts documenting each audit decision
//! - Audit findings and integrity baselines as persisted rows
//! - Evidence sinks (file, tracing, in-memory) behind one trait
//! - Audit stores (SQLite, in-memory) behind one trait
//!
//! # Example
//!
//! ```rust
//! use alisa_audit::{AuditFinding, AuditStore, EvidenceArtifact, EvidenceEmitter, InMemoryEvidenceSink, SqliteAuditStore};
//! use alisa_core::integrity;
//! use std::sync::Arc;
//!
//! let store = SqliteAuditStore::in_memory().unwrap();
//! let line = "Jun 14 15:16:01 combo sshd(pam_unix)[19939]: password check; user=root";
//! let log_id = store.append_log_baseline(line, &integrity::digest(line)).unwrap();
//! store.append_finding(&AuditFinding::clear(log_id, Some("root"), None, "AC-5")).unwrap();
//!
//! let sink = Arc::new(InMemoryEvidenceSink::new());
//! let emitter = EvidenceEmitter::builder().with_sink(sink.clone()).build();
//! emitter.emit(&EvidenceArtifact::tampering("AU-9", line)).unwrap();
//! assert_eq!(sink.len(), 1);
//! ```

mod artifact;
mod error;
mod finding;
mod sink;
mod store;

pub use artifact::{EvidenceArtifact, EvidenceStatus, SourceLog, TAMPER_REASON};
pub use error::{SinkError, StoreError};
pub use finding::{
    AuditFinding, AuditId, EvidencePayload, LogBaseline, LogId, StoredFinding, Verdict, UNKNOWN,
};
pub use sink::{
    EvidenceEmitter, EvidenceEmitterBuilder, EvidenceSink, FileEvidenceSink, InMemoryEvidenceSink,
    TracingEvidenceSink,
};
pub use store::{AuditStore, InMemoryAuditStore, SqliteAuditStore};
