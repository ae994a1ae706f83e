//! Append-only audit trail storage.
//!
//! The trail has two tables: `IntegrityBaseline` holds every ingested log
//! line with its digest, and `AuditItems` holds the findings, each pointing
//! at a baseline row. Appends are committed before they return.

use std::fmt::Debug;
use std::path::Path;

use alisa_core::IntegrityDigest;
use chrono::{DateTime, NaiveDateTime, Utc};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::error::StoreError;
use crate::finding::{AuditFinding, AuditId, EvidencePayload, LogBaseline, LogId, StoredFinding};

/// Persistence backend for the audit trail.
pub trait AuditStore: Send + Sync + Debug {
    /// Records a log line and its digest, returning the new log id.
    ///
    /// # Errors
    ///
    /// Returns an error if the write cannot be committed.
    fn append_log_baseline(&self, raw: &str, digest: &IntegrityDigest) -> Result<LogId, StoreError>;

    /// Records a finding, returning the new audit id.
    ///
    /// # Errors
    ///
    /// Returns an error if the write cannot be committed.
    fn append_finding(&self, finding: &AuditFinding) -> Result<AuditId, StoreError>;

    /// Returns the baseline row with `log_id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    fn baseline(&self, log_id: LogId) -> Result<Option<LogBaseline>, StoreError>;

    /// Returns every baseline row in id order.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    fn baselines(&self) -> Result<Vec<LogBaseline>, StoreError>;

    /// Returns every finding in id order.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    fn findings(&self) -> Result<Vec<StoredFinding>, StoreError>;

    /// Returns the store name for identification.
    fn name(&self) -> &'static str;
}

/// SQLite-backed audit store.
#[derive(Debug)]
pub struct SqliteAuditStore {
    conn: Mutex<Connection>,
}

impl SqliteAuditStore {
    /// Opens (or creates) the database at `path`. `:memory:` opens an
    /// in-memory database.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or initialized.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if path == Path::new(":memory:") {
            return Self::in_memory();
        }
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| StoreError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
        Self::init(Connection::open(path)?)
    }

    /// Creates an in-memory store (for testing).
    ///
    /// # Errors
    ///
    /// Returns an error if the schema cannot be created.
    pub fn in_memory() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS IntegrityBaseline (
                LogID INTEGER PRIMARY KEY AUTOINCREMENT,
                LogLine TEXT NOT NULL,
                HashSHA256 TEXT NOT NULL,
                Timestamp DATETIME DEFAULT CURRENT_TIMESTAMP
            );
            CREATE TABLE IF NOT EXISTS AuditItems (
                AuditID INTEGER PRIMARY KEY AUTOINCREMENT,
                LogID INTEGER,
                Timestamp TEXT,
                UserID TEXT,
                Action TEXT,
                Verdict TEXT,
                NIST_Control TEXT,
                EvidenceArtifact JSON,
                FOREIGN KEY (LogID) REFERENCES IntegrityBaseline (LogID)
            );",
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

impl AuditStore for SqliteAuditStore {
    fn append_log_baseline(&self, raw: &str, digest: &IntegrityDigest) -> Result<LogId, StoreError> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO IntegrityBaseline (LogLine, HashSHA256, Timestamp) VALUES (?1, ?2, ?3)",
            params![raw, digest.to_hex(), Utc::now().to_rfc3339()],
        )?;
        Ok(LogId(conn.last_insert_rowid()))
    }

    fn append_finding(&self, finding: &AuditFinding) -> Result<AuditId, StoreError> {
        let evidence = serde_json::to_string(&finding.evidence)?;
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO AuditItems
             (LogID, Timestamp, UserID, Action, Verdict, NIST_Control, EvidenceArtifact)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                finding.log_id.0,
                finding.timestamp.to_rfc3339(),
                finding.user_id,
                finding.action,
                finding.verdict.as_str(),
                finding.control_id,
                evidence,
            ],
        )?;
        Ok(AuditId(conn.last_insert_rowid()))
    }

    fn baseline(&self, log_id: LogId) -> Result<Option<LogBaseline>, StoreError> {
        let conn = self.conn.lock();
        let raw = conn
            .query_row(
                "SELECT LogID, LogLine, HashSHA256, Timestamp FROM IntegrityBaseline WHERE LogID = ?1",
                params![log_id.0],
                RawBaseline::from_row,
            )
            .optional()?;
        raw.map(RawBaseline::decode).transpose()
    }

    fn baselines(&self) -> Result<Vec<LogBaseline>, StoreError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT LogID, LogLine, HashSHA256, Timestamp FROM IntegrityBaseline ORDER BY LogID",
        )?;
        let rows = stmt
            .query_map([], RawBaseline::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter().map(RawBaseline::decode).collect()
    }

    fn findings(&self) -> Result<Vec<StoredFinding>, StoreError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT AuditID, LogID, Timestamp, UserID, Action, Verdict, NIST_Control, EvidenceArtifact
             FROM AuditItems ORDER BY AuditID",
        )?;
        let rows = stmt
            .query_map([], RawFinding::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter().map(RawFinding::decode).collect()
    }

    fn name(&self) -> &'static str {
        "sqlite"
    }
}

struct RawBaseline {
    log_id: i64,
    log_line: String,
    hash: String,
    timestamp: Option<String>,
}

impl RawBaseline {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            log_id: row.get(0)?,
            log_line: row.get(1)?,
            hash: row.get(2)?,
            timestamp: row.get(3)?,
        })
    }

    fn decode(self) -> Result<LogBaseline, StoreError> {
        let digest = self.hash.parse().map_err(|e| StoreError::Corrupt {
            reason: format!("baseline {}: {e}", self.log_id),
        })?;
        Ok(LogBaseline {
            log_id: LogId(self.log_id),
            log_line: self.log_line,
            digest,
            timestamp: parse_timestamp(self.timestamp.as_deref())?,
        })
    }
}

struct RawFinding {
    audit_id: i64,
    log_id: i64,
    timestamp: Option<String>,
    user_id: Option<String>,
    action: Option<String>,
    verdict: Option<String>,
    control_id: Option<String>,
    evidence: Option<String>,
}

impl RawFinding {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            audit_id: row.get(0)?,
            log_id: row.get(1)?,
            timestamp: row.get(2)?,
            user_id: row.get(3)?,
            action: row.get(4)?,
            verdict: row.get(5)?,
            control_id: row.get(6)?,
            evidence: row.get(7)?,
        })
    }

    fn decode(self) -> Result<StoredFinding, StoreError> {
        let evidence = match self.evidence.as_deref() {
            None | Some("") => EvidencePayload::default(),
            Some(json) => serde_json::from_str(json)?,
        };
        let verdict = self.verdict.as_deref().unwrap_or_default().parse()?;
        Ok(StoredFinding {
            audit_id: AuditId(self.audit_id),
            finding: AuditFinding {
                log_id: LogId(self.log_id),
                timestamp: parse_timestamp(self.timestamp.as_deref())?,
                user_id: self.user_id.unwrap_or_default(),
                action: self.action.unwrap_or_default(),
                verdict,
                control_id: self.control_id.unwrap_or_default(),
                evidence,
            },
        })
    }
}

/// Parses RFC 3339 timestamps as well as the naive forms written by SQLite's
/// `CURRENT_TIMESTAMP` and by older tooling, which are taken as UTC.
fn parse_timestamp(value: Option<&str>) -> Result<DateTime<Utc>, StoreError> {
    let Some(value) = value else {
        return Err(StoreError::Corrupt {
            reason: "missing timestamp".to_string(),
        });
    };
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Ok(ts.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .map(|naive| naive.and_utc())
        .ok_or_else(|| StoreError::Corrupt {
            reason: format!("invalid timestamp '{value}'"),
        })
}

#[derive(Debug, Default)]
struct MemoryTrail {
    baselines: Vec<LogBaseline>,
    findings: Vec<StoredFinding>,
}

/// In-memory audit store for testing.
#[derive(Debug, Default)]
pub struct InMemoryAuditStore {
    trail: Mutex<MemoryTrail>,
}

impl InMemoryAuditStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of baseline rows.
    #[must_use]
    pub fn baseline_count(&self) -> usize {
        self.trail.lock().baselines.len()
    }

    /// Returns the number of findings.
    #[must_use]
    pub fn finding_count(&self) -> usize {
        self.trail.lock().findings.len()
    }
}

impl AuditStore for InMemoryAuditStore {
    fn append_log_baseline(&self, raw: &str, digest: &IntegrityDigest) -> Result<LogId, StoreError> {
        let mut trail = self.trail.lock();
        let log_id = LogId(next_id(trail.baselines.len())?);
        trail.baselines.push(LogBaseline {
            log_id,
            log_line: raw.to_string(),
            digest: *digest,
            timestamp: Utc::now(),
        });
        Ok(log_id)
    }

    fn append_finding(&self, finding: &AuditFinding) -> Result<AuditId, StoreError> {
        let mut trail = self.trail.lock();
        if !trail.baselines.iter().any(|b| b.log_id == finding.log_id) {
            return Err(StoreError::Backend(format!(
                "finding references unknown log {}",
                finding.log_id
            )));
        }
        let audit_id = AuditId(next_id(trail.findings.len())?);
        trail.findings.push(StoredFinding {
            audit_id,
            finding: finding.clone(),
        });
        Ok(audit_id)
    }

    fn baseline(&self, log_id: LogId) -> Result<Option<LogBaseline>, StoreError> {
        Ok(self
            .trail
            .lock()
            .baselines
            .iter()
            .find(|b| b.log_id == log_id)
            .cloned())
    }

    fn baselines(&self) -> Result<Vec<LogBaseline>, StoreError> {
        Ok(self.trail.lock().baselines.clone())
    }

    fn findings(&self) -> Result<Vec<StoredFinding>, StoreError> {
        Ok(self.trail.lock().findings.clone())
    }

    fn name(&self) -> &'static str {
        "in_memory"
    }
}

fn next_id(len: usize) -> Result<i64, StoreError> {
    i64::try_from(len + 1).map_err(|_| StoreError::Backend("id space exhausted".to_string()))
}
