//! Append-only classification log kept as a single JSON array on disk.
//! One instance per process: every append is a read-append-rewrite under
//! one mutex, and the rewrite lands through a temp file + rename. Nothing
//! touches the file until the first read or append, so a damaged log only
//! fails the audit write, never the caller.

use crate::error::LogPersistenceError;
use crate::gate::{ClassificationResult, Label, Reason};
use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: Uuid,
    /// RFC 3339, UTC, millisecond precision
    pub timestamp: String,
    pub session_id: String,
    pub prediction: Label,
    pub reason: Reason,
    pub payload_sha256: String,
    /// Raw payload as received, for audit
    pub details: Value,
}

impl LogEntry {
    /// `payload_text` is the request body exactly as received; the digest
    /// is taken over it rather than over `details`.
    pub fn new(result: &ClassificationResult, payload_text: &str, details: Value) -> Self {
        let mut h = Sha256::new();
        h.update(payload_text.as_bytes());
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            session_id: result.session_id.clone(),
            prediction: result.label,
            reason: result.reason,
            payload_sha256: format!("{:x}", h.finalize()),
            details,
        }
    }
}

/// Listing row. Fields are optional because entries written by other tools
/// are kept as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session_id: Option<String>,
    pub timestamp: Option<String>,
    pub prediction: Option<String>,
}

impl SessionSummary {
    fn from_entry(entry: &Value) -> Self {
        let text = |k: &str| entry.get(k).and_then(Value::as_str).map(String::from);
        Self {
            session_id: text("session_id"),
            timestamp: text("timestamp"),
            prediction: text("prediction"),
        }
    }

    fn sort_key(&self) -> Option<DateTime<Utc>> {
        let ts = self.timestamp.as_deref()?;
        DateTime::parse_from_rfc3339(ts)
            .map(|t| t.with_timezone(&Utc))
            .ok()
            .or_else(|| {
                // naive ISO timestamps from older writers, taken as UTC
                NaiveDateTime::parse_from_str(ts, "%Y-%m-%dT%H:%M:%S%.f")
                    .ok()
                    .map(|n| n.and_utc())
            })
    }
}

pub struct SessionLog {
    path: PathBuf,
    lock: Mutex<()>,
}

impl SessionLog {
    /// Log at `path`. A missing file reads as empty; it and its directory
    /// are created by the first append.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(
        &self,
        result: &ClassificationResult,
        payload_text: &str,
        details: Value,
    ) -> Result<LogEntry, LogPersistenceError> {
        let entry = LogEntry::new(result, payload_text, details);
        let value = serde_json::to_value(&entry).map_err(|source| LogPersistenceError::Json {
            path: self.path.clone(),
            source,
        })?;

        let _guard = self.lock.lock().map_err(|_| LogPersistenceError::Poisoned)?;
        let mut entries = self.read_entries()?;
        entries.push(value);
        self.write_entries(&entries)?;
        Ok(entry)
    }

    /// `{session_id, timestamp, prediction}` rows, newest first. Rows
    /// without a readable timestamp sort last.
    pub fn list(&self) -> Result<Vec<SessionSummary>, LogPersistenceError> {
        let entries = {
            let _guard = self.lock.lock().map_err(|_| LogPersistenceError::Poisoned)?;
            self.read_entries()?
        };
        let mut rows: Vec<(Option<DateTime<Utc>>, SessionSummary)> = entries
            .iter()
            .map(SessionSummary::from_entry)
            .map(|s| (s.sort_key(), s))
            .collect();
        rows.sort_by(|a, b| b.0.cmp(&a.0));
        Ok(rows.into_iter().map(|(_, s)| s).collect())
    }

    pub fn len(&self) -> Result<usize, LogPersistenceError> {
        let _guard = self.lock.lock().map_err(|_| LogPersistenceError::Poisoned)?;
        Ok(self.read_entries()?.len())
    }

    pub fn is_empty(&self) -> Result<bool, LogPersistenceError> {
        Ok(self.len()? == 0)
    }

    fn read_entries(&self) -> Result<Vec<Value>, LogPersistenceError> {
        let data = match std::fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(LogPersistenceError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        if data.trim().is_empty() {
            return Ok(Vec::new());
        }
        match serde_json::from_str(&data) {
            Ok(Value::Array(entries)) => Ok(entries),
            Ok(_) => Err(LogPersistenceError::NotAnArray(self.path.clone())),
            Err(source) => Err(LogPersistenceError::Json {
                path: self.path.clone(),
                source,
            }),
        }
    }

    fn write_entries(&self, entries: &[Value]) -> Result<(), LogPersistenceError> {
        let data = serde_json::to_vec_pretty(entries).map_err(|source| LogPersistenceError::Json {
            path: self.path.clone(),
            source,
        })?;
        let tmp = self.path.with_extension("json.tmp");
        let dir = self.path.parent().filter(|d| !d.as_os_str().is_empty());
        dir.map_or(Ok(()), std::fs::create_dir_all)
            .and_then(|_| std::fs::write(&tmp, data))
            .and_then(|_| std::fs::rename(&tmp, &self.path))
            .map_err(|source| LogPersistenceError::Io {
                path: self.path.clone(),
                source,
            })
    }
}
