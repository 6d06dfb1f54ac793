//! Repair pass for the legacy line-oriented corpus format (one JSON object
//! per line) into a single JSON array. Idempotent: text that is already an
//! array comes back untouched.

use crate::error::RepairError;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use walkdir::WalkDir;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RepairReport {
    pub already_array: bool,
    pub kept: usize,
    /// Lines that were not JSON objects or arrays
    pub discarded: usize,
}

pub fn repair_text(text: &str) -> Result<(String, RepairReport), RepairError> {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Array(items)) => {
            let report = RepairReport {
                already_array: true,
                kept: items.len(),
                discarded: 0,
            };
            return Ok((text.to_string(), report));
        }
        // a single (possibly pretty-printed) object spans several lines
        Ok(object @ Value::Object(_)) => {
            let report = RepairReport {
                already_array: false,
                kept: 1,
                discarded: 0,
            };
            return Ok((serde_json::to_string_pretty(&[object])?, report));
        }
        _ => {}
    }

    let mut sessions = Vec::new();
    let mut report = RepairReport::default();
    for (n, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<Value>(line) {
            Ok(v @ Value::Object(_)) => sessions.push(v),
            Ok(Value::Array(items)) => sessions.extend(items),
            Ok(_) | Err(_) => {
                warn!(line = n + 1, "skipping malformed corpus line");
                report.discarded += 1;
            }
        }
    }
    report.kept = sessions.len();
    Ok((serde_json::to_string_pretty(&sessions)?, report))
}

/// Repairs one file in place. The file is only rewritten when its text
/// changes.
pub fn repair_file(path: &Path) -> Result<RepairReport, RepairError> {
    let io_err = |source| RepairError::Io {
        path: path.to_path_buf(),
        source,
    };
    let text = std::fs::read_to_string(path).map_err(io_err)?;
    let (repaired, report) = repair_text(&text)?;
    if repaired != text {
        let tmp = path.with_extension("repair.tmp");
        std::fs::write(&tmp, repaired)
            .and_then(|_| std::fs::rename(&tmp, path))
            .map_err(io_err)?;
    }
    info!(
        path = %path.display(),
        kept = report.kept,
        discarded = report.discarded,
        already_array = report.already_array,
        "corpus file repaired"
    );
    Ok(report)
}

/// Repairs a file, or every `.json` / `.jsonl` file under a directory.
pub fn repair_path(path: &Path) -> Result<Vec<(PathBuf, RepairReport)>, RepairError> {
    if !path.is_dir() {
        return Ok(vec![(path.to_path_buf(), repair_file(path)?)]);
    }
    let mut out = Vec::new();
    for entry in WalkDir::new(path).sort_by_file_name() {
        let entry = entry?;
        let is_corpus = entry
            .path()
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e == "json" || e == "jsonl");
        if entry.file_type().is_file() && is_corpus {
            out.push((entry.path().to_path_buf(), repair_file(entry.path())?));
        }
    }
    Ok(out)
}
