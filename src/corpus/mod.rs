//! Offline training corpus: labeled session files → feature table.

mod builder;
mod export;
mod repair;

pub use builder::{build, BuildSummary, CorpusBuilder, TrainingRow, TrainingTable};
pub use export::{header, write_csv, write_csv_file, ExportOptions};
pub use repair::{repair_file, repair_path, repair_text, RepairReport};

use crate::config::LabeledFile;
use crate::gate::Label;
use crate::telemetry::RawSessionPayload;
use serde_json::Value;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq)]
pub struct CorpusEntry {
    pub payload: RawSessionPayload,
    pub label: Label,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadSummary {
    pub files_read: usize,
    pub files_skipped: usize,
    pub sessions: usize,
    /// Array elements that were not session objects
    pub skipped_records: usize,
}

/// Reads every labeled file (one JSON array of sessions each). Missing or
/// undecodable files are skipped with a warning.
pub fn load_labeled_files(files: &[LabeledFile]) -> (Vec<CorpusEntry>, LoadSummary) {
    let mut entries = Vec::new();
    let mut summary = LoadSummary::default();

    for file in files {
        let path = &file.path;
        let data = match std::fs::read_to_string(path) {
            Ok(d) => d,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "corpus file unreadable, skipping");
                summary.files_skipped += 1;
                continue;
            }
        };
        let records = match serde_json::from_str::<Value>(&data) {
            Ok(Value::Array(records)) => records,
            Ok(_) => {
                warn!(path = %path.display(), "corpus file is not a JSON array, skipping");
                summary.files_skipped += 1;
                continue;
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "corpus file is not valid JSON, skipping");
                summary.files_skipped += 1;
                continue;
            }
        };

        summary.files_read += 1;
        let before = entries.len();
        for record in records {
            match RawSessionPayload::from_value(record) {
                Ok(payload) => entries.push(CorpusEntry {
                    payload,
                    label: file.label,
                }),
                Err(_) => summary.skipped_records += 1,
            }
        }
        info!(path = %path.display(), label = %file.label, sessions = entries.len() - before, "corpus file loaded");
    }

    summary.sessions = entries.len();
    (entries, summary)
}
