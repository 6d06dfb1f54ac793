//! Parallel map of parse + strict extraction over labeled entries.

use super::CorpusEntry;
use crate::config::FeaturesConfig;
use crate::features::{FeatureExtractor, KinematicFeatures};
use crate::gate::Label;
use crate::telemetry::parse_with_report;
use std::ops::AddAssign;
use tracing::info;

#[derive(Debug, Clone, PartialEq)]
pub struct TrainingRow {
    pub features: KinematicFeatures,
    pub label: Label,
}

/// Counts only; which sessions were dropped is not tracked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildSummary {
    pub processed: usize,
    pub kept: usize,
    /// Too few aligned samples
    pub dropped: usize,
    pub malformed_subfields: usize,
}

impl AddAssign for BuildSummary {
    fn add_assign(&mut self, rhs: Self) {
        self.processed += rhs.processed;
        self.kept += rhs.kept;
        self.dropped += rhs.dropped;
        self.malformed_subfields += rhs.malformed_subfields;
    }
}

#[derive(Debug, Clone, Default)]
pub struct TrainingTable {
    pub rows: Vec<TrainingRow>,
    pub summary: BuildSummary,
}

pub struct CorpusBuilder {
    extractor: FeatureExtractor,
    workers: usize,
}

impl CorpusBuilder {
    pub fn new(config: FeaturesConfig, workers: usize) -> Self {
        Self {
            extractor: FeatureExtractor::new(config),
            workers: workers.max(1),
        }
    }

    /// Entries are independent; chunks run on scoped threads with no shared
    /// mutable state. Row order follows chunk order but is not a contract.
    pub fn build(&self, entries: &[CorpusEntry]) -> TrainingTable {
        let mut table = TrainingTable::default();
        if entries.is_empty() {
            return table;
        }
        let chunk_size = entries.len().div_ceil(self.workers.min(entries.len()));
        let extractor = &self.extractor;

        let parts: Vec<(Vec<TrainingRow>, BuildSummary)> = std::thread::scope(|s| {
            let handles: Vec<_> = entries
                .chunks(chunk_size)
                .map(|chunk| s.spawn(move || build_chunk(extractor, chunk)))
                .collect();
            handles
                .into_iter()
                .map(|h| h.join().unwrap_or_else(|panic| std::panic::resume_unwind(panic)))
                .collect()
        });

        for (rows, summary) in parts {
            table.rows.extend(rows);
            table.summary += summary;
        }
        info!(
            processed = table.summary.processed,
            kept = table.summary.kept,
            dropped = table.summary.dropped,
            malformed_subfields = table.summary.malformed_subfields,
            "corpus built"
        );
        table
    }
}

fn build_chunk(extractor: &FeatureExtractor, chunk: &[CorpusEntry]) -> (Vec<TrainingRow>, BuildSummary) {
    let mut rows = Vec::with_capacity(chunk.len());
    let mut summary = BuildSummary::default();
    for entry in chunk {
        summary.processed += 1;
        let (session, report) = parse_with_report(&entry.payload);
        summary.malformed_subfields += report.failures();
        match extractor.extract_kinematics(&session) {
            Ok(features) => {
                summary.kept += 1;
                rows.push(TrainingRow {
                    features,
                    label: entry.label,
                });
            }
            Err(_) => summary.dropped += 1,
        }
    }
    (rows, summary)
}

/// Builds with one worker per available core.
pub fn build(entries: &[CorpusEntry], config: &FeaturesConfig) -> TrainingTable {
    let workers = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    CorpusBuilder::new(config.clone(), workers).build(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::RawSessionPayload;
    use serde_json::json;

    fn entry(id: &str, samples: usize, label: Label) -> CorpusEntry {
        let coords: String = (0..samples).map(|i| format!("m({},{})", i * 3, i * 4)).collect();
        let times: Vec<String> = (0..samples).map(|i| (i * 10).to_string()).collect();
        CorpusEntry {
            payload: RawSessionPayload::from_value(json!({
                "session_id": id,
                "mousemove_total_behaviour": coords,
                "mousemove_times": format!("[{}]", times.join(",")),
                "total_behaviour": "c(l)",
            }))
            .unwrap(),
            label,
        }
    }

    #[test]
    fn sparse_sessions_are_dropped_not_zeroed() {
        let entries = vec![
            entry("a", 6, Label::Human),
            entry("b", 4, Label::Bot),
            entry("c", 5, Label::Bot),
            entry("d", 0, Label::Human),
        ];
        let table = CorpusBuilder::new(FeaturesConfig::default(), 2).build(&entries);
        assert_eq!(table.summary.processed, 4);
        assert_eq!(table.summary.kept, 2);
        assert_eq!(table.summary.dropped, 2);
        let mut ids: Vec<_> = table.rows.iter().map(|r| r.features.base.session_id.as_str()).collect();
        ids.sort();
        assert_eq!(ids, vec!["a", "c"]);
    }

    #[test]
    fn worker_count_does_not_change_rows() {
        let entries: Vec<_> = (0..23)
            .map(|i| entry(&format!("s{i}"), 3 + i % 5, Label::Human))
            .collect();
        let one = CorpusBuilder::new(FeaturesConfig::default(), 1).build(&entries);
        let many = CorpusBuilder::new(FeaturesConfig::default(), 8).build(&entries);
        assert_eq!(one.summary, many.summary);
        assert_eq!(one.rows, many.rows);
    }

    #[test]
    fn empty_corpus() {
        let table = build(&[], &FeaturesConfig::default());
        assert!(table.rows.is_empty());
        assert_eq!(table.summary, BuildSummary::default());
    }
}
