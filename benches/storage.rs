//! Session log benchmark: append and list on the JSON-array log.

use clickguard::gate::{ClassificationResult, Label, Reason};
use clickguard::storage::SessionLog;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use serde_json::json;
use tempfile::tempdir;

fn result(i: usize) -> ClassificationResult {
    ClassificationResult {
        session_id: format!("s{}", i),
        label: Label::Human,
        reason: Reason::ModelInference,
    }
}

fn bench_append(c: &mut Criterion) {
    let dir = tempdir().unwrap();
    let log = SessionLog::new(dir.path().join("click_logs.json"));
    let text = r#"{"session_id":"s","total_behaviour":"c(l)"}"#;
    let details: serde_json::Value = serde_json::from_str(text).unwrap();
    let mut i = 0;

    c.bench_function("session_log_append", |b| {
        b.iter(|| {
            i += 1;
            black_box(log.append(&result(i), text, details.clone())).unwrap()
        })
    });
}

fn bench_list(c: &mut Criterion) {
    let dir = tempdir().unwrap();
    let log = SessionLog::new(dir.path().join("click_logs.json"));
    for i in 0..200 {
        log.append(&result(i), "{}", json!({})).unwrap();
    }

    c.bench_function("session_log_list_200", |b| b.iter(|| black_box(log.list()).unwrap()));
}

criterion_group!(benches, bench_append, bench_list);
criterion_main!(benches);
