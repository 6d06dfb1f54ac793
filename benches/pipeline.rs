//! Pipeline benchmark: raw payload → parse → feature extraction.

use clickguard::config::FeaturesConfig;
use clickguard::features::{extract, FeatureExtractor};
use clickguard::telemetry::{parse, RawSessionPayload};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use serde_json::json;

fn make_payload(samples: usize, structured: bool) -> RawSessionPayload {
    let (coords, times) = if structured {
        (
            json!((0..samples).map(|i| [i * 3, i * 4]).collect::<Vec<_>>()),
            json!((0..samples).map(|i| i * 16).collect::<Vec<_>>()),
        )
    } else {
        let coords: String = (0..samples).map(|i| format!("m({},{})", i * 3, i * 4)).collect();
        let times: Vec<String> = (0..samples).map(|i| (i * 16).to_string()).collect();
        (json!(coords), json!(format!("[{}]", times.join(","))))
    };
    RawSessionPayload::from_value(json!({
        "session_id": "bench",
        "mousemove_total_behaviour": coords,
        "mousemove_times": times,
        "total_behaviour": "c(l)m(1,1)c(r)".repeat(samples / 10 + 1),
    }))
    .unwrap()
}

fn bench_parse(c: &mut Criterion) {
    let mut g = c.benchmark_group("parse_500_samples");
    for (name, structured) in [("token_grammar", false), ("structured", true)] {
        let payload = make_payload(500, structured);
        g.bench_function(name, |b| b.iter(|| black_box(parse(black_box(&payload)))));
    }
    g.finish();
}

fn bench_feature_extraction(c: &mut Criterion) {
    let session = parse(&make_payload(500, false));
    let extractor = FeatureExtractor::new(FeaturesConfig::default());

    c.bench_function("extract_base_500", |b| b.iter(|| black_box(extract(black_box(&session)))));
    c.bench_function("extract_kinematics_500", |b| {
        b.iter(|| black_box(extractor.extract_kinematics(black_box(&session))))
    });
}

fn bench_full_pipeline(c: &mut Criterion) {
    let payload = make_payload(500, false);
    c.bench_function("full_pipeline_payload_to_features", |b| {
        b.iter(|| black_box(extract(&parse(black_box(&payload)))))
    });
}

criterion_group!(benches, bench_parse, bench_feature_extraction, bench_full_pipeline);
criterion_main!(benches);
