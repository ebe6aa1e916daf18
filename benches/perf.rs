use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;

use prop_picks::matcher::{match_records, MatchingConfig};
use prop_picks::models::{LineRecord, ProjectionRecord};
use prop_picks::normalize::{normalize_payload, parse_payload_json};
use prop_picks::pipeline::run_pipeline;
use prop_picks::recommend::Thresholds;

static PAYLOAD_JSON: &str = include_str!("../tests/fixtures/underdog_payload.json");

fn synthetic_lines(count: usize) -> Vec<LineRecord> {
    (0..count)
        .map(|idx| LineRecord {
            player_name: format!("Player Mc'Name-{idx} Jr."),
            team: Some("CIN".to_string()),
            pos: Some("RB".to_string()),
            stat_category: "rushing_yards".to_string(),
            line_value: 40.0 + (idx % 60) as f64,
            source: "underdog".to_string(),
        })
        .collect()
}

fn synthetic_projections(count: usize) -> Vec<ProjectionRecord> {
    (0..count)
        .map(|idx| ProjectionRecord {
            player_name: format!("player mcname-{idx} jr"),
            team: Some("CIN".to_string()),
            pos: Some("RB".to_string()),
            stat_category: "rushing_yards".to_string(),
            projected_value: 50.0 + (idx % 55) as f64,
        })
        .collect()
}

fn bench_payload_normalize(c: &mut Criterion) {
    c.bench_function("payload_normalize", |b| {
        b.iter(|| {
            let payload = parse_payload_json(black_box(PAYLOAD_JSON)).unwrap();
            let out = normalize_payload(&payload, black_box("NFL")).unwrap();
            black_box(out.lines.len());
        })
    });
}

fn bench_match_records(c: &mut Criterion) {
    let projections = synthetic_projections(500);
    let lines = synthetic_lines(500);
    let cfg = MatchingConfig::default();
    c.bench_function("match_records_500", |b| {
        b.iter(|| {
            let out = match_records(
                black_box(&projections),
                black_box(&lines),
                "rushing_yards",
                &cfg,
            );
            black_box(out.pairs.len());
        })
    });
}

fn bench_full_pipeline(c: &mut Criterion) {
    let projections = synthetic_projections(500);
    let lines = synthetic_lines(500);
    let cfg = MatchingConfig::default();
    let thresholds = Thresholds::default();
    c.bench_function("pipeline_500", |b| {
        b.iter(|| {
            let report = run_pipeline(
                black_box(&projections),
                black_box(&lines),
                "rushing_yards",
                &cfg,
                &thresholds,
            );
            black_box(report.recommendations.len());
        })
    });
}

criterion_group!(
    perf,
    bench_payload_normalize,
    bench_match_records,
    bench_full_pipeline
);
criterion_main!(perf);
