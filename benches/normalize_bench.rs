//! Normalization Benchmarks — Per-Batch Hot Path
//!
//! Every pushed or polled batch runs through the normalization
//! pipeline before subscribers see it. Benchmarks a full page and the
//! oil-filtered variant, plus frame parsing.
//!
//! Run with: cargo bench --bench normalize_bench

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use serde_json::json;

use vessel_feed::domain::backoff::ReconnectPolicy;
use vessel_feed::domain::normalize::normalize;
use vessel_feed::domain::tracking::TrackingConfig;
use vessel_feed::domain::vessel::RawVessel;
use vessel_feed::ports::protocol::InboundMessage;

const TYPES: [&str; 4] = ["Container Ship", "Crude Oil Tanker", "Bulk Carrier", "LNG Carrier"];

/// A page of raw vessels; every tenth one lacks coordinates.
fn batch(size: usize) -> Vec<RawVessel> {
    (0..size)
        .map(|i| {
            let lat = if i % 10 == 0 { json!(null) } else { json!(50.0 + i as f64 * 0.001) };
            RawVessel::new(json!({
                "id": if i % 7 == 0 { json!(null) } else { json!(i) },
                "name": format!("Vessel {i}"),
                "currentLat": lat,
                "currentLng": "4.25",
                "vesselType": TYPES[i % TYPES.len()],
                "currentSpeed": 12.5,
            }))
        })
        .collect()
}

/// Benchmark a full 500-vessel page with no category filter.
fn bench_normalize_all(c: &mut Criterion) {
    let raw = batch(500);
    let config = TrackingConfig::default();

    c.bench_function("normalize_500_all", |b| {
        b.iter(|| normalize(black_box(&raw), black_box(&config)));
    });
}

/// Benchmark the same page with the oil filter active.
fn bench_normalize_oil(c: &mut Criterion) {
    let raw = batch(500);
    let config = TrackingConfig {
        vessel_type: "oil".to_string(),
        ..Default::default()
    };

    c.bench_function("normalize_500_oil", |b| {
        b.iter(|| normalize(black_box(&raw), black_box(&config)));
    });
}

/// Benchmark parsing a pushed vessels frame.
fn bench_parse_frame(c: &mut Criterion) {
    let frame = json!({
        "type": "vessels",
        "totalCount": 500,
        "vessels": batch(500),
    })
    .to_string();

    c.bench_function("parse_vessels_frame_500", |b| {
        b.iter(|| InboundMessage::parse(black_box(&frame)));
    });
}

/// Benchmark reconnect delay computation.
fn bench_backoff(c: &mut Criterion) {
    let policy = ReconnectPolicy::default();

    c.bench_function("reconnect_next_delay", |b| {
        b.iter(|| policy.next_delay(black_box(4)));
    });
}

criterion_group!(
    benches,
    bench_normalize_all,
    bench_normalize_oil,
    bench_parse_frame,
    bench_backoff,
);
criterion_main!(benches);
