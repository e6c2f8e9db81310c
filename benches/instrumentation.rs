use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::sync::Arc;

use sentence_rs::models::SentenceRequest;
use sentence_rs::observability::{CapturedStatus, Metrics, OperationTracer};

fn bench_metrics(c: &mut Criterion) {
    let metrics = Arc::new(Metrics::new().expect("Failed to create metrics"));

    c.bench_function("record_request", |b| {
        b.iter(|| {
            metrics.record_request(black_box("POST"), black_box("/api/v1/sentence"), 200);
        })
    });

    c.bench_function("observe_route", |b| {
        b.iter(|| {
            metrics
                .observe_route("GET", "/api/v1/fail")
                .finish(black_box(500));
        })
    });

    c.bench_function("encode_metrics", |b| {
        b.iter(|| black_box(metrics.encode().expect("Failed to encode")))
    });
}

fn bench_request_path(c: &mut Criterion) {
    let body = br#"{"text":"Hello, world!"}"#;

    c.bench_function("build_sentence", |b| {
        b.iter(|| {
            SentenceRequest::from_body(black_box(body))
                .and_then(SentenceRequest::into_sentence)
                .expect("valid input")
        })
    });

    let tracer = OperationTracer::noop();
    c.bench_function("noop_operation_span", |b| {
        b.iter(|| {
            let span = tracer.start(black_box("RandomDelay"));
            span.end();
        })
    });

    c.bench_function("captured_status", |b| {
        b.iter(|| {
            let captured = CapturedStatus::new();
            captured.record(black_box(axum::http::StatusCode::OK));
            captured.status()
        })
    });
}

criterion_group!(benches, bench_metrics, bench_request_path);
criterion_main!(benches);
