//! Benchmarks for Lambda client context encoding and decoding.

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use spanctx::{ClientContextCodec, JaegerSpanContext, TraceId};
use std::collections::HashMap;
use std::hint::black_box;

fn span_context(baggage_items: usize) -> JaegerSpanContext {
    let baggage = (0..baggage_items)
        .map(|i| (format!("key-{i}"), format!("value-{i}")))
        .collect();
    JaegerSpanContext::new(
        TraceId::new(0x5759e988bd862e3f, 0xe1be46a994272793),
        0x53995c3f42cd8ad8,
        0,
        true,
        baggage,
    )
}

fn bench_encode(c: &mut Criterion) {
    let codec = ClientContextCodec::new();
    let mut group = c.benchmark_group("client_context_encode");

    for items in [0, 8, 64] {
        let ctx = span_context(items);
        group.bench_with_input(BenchmarkId::from_parameter(items), &ctx, |b, ctx| {
            b.iter(|| codec.encode(black_box(ctx)))
        });
    }

    group.finish();
}

fn bench_decode(c: &mut Criterion) {
    let codec = ClientContextCodec::new();
    let blob = codec.encode(&span_context(8)).unwrap();
    let custom: HashMap<String, String> = codec.decode_blob(&blob).unwrap();

    c.bench_function("client_context_decode_blob", |b| {
        b.iter(|| codec.decode_blob(black_box(&blob)))
    });
    c.bench_function("client_context_decode_custom", |b| {
        b.iter(|| codec.decode_custom_fields(black_box(&custom)))
    });
}

criterion_group!(benches, bench_encode, bench_decode);
criterion_main!(benches);
