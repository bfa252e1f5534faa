//! Benchmarks for the windowed label aggregators and wire helpers

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use mood_meter::display::ProgressLevel;
use mood_meter::heart_meter::{HeartMeter, HeartMeterSettings};
use mood_meter::smoother::MajoritySmoother;
use mood_meter::status::{decode_embedding, encode_embedding};
use rand::seq::SliceRandom;
use std::time::{Duration, Instant};

const LABELS: [&str; 7] = ["angry", "disgust", "fear", "happy", "sad", "surprise", "neutral"];

fn random_labels(n: usize) -> Vec<&'static str> {
    let mut rng = rand::thread_rng();
    (0..n).map(|_| *LABELS.choose(&mut rng).unwrap_or(&"neutral")).collect()
}

fn benchmark_meter(c: &mut Criterion) {
    let mut group = c.benchmark_group("heart_meter");

    for samples in [10usize, 50, 150] {
        let labels = random_labels(samples);
        group.bench_with_input(BenchmarkId::new("window", samples), &labels, |b, labels| {
            let start = Instant::now();
            b.iter(|| {
                let mut meter = HeartMeter::new(HeartMeterSettings::default(), start);
                for label in labels {
                    meter.record(black_box(label), start);
                }
                black_box(meter.tick(start + Duration::from_secs(5)))
            });
        });
    }

    group.finish();
}

fn benchmark_smoother(c: &mut Criterion) {
    let mut group = c.benchmark_group("smoother");
    let labels = random_labels(150);

    group.bench_function("window_150", |b| {
        let start = Instant::now();
        b.iter(|| {
            let mut smoother = MajoritySmoother::new(start);
            for label in &labels {
                smoother.record(black_box(label), start);
            }
            black_box(smoother.tick(start + Duration::from_secs(5)))
        });
    });

    group.finish();
}

fn benchmark_wire_helpers(c: &mut Criterion) {
    let mut group = c.benchmark_group("wire");

    let embedding: Vec<f32> = (0..512).map(|_| rand::random::<f32>()).collect();
    let encoded = encode_embedding(&embedding);

    group.bench_function("encode_embedding_512", |b| {
        b.iter(|| black_box(encode_embedding(black_box(&embedding))));
    });
    group.bench_function("decode_embedding_512", |b| {
        b.iter(|| black_box(decode_embedding(black_box(&encoded))));
    });
    group.bench_function("progress_image_id", |b| {
        b.iter(|| black_box(ProgressLevel::from_image_id(black_box("progress_75"))));
    });

    group.finish();
}

criterion_group!(benches, benchmark_meter, benchmark_smoother, benchmark_wire_helpers);
criterion_main!(benches);
