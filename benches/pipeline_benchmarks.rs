//! Benchmarks for per-frame vision work outside the camera and model backends

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use mood_meter::capture::{crop, Frame};
use mood_meter::classifier::PresenceClassifier;
use mood_meter::display::preview::wrap_text;
use mood_meter::face_lock::{BoundingBox, Detector, FaceLockTracker, Tracker};
use mood_meter::heart_meter::{HeartMeter, HeartMeterSettings};
use mood_meter::pipeline::VisionPipeline;
use mood_meter::smoother::MajoritySmoother;
use mood_meter::status::SharedStatus;
use mood_meter::Result;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Instant;

struct FixedDetector(BoundingBox);

impl Detector for FixedDetector {
    fn detect(&mut self, _frame: &Frame) -> Result<Vec<BoundingBox>> {
        Ok(vec![self.0])
    }
}

struct DriftTracker(BoundingBox);

impl Tracker for DriftTracker {
    fn init(&mut self, _frame: &Frame, bbox: BoundingBox) -> Result<()> {
        self.0 = bbox;
        Ok(())
    }

    fn update(&mut self, _frame: &Frame) -> Result<Option<BoundingBox>> {
        self.0.x = (self.0.x + 1) % 200;
        Ok(Some(self.0))
    }
}

fn benchmark_process_frame(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline");
    let frame = Frame::new(320, 240);
    let face = BoundingBox::new(60, 40, 120, 120);

    for every_n in [1u32, 3] {
        let start = Instant::now();
        let face_lock = FaceLockTracker::new(Box::new(FixedDetector(face)), move || {
            Box::new(DriftTracker(face)) as Box<dyn Tracker>
        });
        let mut pipeline = VisionPipeline::new(
            face_lock,
            Box::new(PresenceClassifier),
            Arc::new(Mutex::new(HeartMeter::new(HeartMeterSettings::default(), start))),
            MajoritySmoother::new(start),
            SharedStatus::new(),
        )
        .with_analyze_every(every_n);

        group.bench_with_input(BenchmarkId::new("process_frame", every_n), &frame, |b, frame| {
            b.iter(|| black_box(pipeline.process_frame(black_box(frame), Instant::now(), 0)));
        });
    }

    group.finish();
}

fn benchmark_crop(c: &mut Criterion) {
    let mut group = c.benchmark_group("crop");
    let frame = Frame::new(640, 480);

    for side in [48i32, 120, 240] {
        group.bench_with_input(BenchmarkId::new("square", side), &side, |b, &side| {
            b.iter(|| black_box(crop(&frame, BoundingBox::new(10, 10, side, side))));
        });
    }

    group.finish();
}

fn benchmark_wrap_text(c: &mut Criterion) {
    let text = "the companion app sends short notes to show on the panel ".repeat(4);
    c.bench_function("wrap_text_200", |b| {
        b.iter(|| black_box(wrap_text(black_box(&text), 20, 10)));
    });
}

criterion_group!(benches, benchmark_process_frame, benchmark_crop, benchmark_wrap_text);
criterion_main!(benches);
