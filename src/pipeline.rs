//! Vision loop: frame → face lock → classifier → meter/smoother → snapshot.

use crate::capture::{crop, Frame, FrameSource};
use crate::classifier::Classifier;
use crate::constants::{DEFAULT_ANALYZE_EVERY_N_FRAMES, DEFAULT_MIN_CROP_SIDE, FRAME_RETRY_MS};
use crate::emotion::Mood;
use crate::face_lock::{BoundingBox, FaceLockTracker};
use crate::heart_meter::SharedMeter;
use crate::smoother::MajoritySmoother;
use crate::status::{epoch_seconds, FrameObservation, SharedStatus};
use log::{debug, info, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

/// Per-frame processing state owned by the vision thread
pub struct VisionPipeline {
    face_lock: FaceLockTracker,
    classifier: Box<dyn Classifier>,
    meter: SharedMeter,
    smoother: MajoritySmoother,
    status: SharedStatus,
    analyze_every_n: u64,
    min_crop_side: u32,
    frame_index: u64,
}

impl VisionPipeline {
    pub fn new(
        face_lock: FaceLockTracker,
        classifier: Box<dyn Classifier>,
        meter: SharedMeter,
        smoother: MajoritySmoother,
        status: SharedStatus,
    ) -> Self {
        Self {
            face_lock,
            classifier,
            meter,
            smoother,
            status,
            analyze_every_n: u64::from(DEFAULT_ANALYZE_EVERY_N_FRAMES),
            min_crop_side: DEFAULT_MIN_CROP_SIDE,
            frame_index: 0,
        }
    }

    /// Classify every `n`th frame (at least every frame)
    #[must_use]
    pub fn with_analyze_every(mut self, n: u32) -> Self {
        self.analyze_every_n = u64::from(n.max(1));
        self
    }

    /// Skip crops smaller than `side` on either axis
    #[must_use]
    pub fn with_min_crop_side(mut self, side: u32) -> Self {
        self.min_crop_side = side;
        self
    }

    /// Current stabilized label
    #[must_use]
    pub fn mood(&self) -> Mood {
        self.smoother.label()
    }

    /// Run one frame through the pipeline.
    ///
    /// The face lock and both windows advance on every frame; only every
    /// Nth frame is classified and published. Returns whether this frame
    /// was analyzed.
    pub fn process_frame(&mut self, frame: &Frame, now: Instant, now_epoch: i64) -> bool {
        self.frame_index += 1;

        let region = self.face_lock.update(frame);
        self.meter.lock().tick(now);
        self.smoother.tick(now);

        if self.frame_index % self.analyze_every_n != 0 {
            return false;
        }

        let observation = match region.filter(|bbox| self.usable(*bbox)) {
            Some(bbox) => self.analyze(frame, bbox, now),
            None => FrameObservation {
                present: false,
                emotion: self.smoother.label(),
                confidence: None,
                embedding: None,
            },
        };

        self.status.publish(observation, now_epoch);
        true
    }

    /// Crops below `min_crop_side` squared pixels are too small to classify
    fn usable(&self, bbox: BoundingBox) -> bool {
        let min_side = i64::from(self.min_crop_side);
        bbox.area() >= min_side * min_side
    }

    fn analyze(&mut self, frame: &Frame, bbox: BoundingBox, now: Instant) -> FrameObservation {
        let face = crop(frame, bbox);

        match self.classifier.analyze(&face) {
            Ok(analysis) if analysis.present => {
                self.meter.lock().record(&analysis.label, now);
                self.smoother.record(&analysis.label, now);
                debug!("Frame {}: {} ({:.2})", self.frame_index, analysis.label, analysis.confidence);

                FrameObservation {
                    present: true,
                    emotion: self.smoother.label(),
                    confidence: Some(analysis.confidence),
                    embedding: analysis.embedding,
                }
            }
            Ok(analysis) => FrameObservation {
                present: false,
                emotion: self.smoother.label(),
                confidence: Some(analysis.confidence),
                embedding: None,
            },
            Err(e) => {
                warn!("Classifier {} failed: {e}", self.classifier.name());
                FrameObservation {
                    present: true,
                    emotion: self.smoother.label(),
                    confidence: None,
                    embedding: None,
                }
            }
        }
    }

    /// Read and process frames until `stop` is set
    pub fn run(mut self, source: &mut dyn FrameSource, stop: &AtomicBool) {
        info!("Vision loop started with {} classifier", self.classifier.name());
        let retry = Duration::from_millis(FRAME_RETRY_MS);

        while !stop.load(Ordering::Relaxed) {
            match source.read() {
                Ok(Some(frame)) => {
                    self.process_frame(&frame, Instant::now(), epoch_seconds());
                }
                Ok(None) => thread::sleep(retry),
                Err(e) => {
                    debug!("Frame read failed: {e}");
                    thread::sleep(retry);
                }
            }
        }

        self.face_lock.release();
        info!("Vision loop stopped");
    }
}
