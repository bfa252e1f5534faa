//! Face lock tracking.
//!
//! Full-frame detection is expensive and jittery, so once a face is found a
//! lightweight tracker follows it from frame to frame. Detection only runs
//! again after the tracker has failed `lost_limit` times in a row.

use crate::capture::Frame;
use crate::constants::DEFAULT_LOST_LIMIT;
use crate::Result;
use log::{debug, info};

/// Axis-aligned integer rectangle in frame pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BoundingBox {
    /// Left edge
    pub x: i32,
    /// Top edge
    pub y: i32,
    /// Width in pixels
    pub width: i32,
    /// Height in pixels
    pub height: i32,
}

impl BoundingBox {
    #[must_use]
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self { x, y, width, height }
    }

    /// Area in pixels; zero for degenerate boxes
    #[must_use]
    pub fn area(&self) -> i64 {
        i64::from(self.width.max(0)) * i64::from(self.height.max(0))
    }

    /// Intersect with a `frame_width` x `frame_height` frame.
    ///
    /// Returns `None` when nothing of the box lies inside the frame.
    #[must_use]
    pub fn clamp_to_frame(&self, frame_width: u32, frame_height: u32) -> Option<Self> {
        let max_x = i64::from(frame_width);
        let max_y = i64::from(frame_height);

        let x1 = i64::from(self.x).clamp(0, max_x);
        let y1 = i64::from(self.y).clamp(0, max_y);
        let x2 = (i64::from(self.x) + i64::from(self.width)).clamp(0, max_x);
        let y2 = (i64::from(self.y) + i64::from(self.height)).clamp(0, max_y);

        if x2 <= x1 || y2 <= y1 {
            return None;
        }

        // Bounded by frame dimensions, which come from u32 images well below i32::MAX
        Some(Self {
            x: i32::try_from(x1).ok()?,
            y: i32::try_from(y1).ok()?,
            width: i32::try_from(x2 - x1).ok()?,
            height: i32::try_from(y2 - y1).ok()?,
        })
    }
}

/// Lock state of the face tracker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrackState {
    /// Running full-frame detection every frame
    #[default]
    Searching,
    /// Following a single face with the frame tracker
    Locked,
}

/// Full-frame face detector
pub trait Detector: Send {
    /// Detect face candidates, in detector order
    fn detect(&mut self, frame: &Frame) -> Result<Vec<BoundingBox>>;
}

/// Single-target frame-to-frame tracker
pub trait Tracker: Send {
    /// Start tracking `bbox` from `frame`
    fn init(&mut self, frame: &Frame, bbox: BoundingBox) -> Result<()>;

    /// Estimate the target position in `frame`; `Ok(None)` means the target was lost on this frame
    fn update(&mut self, frame: &Frame) -> Result<Option<BoundingBox>>;
}

/// Pick the candidate with the largest area; ties go to the earliest candidate
#[must_use]
pub fn pick_main_face(candidates: &[BoundingBox]) -> Option<BoundingBox> {
    candidates.iter().fold(None, |best: Option<BoundingBox>, candidate| match best {
        Some(current) if current.area() >= candidate.area() => Some(current),
        _ => Some(*candidate),
    })
}

/// Two-state lock on the main face in view
pub struct FaceLockTracker {
    detector: Box<dyn Detector>,
    tracker_factory: Box<dyn FnMut() -> Box<dyn Tracker> + Send>,
    tracker: Option<Box<dyn Tracker>>,
    state: TrackState,
    lost_frames: u32,
    lost_limit: u32,
}

impl FaceLockTracker {
    /// Create a tracker using the default loss limit.
    ///
    /// `tracker_factory` builds a fresh tracker for every new lock.
    pub fn new<F>(detector: Box<dyn Detector>, tracker_factory: F) -> Self
    where
        F: FnMut() -> Box<dyn Tracker> + Send + 'static,
    {
        Self::with_lost_limit(detector, tracker_factory, DEFAULT_LOST_LIMIT)
    }

    /// Create a tracker that drops its lock after `lost_limit` consecutive failures
    pub fn with_lost_limit<F>(detector: Box<dyn Detector>, tracker_factory: F, lost_limit: u32) -> Self
    where
        F: FnMut() -> Box<dyn Tracker> + Send + 'static,
    {
        Self {
            detector,
            tracker_factory: Box::new(tracker_factory),
            tracker: None,
            state: TrackState::Searching,
            lost_frames: 0,
            lost_limit: lost_limit.max(1),
        }
    }

    #[must_use]
    pub fn state(&self) -> TrackState {
        self.state
    }

    /// Consecutive tracker failures since the last success
    #[must_use]
    pub fn lost_frames(&self) -> u32 {
        self.lost_frames
    }

    /// Advance one frame and report the region to analyze, if any.
    ///
    /// Detector errors are treated as "no candidates" for the frame; the
    /// returned box always lies inside the frame and has positive area.
    pub fn update(&mut self, frame: &Frame) -> Option<BoundingBox> {
        match self.state {
            TrackState::Locked => self.follow(frame),
            TrackState::Searching => self.acquire(frame),
        }
    }

    fn follow(&mut self, frame: &Frame) -> Option<BoundingBox> {
        let (frame_width, frame_height) = frame.dimensions();
        let outcome = match self.tracker.as_mut() {
            Some(tracker) => tracker.update(frame),
            None => Ok(None),
        };

        // A box with no area inside the frame counts as a miss
        match outcome.map(|found| found.and_then(|bbox| bbox.clamp_to_frame(frame_width, frame_height))) {
            Ok(Some(bbox)) => {
                self.lost_frames = 0;
                Some(bbox)
            }
            Ok(None) => {
                self.record_failure();
                None
            }
            Err(e) => {
                debug!("Tracker update failed: {e}");
                self.record_failure();
                None
            }
        }
    }

    fn record_failure(&mut self) {
        self.lost_frames += 1;
        if self.lost_frames >= self.lost_limit {
            info!("Face lock lost after {} failed frames", self.lost_frames);
            self.release();
        }
    }

    fn acquire(&mut self, frame: &Frame) -> Option<BoundingBox> {
        let candidates = match self.detector.detect(frame) {
            Ok(candidates) => candidates,
            Err(e) => {
                debug!("Face detection failed: {e}");
                return None;
            }
        };

        let (frame_width, frame_height) = frame.dimensions();
        let visible: Vec<BoundingBox> = candidates
            .iter()
            .filter_map(|bbox| bbox.clamp_to_frame(frame_width, frame_height))
            .collect();
        let main_face = pick_main_face(&visible)?;
        let mut tracker = (self.tracker_factory)();
        if let Err(e) = tracker.init(frame, main_face) {
            debug!("Tracker init failed, staying in search: {e}");
            return None;
        }

        info!(
            "Face locked at ({}, {}) {}x{} out of {} candidate(s)",
            main_face.x,
            main_face.y,
            main_face.width,
            main_face.height,
            candidates.len()
        );
        self.tracker = Some(tracker);
        self.state = TrackState::Locked;
        self.lost_frames = 0;
        Some(main_face)
    }

    /// Drop the current lock and go back to searching
    pub fn release(&mut self) {
        self.tracker = None;
        self.state = TrackState::Searching;
        self.lost_frames = 0;
    }
}
