//! Scripted collaborators for integration tests

#![allow(dead_code)]

use mood_meter::capture::{Frame, FrameSource};
use mood_meter::classifier::{Analysis, Classifier};
use mood_meter::display::{Display, DisplayContent, ProgressLevel};
use mood_meter::face_lock::{BoundingBox, Detector, Tracker};
use mood_meter::{Error, Result};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

/// Blank frame of the given size
pub fn blank_frame(width: u32, height: u32) -> Frame {
    Frame::new(width, height)
}

/// Detector that replays one candidate list per call, then reports nothing
#[derive(Default)]
pub struct ScriptedDetector {
    script: VecDeque<Vec<BoundingBox>>,
}

impl ScriptedDetector {
    pub fn new(script: Vec<Vec<BoundingBox>>) -> Self {
        Self { script: script.into() }
    }

    /// Detector that returns the same candidates forever
    pub fn always(faces: Vec<BoundingBox>) -> RepeatingDetector {
        RepeatingDetector(faces)
    }
}

impl Detector for ScriptedDetector {
    fn detect(&mut self, _frame: &Frame) -> Result<Vec<BoundingBox>> {
        Ok(self.script.pop_front().unwrap_or_default())
    }
}

pub struct RepeatingDetector(pub Vec<BoundingBox>);

impl Detector for RepeatingDetector {
    fn detect(&mut self, _frame: &Frame) -> Result<Vec<BoundingBox>> {
        Ok(self.0.clone())
    }
}

/// Outcome of one scripted tracker update
#[derive(Debug, Clone, Copy)]
pub enum Step {
    Found(BoundingBox),
    Lost,
    Fail,
}

/// Tracker that replays steps; once the script runs out it keeps losing
pub struct ScriptedTracker {
    steps: VecDeque<Step>,
    inits: Arc<Mutex<Vec<BoundingBox>>>,
}

impl ScriptedTracker {
    pub fn new(steps: Vec<Step>, inits: Arc<Mutex<Vec<BoundingBox>>>) -> Self {
        Self {
            steps: steps.into(),
            inits,
        }
    }
}

impl Tracker for ScriptedTracker {
    fn init(&mut self, _frame: &Frame, bbox: BoundingBox) -> Result<()> {
        self.inits.lock().push(bbox);
        Ok(())
    }

    fn update(&mut self, _frame: &Frame) -> Result<Option<BoundingBox>> {
        match self.steps.pop_front().unwrap_or(Step::Lost) {
            Step::Found(bbox) => Ok(Some(bbox)),
            Step::Lost => Ok(None),
            Step::Fail => Err(Error::Tracker("scripted failure".to_string())),
        }
    }
}

/// Classifier that replays labels; `None` entries fail the call
pub struct ScriptedClassifier {
    labels: VecDeque<Option<&'static str>>,
    pub calls: Arc<Mutex<usize>>,
}

impl ScriptedClassifier {
    pub fn new(labels: Vec<Option<&'static str>>) -> Self {
        Self {
            labels: labels.into(),
            calls: Arc::default(),
        }
    }
}

impl Classifier for ScriptedClassifier {
    fn analyze(&mut self, _face: &Frame) -> Result<Analysis> {
        *self.calls.lock() += 1;
        match self.labels.pop_front().flatten() {
            Some(label) => Ok(Analysis {
                present: true,
                label: label.to_string(),
                confidence: 0.75,
                embedding: Some(vec![0.6, 0.8]),
            }),
            None => Err(Error::Classifier("scripted failure".to_string())),
        }
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// Frame source that yields a fixed number of frames, then nothing
pub struct CountingSource {
    remaining: usize,
    width: u32,
    height: u32,
}

impl CountingSource {
    pub fn new(frames: usize, width: u32, height: u32) -> Self {
        Self {
            remaining: frames,
            width,
            height,
        }
    }
}

impl FrameSource for CountingSource {
    fn read(&mut self) -> Result<Option<Frame>> {
        if self.remaining == 0 {
            return Ok(None);
        }
        self.remaining -= 1;
        Ok(Some(blank_frame(self.width, self.height)))
    }
}

/// Display that records every draw call; progress draws fail for `missing` levels
#[derive(Clone, Default)]
pub struct RecordingDisplay {
    pub calls: Arc<Mutex<Vec<DisplayContent>>>,
    pub missing: Vec<ProgressLevel>,
}

impl RecordingDisplay {
    pub fn calls(&self) -> Vec<DisplayContent> {
        self.calls.lock().clone()
    }
}

impl Display for RecordingDisplay {
    fn render_text(&mut self, text: &str) {
        self.calls.lock().push(DisplayContent::Text(text.to_string()));
    }

    fn render_progress(&mut self, level: ProgressLevel) -> bool {
        if self.missing.contains(&level) {
            return false;
        }
        self.calls.lock().push(DisplayContent::Progress(level));
        true
    }
}
