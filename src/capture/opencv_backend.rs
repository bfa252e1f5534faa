//! OpenCV capture backend: V4L camera, Haar cascade detector and CSRT/KCF tracker.

use super::{Frame, FrameSource};
use crate::config::{CameraConfig, TrackerKind};
use crate::face_lock::{BoundingBox, Detector, Tracker};
use crate::utils::image_conversion::{frame_to_mat, mat_to_frame};
use crate::utils::safe_cast::{f64_to_i32_clamp, u32_to_i32};
use crate::{Error, Result};
use log::{info, warn};
use opencv::core::{Mat, Ptr, Rect, Size, Vector};
use opencv::prelude::*;
use opencv::{imgproc, objdetect, tracking, videoio};
use std::path::Path;

/// Webcam opened through `VideoCapture`
pub struct OpenCvCamera {
    capture: videoio::VideoCapture,
    buffer: Mat,
}

impl OpenCvCamera {
    /// Open camera `config.index` at the configured resolution
    ///
    /// # Errors
    ///
    /// Returns `Error::Camera` if the device cannot be opened.
    pub fn open(config: &CameraConfig) -> Result<Self> {
        info!("Opening camera {}", config.index);
        let mut capture = videoio::VideoCapture::new(config.index, videoio::CAP_ANY)?;
        if !capture.is_opened()? {
            return Err(Error::Camera(format!("Could not open camera {}", config.index)));
        }

        capture.set(videoio::CAP_PROP_FRAME_WIDTH, f64::from(config.frame_width))?;
        capture.set(videoio::CAP_PROP_FRAME_HEIGHT, f64::from(config.frame_height))?;
        // Keep latency low; not every driver honours it
        capture.set(videoio::CAP_PROP_BUFFERSIZE, 1.0)?;

        let width = f64_to_i32_clamp(capture.get(videoio::CAP_PROP_FRAME_WIDTH)?, 0, i32::MAX);
        let height = f64_to_i32_clamp(capture.get(videoio::CAP_PROP_FRAME_HEIGHT)?, 0, i32::MAX);
        info!("Camera {} delivering {}x{}", config.index, width, height);

        Ok(Self {
            capture,
            buffer: Mat::default(),
        })
    }
}

impl FrameSource for OpenCvCamera {
    fn read(&mut self) -> Result<Option<Frame>> {
        if !self.capture.read(&mut self.buffer)? || self.buffer.empty() {
            return Ok(None);
        }
        mat_to_frame(&self.buffer).map(Some)
    }
}

impl Drop for OpenCvCamera {
    fn drop(&mut self) {
        if let Err(e) = self.capture.release() {
            warn!("Camera release failed: {e}");
        }
    }
}

/// Frontal-face Haar cascade
pub struct HaarDetector {
    cascade: objdetect::CascadeClassifier,
    min_size: Size,
}

impl HaarDetector {
    /// Load the cascade XML at `cascade_path`
    ///
    /// # Errors
    ///
    /// Returns `Error::Detector` if the cascade cannot be loaded.
    pub fn new<P: AsRef<Path>>(cascade_path: P, min_face_side: u32) -> Result<Self> {
        let path = cascade_path.as_ref();
        let path_str = path
            .to_str()
            .ok_or_else(|| Error::Detector(format!("Non UTF-8 cascade path: {}", path.display())))?;

        let cascade = objdetect::CascadeClassifier::new(path_str)?;
        if cascade.empty()? {
            return Err(Error::Detector(format!("Failed to load cascade: {}", path.display())));
        }

        let side = u32_to_i32(min_face_side)?;
        Ok(Self {
            cascade,
            min_size: Size::new(side, side),
        })
    }
}

impl Detector for HaarDetector {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<BoundingBox>> {
        let bgr = frame_to_mat(frame)?;
        let mut gray = Mat::default();
        imgproc::cvt_color(&bgr, &mut gray, imgproc::COLOR_BGR2GRAY, 0)?;

        let mut faces = Vector::<Rect>::new();
        self.cascade
            .detect_multi_scale(&gray, &mut faces, 1.1, 5, 0, self.min_size, Size::new(0, 0))?;

        Ok(faces
            .iter()
            .map(|r| BoundingBox::new(r.x, r.y, r.width, r.height))
            .collect())
    }
}

enum CvTrackerImpl {
    Csrt(Ptr<tracking::TrackerCSRT>),
    Kcf(Ptr<tracking::TrackerKCF>),
}

/// Single-target tracker; falls back to KCF when CSRT cannot be created
pub struct CvTracker {
    preferred: TrackerKind,
    inner: Option<CvTrackerImpl>,
}

impl CvTracker {
    #[must_use]
    pub fn new(preferred: TrackerKind) -> Self {
        Self { preferred, inner: None }
    }

    fn create(kind: TrackerKind) -> Result<CvTrackerImpl> {
        Ok(match kind {
            TrackerKind::Csrt => CvTrackerImpl::Csrt(tracking::TrackerCSRT::create(&tracking::TrackerCSRT_Params::default()?)?),
            TrackerKind::Kcf => CvTrackerImpl::Kcf(tracking::TrackerKCF::create(tracking::TrackerKCF_Params::default()?)?),
        })
    }
}

impl Tracker for CvTracker {
    fn init(&mut self, frame: &Frame, bbox: BoundingBox) -> Result<()> {
        let mut inner = match Self::create(self.preferred) {
            Ok(inner) => inner,
            Err(e) => {
                let fallback = match self.preferred {
                    TrackerKind::Csrt => TrackerKind::Kcf,
                    TrackerKind::Kcf => TrackerKind::Csrt,
                };
                warn!("{:?} tracker unavailable ({e}), trying {:?}", self.preferred, fallback);
                Self::create(fallback).map_err(|e| Error::Tracker(format!("No tracker available: {e}")))?
            }
        };

        let mat = frame_to_mat(frame)?;
        let rect = Rect::new(bbox.x, bbox.y, bbox.width, bbox.height);
        match &mut inner {
            CvTrackerImpl::Csrt(t) => t.init(&mat, rect)?,
            CvTrackerImpl::Kcf(t) => t.init(&mat, rect)?,
        }

        self.inner = Some(inner);
        Ok(())
    }

    fn update(&mut self, frame: &Frame) -> Result<Option<BoundingBox>> {
        let Some(inner) = self.inner.as_mut() else {
            return Err(Error::Tracker("Tracker used before init".to_string()));
        };

        let mat = frame_to_mat(frame)?;
        let mut rect = Rect::default();
        let ok = match inner {
            CvTrackerImpl::Csrt(t) => t.update(&mat, &mut rect)?,
            CvTrackerImpl::Kcf(t) => t.update(&mat, &mut rect)?,
        };

        Ok(ok.then(|| BoundingBox::new(rect.x, rect.y, rect.width, rect.height)))
    }
}
