//! Frame acquisition and the detector/tracker backends.
//!
//! Frames travel through the crate as 8-bit RGB images; backends convert
//! their native buffers at the boundary.

#[cfg(feature = "opencv")]
pub mod opencv_backend;

use crate::config::{CameraConfig, TrackerConfig};
use crate::face_lock::{BoundingBox, Detector, Tracker};
use crate::Result;
use image::RgbImage;

/// A captured frame
pub type Frame = RgbImage;

/// Blocking source of frames
pub trait FrameSource: Send {
    /// Read the next frame; `Ok(None)` means no frame was available this time
    fn read(&mut self) -> Result<Option<Frame>>;
}

/// Tracker constructor handed to the face lock
pub type TrackerFactory = Box<dyn FnMut() -> Box<dyn Tracker> + Send>;

/// Camera, detector and tracker factory for one vision pipeline
pub struct CaptureBackend {
    pub source: Box<dyn FrameSource>,
    pub detector: Box<dyn Detector>,
    pub tracker_factory: TrackerFactory,
}

/// Copy the `bbox` region out of `frame`; `bbox` must already be clamped
#[must_use]
pub fn crop(frame: &Frame, bbox: BoundingBox) -> Frame {
    let x = u32::try_from(bbox.x).unwrap_or(0);
    let y = u32::try_from(bbox.y).unwrap_or(0);
    let width = u32::try_from(bbox.width).unwrap_or(0);
    let height = u32::try_from(bbox.height).unwrap_or(0);
    image::imageops::crop_imm(frame, x, y, width, height).to_image()
}

/// Open the camera and build the detector and tracker for it
///
/// # Errors
///
/// Returns an error if the camera or the cascade cannot be opened.
#[cfg(feature = "opencv")]
pub fn open_backend(camera: &CameraConfig, tracker: &TrackerConfig) -> Result<CaptureBackend> {
    let source = opencv_backend::OpenCvCamera::open(camera)?;
    let detector = opencv_backend::HaarDetector::new(&tracker.cascade_path, camera.min_face_side)?;
    let kind = tracker.kind;

    Ok(CaptureBackend {
        source: Box::new(source),
        detector: Box::new(detector),
        tracker_factory: Box::new(move || Box::new(opencv_backend::CvTracker::new(kind)) as Box<dyn Tracker>),
    })
}

/// Open the camera and build the detector and tracker for it
///
/// # Errors
///
/// Always fails: this build has no capture backend.
#[cfg(not(feature = "opencv"))]
pub fn open_backend(camera: &CameraConfig, _tracker: &TrackerConfig) -> Result<CaptureBackend> {
    Err(crate::Error::Unsupported(format!(
        "camera {} unavailable: built without the `opencv` feature",
        camera.index
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_crop_region() {
        let mut frame = Frame::new(10, 10);
        frame.put_pixel(3, 4, Rgb([9, 8, 7]));

        let face = crop(&frame, BoundingBox::new(3, 4, 2, 5));
        assert_eq!(face.dimensions(), (2, 5));
        assert_eq!(face.get_pixel(0, 0), &Rgb([9, 8, 7]));
    }
}
