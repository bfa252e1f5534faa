//! Conversion between OpenCV `Mat` buffers and RGB frames.

use crate::capture::Frame;
use crate::utils::safe_cast::u32_to_i32;
use crate::{Error, Result};
use opencv::core::{Mat, Scalar, CV_8UC3};
use opencv::imgproc;
use opencv::prelude::*;

/// Convert a BGR (3 channel) or grayscale (1 channel) 8-bit `Mat` into an RGB frame
///
/// # Errors
///
/// Returns an error if the Mat is empty, has an unsupported channel count, or
/// its pixel data cannot be accessed.
pub fn mat_to_frame(mat: &Mat) -> Result<Frame> {
    let rows = mat.rows();
    let cols = mat.cols();
    if rows <= 0 || cols <= 0 {
        return Err(Error::InvalidInput(format!("Invalid Mat dimensions: {rows}x{cols}")));
    }

    let mut rgb = Mat::default();
    match mat.channels() {
        3 => imgproc::cvt_color(mat, &mut rgb, imgproc::COLOR_BGR2RGB, 0)?,
        1 => imgproc::cvt_color(mat, &mut rgb, imgproc::COLOR_GRAY2RGB, 0)?,
        other => return Err(Error::InvalidInput(format!("Unsupported channel count: {other}"))),
    }

    // cvt_color always allocates a continuous output
    let bytes = rgb.data_bytes()?.to_vec();
    let width = u32::try_from(cols).map_err(|_| Error::InvalidInput(format!("Bad width {cols}")))?;
    let height = u32::try_from(rows).map_err(|_| Error::InvalidInput(format!("Bad height {rows}")))?;

    Frame::from_raw(width, height, bytes)
        .ok_or_else(|| Error::InvalidInput("Mat data does not match its dimensions".to_string()))
}

/// Convert an RGB frame into a BGR `Mat` for OpenCV algorithms
///
/// # Errors
///
/// Returns an error if the frame is too large for OpenCV or allocation fails.
pub fn frame_to_mat(frame: &Frame) -> Result<Mat> {
    let (width, height) = frame.dimensions();
    let mut rgb = Mat::new_rows_cols_with_default(u32_to_i32(height)?, u32_to_i32(width)?, CV_8UC3, Scalar::all(0.0))?;
    rgb.data_bytes_mut()?.copy_from_slice(frame.as_raw());

    let mut bgr = Mat::default();
    imgproc::cvt_color(&rgb, &mut bgr, imgproc::COLOR_RGB2BGR, 0)?;
    Ok(bgr)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_frame_mat_roundtrip() {
        let mut frame = Frame::new(4, 3);
        frame.put_pixel(1, 2, Rgb([10, 20, 30]));

        let mat = frame_to_mat(&frame).unwrap();
        assert_eq!((mat.cols(), mat.rows(), mat.channels()), (4, 3, 3));
        // BGR order inside OpenCV
        let pixel = mat.at_2d::<opencv::core::Vec3b>(2, 1).unwrap();
        assert_eq!((pixel[0], pixel[1], pixel[2]), (30, 20, 10));

        assert_eq!(mat_to_frame(&mat).unwrap(), frame);
    }

    #[test]
    fn test_empty_mat_rejected() {
        assert!(mat_to_frame(&Mat::default()).is_err());
    }
}
