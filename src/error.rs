//! Error types for the mood meter library.

use thiserror::Error;

/// Main error type for the library
#[derive(Error, Debug)]
pub enum Error {
    /// `OpenCV` operation failed
    #[cfg(feature = "opencv")]
    #[error("OpenCV error: {0}")]
    OpenCV(#[from] opencv::Error),

    /// `ONNX` Runtime inference failed
    #[cfg(feature = "onnx")]
    #[error("ONNX Runtime error: {0}")]
    OnnxRuntime(#[from] ort::OrtError),

    /// File I/O operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Image decoding or encoding failed
    #[error("Image processing error: {0}")]
    Image(#[from] image::ImageError),

    /// YAML (de)serialization failed
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Camera could not be opened or stopped delivering frames
    #[error("Camera error: {0}")]
    Camera(String),

    /// Face detector could not be created or failed on a frame
    #[error("Detector error: {0}")]
    Detector(String),

    /// Frame tracker could not be created or initialized
    #[error("Tracker error: {0}")]
    Tracker(String),

    /// Emotion classifier failed on a crop
    #[error("Classifier error: {0}")]
    Classifier(String),

    /// Model loading or output decoding error
    #[error("Model error: {0}")]
    ModelError(String),

    /// Display backend failed to draw
    #[error("Display error: {0}")]
    Display(String),

    /// Invalid input parameters provided
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Backend not compiled into this build
    #[error("Unsupported: {0}")]
    Unsupported(String),
}

/// Convenience type alias for Results with our Error type
pub type Result<T> = std::result::Result<T, Error>;
