//! Emotion classifier strategy.
//!
//! One production implementation (ONNX models, feature `onnx`) and one
//! fallback that only reports presence. The choice is made once at startup
//! by [`select`].

#[cfg(feature = "onnx")]
pub mod onnx;

use crate::capture::Frame;
use crate::config::ClassifierConfig;
use crate::Result;
use log::{info, warn};

/// Result of analyzing one face crop
#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
    /// The classifier saw a face in the crop
    pub present: bool,
    /// Raw expression label, e.g. "happy" or "sad"
    pub label: String,
    /// Confidence of `label` in `[0, 1]`
    pub confidence: f32,
    /// L2-normalized identity embedding, if the classifier computes one
    pub embedding: Option<Vec<f32>>,
}

impl Default for Analysis {
    fn default() -> Self {
        Self {
            present: false,
            label: "neutral".to_string(),
            confidence: 0.0,
            embedding: None,
        }
    }
}

/// Turns a face crop into an expression label
pub trait Classifier: Send {
    /// Analyze one crop; errors mean "no sample for this frame"
    fn analyze(&mut self, face: &Frame) -> Result<Analysis>;

    /// Short name for logs
    fn name(&self) -> &str;
}

/// Fallback when no model is available: a locked face is present but neutral
#[derive(Debug, Default)]
pub struct PresenceClassifier;

impl Classifier for PresenceClassifier {
    fn analyze(&mut self, face: &Frame) -> Result<Analysis> {
        let (width, height) = face.dimensions();
        Ok(Analysis {
            present: width > 0 && height > 0,
            ..Analysis::default()
        })
    }

    fn name(&self) -> &str {
        "presence"
    }
}

/// Pick the classifier for this run
#[must_use]
pub fn select(config: &ClassifierConfig) -> Box<dyn Classifier> {
    #[cfg(feature = "onnx")]
    if config.emotion_model.is_some() {
        match onnx::OnnxClassifier::new(config) {
            Ok(classifier) => {
                info!("Using ONNX emotion classifier");
                return Box::new(classifier);
            }
            Err(e) => warn!("ONNX classifier unavailable, falling back: {e}"),
        }
    }

    #[cfg(not(feature = "onnx"))]
    if config.emotion_model.is_some() {
        warn!("Emotion model configured but this build lacks the `onnx` feature");
    }

    info!("Using presence-only classifier");
    Box::new(PresenceClassifier)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presence_classifier() {
        let mut classifier = PresenceClassifier;
        let analysis = classifier.analyze(&Frame::new(48, 48)).unwrap();
        assert!(analysis.present);
        assert_eq!(analysis.label, "neutral");
        assert!(analysis.embedding.is_none());
    }

    #[test]
    fn test_select_without_model_falls_back() {
        let classifier = select(&ClassifierConfig::default());
        assert_eq!(classifier.name(), "presence");
    }
}
