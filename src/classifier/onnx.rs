//! ONNX Runtime emotion classifier with an optional face embedding model.

use crate::capture::Frame;
use crate::classifier::{Analysis, Classifier};
use crate::config::ClassifierConfig;
use crate::constants::{IMAGE_NORMALIZATION_OFFSET, IMAGE_NORMALIZATION_SCALE};
use crate::utils::safe_cast::unit_interval;
use crate::utils::{argmax, l2_normalize, softmax};
use crate::{Error, Result};
use image::imageops::{self, FilterType};
use ndarray::{Array4, CowArray};
use ort::{Environment, Session, Value};
use std::path::Path;
use std::sync::Arc;

/// Emotion (and optionally identity) inference on face crops
pub struct OnnxClassifier {
    emotion: Session,
    emotion_channels_first: bool,
    embedding: Option<(Session, bool)>,
    input_size: u32,
    embedding_input_size: u32,
    labels: Vec<String>,
}

impl OnnxClassifier {
    /// Load the configured models
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - No emotion model is configured
    /// - A model file cannot be loaded
    /// - The ONNX runtime environment cannot be created
    pub fn new(config: &ClassifierConfig) -> Result<Self> {
        let emotion_path = config
            .emotion_model
            .as_ref()
            .ok_or_else(|| Error::ConfigError("No emotion model configured".to_string()))?;

        let environment = Arc::new(
            Environment::builder()
                .with_name("mood_meter")
                .with_log_level(ort::LoggingLevel::Warning)
                .build()?,
        );

        let emotion = load_session(&environment, emotion_path)?;
        let emotion_channels_first = channels_first(&emotion, 1);

        let embedding = match &config.embedding_model {
            Some(path) => {
                let session = load_session(&environment, path)?;
                let layout = channels_first(&session, 3);
                Some((session, layout))
            }
            None => None,
        };

        Ok(Self {
            emotion,
            emotion_channels_first,
            embedding,
            input_size: config.input_size,
            embedding_input_size: config.embedding_input_size,
            labels: config.labels.clone(),
        })
    }

    fn classify_emotion(&self, face: &Frame) -> Result<(String, f32)> {
        let size = self.input_size;
        let gray = imageops::grayscale(face);
        let resized = imageops::resize(&gray, size, size, FilterType::Triangle);

        let side = size as usize;
        let data: Vec<f32> = resized.as_raw().iter().map(|&p| f32::from(p) / 255.0).collect();
        let shape = if self.emotion_channels_first {
            (1, 1, side, side)
        } else {
            (1, side, side, 1)
        };
        let input = Array4::from_shape_vec(shape, data)
            .map_err(|e| Error::ModelError(format!("Failed to create array: {e}")))?;

        let scores = forward(&self.emotion, input)?;
        if scores.len() != self.labels.len() {
            return Err(Error::ModelError(format!(
                "Emotion model returned {} scores for {} labels",
                scores.len(),
                self.labels.len()
            )));
        }

        let probabilities = to_probabilities(&scores);
        let (index, confidence) =
            argmax(&probabilities).ok_or_else(|| Error::ModelError("Empty emotion output".to_string()))?;

        Ok((self.labels[index].to_lowercase(), unit_interval(confidence)))
    }

    fn embed(&self, face: &Frame) -> Result<Option<Vec<f32>>> {
        let Some((session, channels_first)) = &self.embedding else {
            return Ok(None);
        };

        let size = self.embedding_input_size;
        let side = size as usize;
        let resized = imageops::resize(face, size, size, FilterType::Triangle);
        let normalized: Vec<f32> = resized
            .as_raw()
            .iter()
            .map(|&p| (f32::from(p) - IMAGE_NORMALIZATION_OFFSET) / IMAGE_NORMALIZATION_SCALE)
            .collect();

        let mut input = Array4::from_shape_vec((1, side, side, 3), normalized)
            .map_err(|e| Error::ModelError(format!("Failed to create array: {e}")))?;
        if *channels_first {
            input = input.permuted_axes([0, 3, 1, 2]).as_standard_layout().into_owned();
        }

        Ok(Some(l2_normalize(forward(session, input)?)))
    }
}

impl Classifier for OnnxClassifier {
    fn analyze(&mut self, face: &Frame) -> Result<Analysis> {
        let (label, confidence) = self.classify_emotion(face)?;
        let embedding = self.embed(face)?;

        Ok(Analysis {
            present: true,
            label,
            confidence,
            embedding,
        })
    }

    fn name(&self) -> &str {
        "onnx"
    }
}

fn load_session(environment: &Arc<Environment>, path: &Path) -> Result<Session> {
    log::info!("Loading ONNX model: {}", path.display());
    Ok(ort::SessionBuilder::new(environment)?
        .with_optimization_level(ort::GraphOptimizationLevel::Level3)?
        .with_model_from_file(path)?)
}

/// Whether the first input is laid out NCHW, judged by its channel axis
fn channels_first(session: &Session, channels: u32) -> bool {
    session
        .inputs
        .first()
        .and_then(|input| input.dimensions.get(1).copied().flatten())
        .is_some_and(|dim| dim == channels)
}

fn forward(session: &Session, input: Array4<f32>) -> Result<Vec<f32>> {
    let cow_array = CowArray::from(input.into_dyn());
    let input_tensor = Value::from_array(session.allocator(), &cow_array)?;

    let outputs = session.run(vec![input_tensor])?;
    let output = outputs
        .into_iter()
        .next()
        .ok_or_else(|| Error::ModelError("No output from model".to_string()))?;

    let tensor = output.try_extract::<f32>()?;
    let view = tensor.view();
    let scores: Vec<f32> = view.iter().copied().collect();
    Ok(scores)
}

/// Model outputs that already form a distribution are kept; logits get a softmax
fn to_probabilities(scores: &[f32]) -> Vec<f32> {
    let in_range = scores.iter().all(|s| (0.0..=1.0).contains(s));
    let sum: f32 = scores.iter().sum();
    if in_range && (sum - 1.0).abs() < 1e-3 {
        scores.to_vec()
    } else {
        softmax(scores)
    }
}
