//! Configuration management for the mood meter

use crate::constants::{
    DEFAULT_ANALYZE_EVERY_N_FRAMES, DEFAULT_BUTTON_POLL_MS, DEFAULT_CLASSIFIER_INPUT_SIZE,
    DEFAULT_DEBOUNCE_MS, DEFAULT_EMBEDDING_INPUT_SIZE, DEFAULT_FRAME_HEIGHT, DEFAULT_FRAME_WIDTH, DEFAULT_LOST_LIMIT,
    DEFAULT_MIN_CROP_SIDE, DEFAULT_MIN_EFFECTIVE_FRAMES, DEFAULT_NEGATIVE_LABELS, DEFAULT_NEG_RATIO,
    DEFAULT_PANEL_HEIGHT, DEFAULT_PANEL_WIDTH, DEFAULT_PORT, DEFAULT_POSITIVE_LABELS, DEFAULT_POS_RATIO,
    DEFAULT_REFRESH_MS, DEFAULT_TEXT_LIMIT, DEFAULT_WINDOW_SECS, EMOTION_LABELS, HEARTS_MAX, HEARTS_MIN, HEARTS_START,
};
use crate::emotion::EmotionSets;
use crate::heart_meter::HeartMeterSettings;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP listener
    pub server: ServerConfig,

    /// Camera and frame analysis cadence
    pub camera: CameraConfig,

    /// Face lock
    pub tracker: TrackerConfig,

    /// Hearts meter
    pub meter: MeterConfig,

    /// Emotion label smoother
    pub smoother: SmootherConfig,

    /// Display panel and preview output
    pub display: DisplayConfig,

    /// Physical mode button
    pub button: ButtonConfig,

    /// Emotion and embedding models
    pub classifier: ClassifierConfig,
}

/// HTTP listener configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind, e.g. "0.0.0.0"
    pub bind: String,

    /// TCP port
    pub port: u16,
}

/// Camera configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Video device index
    pub index: i32,

    /// Requested frame width
    pub frame_width: u32,

    /// Requested frame height
    pub frame_height: u32,

    /// Classify every Nth frame
    pub analyze_every_n: u32,

    /// Crops with less than this side squared in area are not classified
    pub min_crop_side: u32,

    /// Smallest face the detector reports
    pub min_face_side: u32,
}

/// Frame tracker implementation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackerKind {
    #[default]
    Csrt,
    Kcf,
}

/// Face lock configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Consecutive tracker failures before the lock is dropped
    pub lost_limit: u32,

    /// Preferred tracker; the other one is used if it cannot be created
    pub kind: TrackerKind,

    /// Haar cascade used by the detector
    pub cascade_path: PathBuf,
}

/// Hearts meter configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MeterConfig {
    /// Tumbling window length in seconds
    pub window_secs: f64,

    /// Lowest level
    pub min_level: u8,

    /// Highest level
    pub max_level: u8,

    /// Level at startup
    pub start_level: u8,

    /// Positive share needed to rise (0.0-1.0)
    pub pos_ratio: f64,

    /// Negative share needed to fall (0.0-1.0)
    pub neg_ratio: f64,

    /// Minimum positive + negative frames for a window to count
    pub min_effective_frames: u32,

    /// Labels counted as positive
    pub positive_labels: Vec<String>,

    /// Labels counted as negative
    pub negative_labels: Vec<String>,
}

/// Smoother configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SmootherConfig {
    /// Majority window length in seconds
    pub window_secs: f64,
}

/// Display configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Panel width in pixels
    pub panel_width: u32,

    /// Panel height in pixels
    pub panel_height: u32,

    /// Reconciliation interval in milliseconds
    pub refresh_ms: u64,

    /// Maximum characters kept from text requests
    pub text_limit: usize,

    /// Directory holding `0.png`, `25.png`, `50.png`, `75.png`, `100.png`
    pub assets_dir: PathBuf,

    /// Directory the preview files are written to
    pub runtime_dir: PathBuf,
}

/// Mode button configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ButtonConfig {
    /// sysfs GPIO value file; no button thread when unset
    pub gpio_value_path: Option<PathBuf>,

    /// Minimum milliseconds between accepted presses
    pub debounce_ms: u64,

    /// Polling interval in milliseconds
    pub poll_ms: u64,
}

/// Classifier configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Emotion ONNX model; presence-only classification when unset
    pub emotion_model: Option<PathBuf>,

    /// Face embedding ONNX model
    pub embedding_model: Option<PathBuf>,

    /// Square grayscale input side of the emotion model
    pub input_size: u32,

    /// Square RGB input side of the embedding model
    pub embedding_input_size: u32,

    /// Emotion model output order
    pub labels: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
        }
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            index: 0,
            frame_width: DEFAULT_FRAME_WIDTH,
            frame_height: DEFAULT_FRAME_HEIGHT,
            analyze_every_n: DEFAULT_ANALYZE_EVERY_N_FRAMES,
            min_crop_side: DEFAULT_MIN_CROP_SIDE,
            min_face_side: 60,
        }
    }
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            lost_limit: DEFAULT_LOST_LIMIT,
            kind: TrackerKind::Csrt,
            cascade_path: PathBuf::from("assets/haarcascade_frontalface_default.xml"),
        }
    }
}

impl Default for MeterConfig {
    fn default() -> Self {
        Self {
            window_secs: DEFAULT_WINDOW_SECS,
            min_level: HEARTS_MIN,
            max_level: HEARTS_MAX,
            start_level: HEARTS_START,
            pos_ratio: DEFAULT_POS_RATIO,
            neg_ratio: DEFAULT_NEG_RATIO,
            min_effective_frames: DEFAULT_MIN_EFFECTIVE_FRAMES,
            positive_labels: DEFAULT_POSITIVE_LABELS.iter().map(ToString::to_string).collect(),
            negative_labels: DEFAULT_NEGATIVE_LABELS.iter().map(ToString::to_string).collect(),
        }
    }
}

impl Default for SmootherConfig {
    fn default() -> Self {
        Self {
            window_secs: DEFAULT_WINDOW_SECS,
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            panel_width: DEFAULT_PANEL_WIDTH,
            panel_height: DEFAULT_PANEL_HEIGHT,
            refresh_ms: DEFAULT_REFRESH_MS,
            text_limit: DEFAULT_TEXT_LIMIT,
            assets_dir: PathBuf::from("assets"),
            runtime_dir: PathBuf::from("runtime"),
        }
    }
}

impl Default for ButtonConfig {
    fn default() -> Self {
        Self {
            gpio_value_path: None,
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            poll_ms: DEFAULT_BUTTON_POLL_MS,
        }
    }
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            emotion_model: None,
            embedding_model: None,
            input_size: DEFAULT_CLASSIFIER_INPUT_SIZE,
            embedding_input_size: DEFAULT_EMBEDDING_INPUT_SIZE,
            labels: EMOTION_LABELS.iter().map(ToString::to_string).collect(),
        }
    }
}

impl MeterConfig {
    /// Meter settings described by this section
    #[must_use]
    pub fn settings(&self) -> HeartMeterSettings {
        HeartMeterSettings {
            window: Duration::from_secs_f64(self.window_secs.max(0.0)),
            min_level: self.min_level,
            max_level: self.max_level,
            start_level: self.start_level,
            pos_ratio: self.pos_ratio,
            neg_ratio: self.neg_ratio,
            min_effective_frames: self.min_effective_frames,
            sets: EmotionSets::new(&self.positive_labels, &self.negative_labels),
        }
    }
}

impl SmootherConfig {
    #[must_use]
    pub fn window(&self) -> Duration {
        Duration::from_secs_f64(self.window_secs.max(0.0))
    }
}

impl DisplayConfig {
    #[must_use]
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_ms)
    }
}

impl Config {
    /// Load configuration from a YAML file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid YAML.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;

        serde_yaml::from_str(&content).map_err(|e| Error::ConfigError(format!("Failed to parse config: {e}")))
    }

    /// Save configuration to a YAML file
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = self.to_yaml()?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Render the configuration as YAML
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Validate configuration
    ///
    /// # Errors
    ///
    /// Returns `Error::ConfigError` naming the first invalid setting.
    pub fn validate(&self) -> Result<()> {
        if self.camera.frame_width == 0 || self.camera.frame_height == 0 {
            return Err(Error::ConfigError("Frame size must be greater than 0".to_string()));
        }
        if self.camera.analyze_every_n == 0 {
            return Err(Error::ConfigError("analyze_every_n must be greater than 0".to_string()));
        }
        if self.tracker.lost_limit == 0 {
            return Err(Error::ConfigError("Tracker lost limit must be greater than 0".to_string()));
        }

        if !self.meter.window_secs.is_finite() || self.meter.window_secs <= 0.0 {
            return Err(Error::ConfigError("Meter window must be a positive number of seconds".to_string()));
        }
        self.meter.settings().validate()?;

        if !self.smoother.window_secs.is_finite() || self.smoother.window_secs <= 0.0 {
            return Err(Error::ConfigError(
                "Smoother window must be a positive number of seconds".to_string(),
            ));
        }

        if self.display.panel_width == 0 || self.display.panel_height == 0 {
            return Err(Error::ConfigError("Panel size must be greater than 0".to_string()));
        }
        if self.display.refresh_ms == 0 {
            return Err(Error::ConfigError("Display refresh interval must be greater than 0".to_string()));
        }

        if self.button.poll_ms == 0 {
            return Err(Error::ConfigError("Button poll interval must be greater than 0".to_string()));
        }

        if self.classifier.input_size == 0 || self.classifier.embedding_input_size == 0 {
            return Err(Error::ConfigError("Model input sizes must be greater than 0".to_string()));
        }
        if self.classifier.labels.is_empty() {
            return Err(Error::ConfigError("Classifier label list must not be empty".to_string()));
        }

        // Model paths are optional, but a configured one must exist
        for model in [&self.classifier.emotion_model, &self.classifier.embedding_model]
            .into_iter()
            .flatten()
        {
            if !model.exists() {
                return Err(Error::ConfigError(format!("Model not found: {}", model.display())));
            }
        }

        Ok(())
    }
}

/// Example configuration file content
pub const EXAMPLE_CONFIG: &str = r#"# Mood Meter Configuration

# HTTP status endpoint
server:
  bind: "0.0.0.0"
  port: 8000

# Camera
camera:
  index: 0
  frame_width: 320
  frame_height: 240
  analyze_every_n: 3
  min_crop_side: 48
  min_face_side: 60

# Face lock
tracker:
  lost_limit: 20
  kind: csrt
  cascade_path: "assets/haarcascade_frontalface_default.xml"

# Hearts meter
meter:
  window_secs: 5.0
  min_level: 1
  max_level: 5
  start_level: 3
  pos_ratio: 0.6
  neg_ratio: 0.6
  min_effective_frames: 10
  positive_labels: [happy, surprise]
  negative_labels: [angry, disgust, fear, sad]

# Majority smoother
smoother:
  window_secs: 5.0

# Display panel
display:
  panel_width: 240
  panel_height: 240
  refresh_ms: 100
  text_limit: 200
  assets_dir: "assets"
  runtime_dir: "runtime"

# Mode button (sysfs GPIO value file)
button:
  # gpio_value_path: "/sys/class/gpio/gpio17/value"
  debounce_ms: 300
  poll_ms: 10

# Models (require the `onnx` feature)
classifier:
  # emotion_model: "assets/emotion.onnx"
  # embedding_model: "assets/facenet.onnx"
  input_size: 48
  embedding_input_size: 160
  labels: [angry, disgust, fear, happy, sad, surprise, neutral]
"#;
