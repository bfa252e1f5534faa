//! Constants used throughout the application

/// Consecutive tracker failures before a lock is dropped
pub const DEFAULT_LOST_LIMIT: u32 = 20;

/// Smallest crop side (in pixels) worth classifying; area threshold is its square
pub const DEFAULT_MIN_CROP_SIDE: u32 = 48;

/// Classify every Nth captured frame
pub const DEFAULT_ANALYZE_EVERY_N_FRAMES: u32 = 3;

/// Capture resolution requested from the camera
pub const DEFAULT_FRAME_WIDTH: u32 = 320;
pub const DEFAULT_FRAME_HEIGHT: u32 = 240;

/// Tumbling window length shared by the meter and the smoother, in seconds
pub const DEFAULT_WINDOW_SECS: f64 = 5.0;

/// Heart meter bounds and start level
pub const HEARTS_MIN: u8 = 1;
pub const HEARTS_MAX: u8 = 5;
pub const HEARTS_START: u8 = 3;

/// Ratio of (positive + negative) frames required to move the meter
pub const DEFAULT_POS_RATIO: f64 = 0.60;
pub const DEFAULT_NEG_RATIO: f64 = 0.60;

/// Minimum positive + negative frames for a window to count
pub const DEFAULT_MIN_EFFECTIVE_FRAMES: u32 = 10;

/// Raw labels that raise the meter
pub const DEFAULT_POSITIVE_LABELS: [&str; 2] = ["happy", "surprise"];

/// Raw labels that lower the meter
pub const DEFAULT_NEGATIVE_LABELS: [&str; 4] = ["angry", "disgust", "fear", "sad"];

/// Labels emitted by seven-class facial expression models, in model output order
pub const EMOTION_LABELS: [&str; 7] = ["angry", "disgust", "fear", "happy", "sad", "surprise", "neutral"];

/// Display panel size
pub const DEFAULT_PANEL_WIDTH: u32 = 240;
pub const DEFAULT_PANEL_HEIGHT: u32 = 240;

/// Display reconciliation cadence
pub const DEFAULT_REFRESH_MS: u64 = 100;

/// Longest text accepted for the text slot, in characters
pub const DEFAULT_TEXT_LIMIT: usize = 200;

/// Text rendering layout
pub const TEXT_MAX_LINES: usize = 10;
pub const TEXT_WRAP_COLUMNS: usize = 20;
pub const TEXT_MARGIN_PX: i32 = 8;
pub const TEXT_LINE_HEIGHT_PX: i32 = 22;
pub const TEXT_FONT_PX: f32 = 18.0;

/// Placeholder shown in text mode before anything is set
pub const TEXT_PLACEHOLDER: &str = "—";

/// Button debounce and sampling interval
pub const DEFAULT_DEBOUNCE_MS: u64 = 300;
pub const DEFAULT_BUTTON_POLL_MS: u64 = 10;

/// Capacity of the button edge channel
pub const BUTTON_CHANNEL_CAPACITY: usize = 16;

/// HTTP port
pub const DEFAULT_PORT: u16 = 8000;

/// Back-off after a failed frame read
pub const FRAME_RETRY_MS: u64 = 30;

/// Square input side of the grayscale emotion model
pub const DEFAULT_CLASSIFIER_INPUT_SIZE: u32 = 48;

/// Square input side of the RGB embedding model
pub const DEFAULT_EMBEDDING_INPUT_SIZE: u32 = 160;

/// Embedding model input normalization: (pixel - offset) / scale
pub const IMAGE_NORMALIZATION_OFFSET: f32 = 127.5;
pub const IMAGE_NORMALIZATION_SCALE: f32 = 128.0;

