//! Display mode arbitration.
//!
//! The panel shows one of two things: free text (set by the companion app)
//! or a progress image. Content for both modes is stored independently and
//! a periodic reconciliation step decides whether the driver needs a new
//! draw call.

/// Button edge channel, debouncing and GPIO polling
pub mod button;

/// File-backed preview panel
pub mod preview;

use crate::constants::{DEFAULT_TEXT_LIMIT, TEXT_PLACEHOLDER};
use button::ButtonEvent;
use crossbeam_channel::Receiver;
use log::{debug, info};
use parking_lot::Mutex;
use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// What the panel is showing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMode {
    Text,
    #[default]
    Progress,
}

impl DisplayMode {
    #[must_use]
    pub fn toggled(self) -> Self {
        match self {
            Self::Text => Self::Progress,
            Self::Progress => Self::Text,
        }
    }
}

impl fmt::Display for DisplayMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Text => "text",
            Self::Progress => "progress",
        })
    }
}

/// One of the five progress images
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ProgressLevel(u8);

impl ProgressLevel {
    pub const ALL: [ProgressLevel; 5] = [
        ProgressLevel(0),
        ProgressLevel(25),
        ProgressLevel(50),
        ProgressLevel(75),
        ProgressLevel(100),
    ];

    /// Accept only 0, 25, 50, 75 or 100
    #[must_use]
    pub fn from_percent(percent: i64) -> Option<Self> {
        Self::ALL.into_iter().find(|level| i64::from(level.0) == percent)
    }

    /// Parse the integer after the last `_` of an image id.
    ///
    /// Anything unparsable or outside the allowed set falls back to 0.
    #[must_use]
    pub fn from_image_id(image_id: &str) -> Self {
        let suffix = image_id.rsplit('_').next().unwrap_or_default();
        suffix
            .trim()
            .parse::<i64>()
            .ok()
            .and_then(Self::from_percent)
            .unwrap_or_default()
    }

    #[must_use]
    pub fn percent(self) -> u8 {
        self.0
    }
}

/// Content stored for a mode
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayContent {
    Text(String),
    Progress(ProgressLevel),
}

/// Driver for the physical panel; calls are best-effort
pub trait Display: Send {
    /// Draw a block of text
    fn render_text(&mut self, text: &str);

    /// Draw the image for `level`; `false` when its asset is missing
    fn render_progress(&mut self, level: ProgressLevel) -> bool;
}

/// Truncate to at most `limit` characters
#[must_use]
pub fn truncate_chars(text: &str, limit: usize) -> String {
    text.chars().take(limit).collect()
}

#[derive(Debug, Clone)]
struct DisplayState {
    mode: DisplayMode,
    text: String,
    progress: ProgressLevel,
}

/// Mode and per-mode content shared between request handlers and the arbiter
#[derive(Debug, Clone)]
pub struct SharedDisplay {
    inner: Arc<Mutex<DisplayState>>,
    text_limit: usize,
}

impl Default for SharedDisplay {
    fn default() -> Self {
        Self::new(DisplayMode::default(), DEFAULT_TEXT_LIMIT)
    }
}

impl SharedDisplay {
    #[must_use]
    pub fn new(mode: DisplayMode, text_limit: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(DisplayState {
                mode,
                text: TEXT_PLACEHOLDER.to_string(),
                progress: ProgressLevel::default(),
            })),
            text_limit,
        }
    }

    #[must_use]
    pub fn mode(&self) -> DisplayMode {
        self.inner.lock().mode
    }

    /// Flip the mode and return the new one
    pub fn toggle_mode(&self) -> DisplayMode {
        let mut state = self.inner.lock();
        state.mode = state.mode.toggled();
        state.mode
    }

    /// Store text for text mode, truncated to the configured limit
    pub fn set_text(&self, text: &str) {
        let text = truncate_chars(text, self.text_limit);
        self.inner.lock().text = text;
    }

    /// Store the level for progress mode
    pub fn set_progress(&self, level: ProgressLevel) {
        self.inner.lock().progress = level;
    }

    #[must_use]
    pub fn text(&self) -> String {
        self.inner.lock().text.clone()
    }

    #[must_use]
    pub fn progress(&self) -> ProgressLevel {
        self.inner.lock().progress
    }

    /// Active mode together with that mode's content, read under one lock
    #[must_use]
    pub fn active(&self) -> (DisplayMode, DisplayContent) {
        let state = self.inner.lock();
        let content = match state.mode {
            DisplayMode::Text => DisplayContent::Text(state.text.clone()),
            DisplayMode::Progress => DisplayContent::Progress(state.progress),
        };
        (state.mode, content)
    }
}

/// Decides when the panel needs a draw call
pub struct DisplayArbiter {
    state: SharedDisplay,
    display: Box<dyn Display>,
    buttons: Receiver<ButtonEvent>,
    last_mode: Option<DisplayMode>,
    last_drawn: Option<DisplayContent>,
}

impl DisplayArbiter {
    pub fn new(state: SharedDisplay, display: Box<dyn Display>, buttons: Receiver<ButtonEvent>) -> Self {
        Self {
            state,
            display,
            buttons,
            last_mode: None,
            last_drawn: None,
        }
    }

    /// Draw a one-off message without recording it as drawn content
    pub fn splash(&mut self, message: &str) {
        self.display.render_text(message);
    }

    /// Apply pending button edges, then draw if the active content is stale.
    ///
    /// Returns `true` when a draw call was made and succeeded.
    pub fn reconcile(&mut self) -> bool {
        while let Ok(ButtonEvent::Pressed) = self.buttons.try_recv() {
            let mode = self.state.toggle_mode();
            info!("Display mode toggled -> {mode}");
        }

        let (mode, content) = self.state.active();
        if self.last_mode != Some(mode) {
            self.last_mode = Some(mode);
            self.last_drawn = None;
        }

        if self.last_drawn.as_ref() == Some(&content) {
            return false;
        }

        let drawn = match &content {
            DisplayContent::Text(text) => {
                self.display.render_text(text);
                true
            }
            DisplayContent::Progress(level) => self.display.render_progress(*level),
        };

        if drawn {
            debug!("Rendered {mode} content");
            self.last_drawn = Some(content);
        }
        drawn
    }

    /// Reconcile every `refresh` until `stop` is raised
    pub fn run(mut self, refresh: Duration, stop: &AtomicBool) {
        info!("Display loop started ({} ms cadence)", refresh.as_millis());
        while !stop.load(Ordering::Relaxed) {
            self.reconcile();
            std::thread::sleep(refresh);
        }
        info!("Display loop stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::bounded;

    #[derive(Default)]
    struct CountingDisplay {
        calls: Arc<Mutex<Vec<DisplayContent>>>,
    }

    impl Display for CountingDisplay {
        fn render_text(&mut self, text: &str) {
            self.calls.lock().push(DisplayContent::Text(text.to_string()));
        }

        fn render_progress(&mut self, level: ProgressLevel) -> bool {
            self.calls.lock().push(DisplayContent::Progress(level));
            true
        }
    }

    #[test]
    fn test_image_id_parsing() {
        assert_eq!(ProgressLevel::from_image_id("progress_60").percent(), 0);
        assert_eq!(ProgressLevel::from_image_id("p_75").percent(), 75);
        assert_eq!(ProgressLevel::from_image_id("progress_100").percent(), 100);
        assert_eq!(ProgressLevel::from_image_id("50").percent(), 50);
        assert_eq!(ProgressLevel::from_image_id("progress_x").percent(), 0);
        assert_eq!(ProgressLevel::from_image_id("").percent(), 0);
        assert_eq!(ProgressLevel::from_image_id("a_25_b").percent(), 0);
    }

    #[test]
    fn test_truncate_counts_chars() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("short", 200), "short");
    }

    #[test]
    fn test_no_redraw_when_unchanged() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let (_tx, rx) = bounded(4);
        let state = SharedDisplay::new(DisplayMode::Text, 200);
        let mut arbiter = DisplayArbiter::new(
            state.clone(),
            Box::new(CountingDisplay { calls: Arc::clone(&calls) }),
            rx,
        );

        assert!(arbiter.reconcile());
        assert!(!arbiter.reconcile());
        state.set_text("hello");
        assert!(arbiter.reconcile());
        assert_eq!(calls.lock().len(), 2);
    }
}
