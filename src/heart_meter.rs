//! Windowed hysteresis meter.
//!
//! Turns a stream of per-frame expression labels into a slow 1-5 "hearts"
//! level. Samples are counted in tumbling windows; when a window closes
//! the level moves by at most one step, and only if one polarity clearly
//! dominates the non-neutral samples.

use crate::constants::{
    DEFAULT_MIN_EFFECTIVE_FRAMES, DEFAULT_NEG_RATIO, DEFAULT_POS_RATIO, DEFAULT_WINDOW_SECS, HEARTS_MAX, HEARTS_MIN,
    HEARTS_START,
};
use crate::emotion::{EmotionSets, Polarity};
use crate::{Error, Result};
use log::{debug, info};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Tunables of the heart meter
#[derive(Debug, Clone)]
pub struct HeartMeterSettings {
    /// Tumbling window length
    pub window: Duration,
    /// Lowest level
    pub min_level: u8,
    /// Highest level
    pub max_level: u8,
    /// Level before the first decision
    pub start_level: u8,
    /// Positive share of effective frames needed to rise
    pub pos_ratio: f64,
    /// Negative share of effective frames needed to fall
    pub neg_ratio: f64,
    /// Windows with fewer positive + negative frames are ignored
    pub min_effective_frames: u32,
    /// Label polarity sets
    pub sets: EmotionSets,
}

impl Default for HeartMeterSettings {
    fn default() -> Self {
        Self {
            window: Duration::from_secs_f64(DEFAULT_WINDOW_SECS),
            min_level: HEARTS_MIN,
            max_level: HEARTS_MAX,
            start_level: HEARTS_START,
            pos_ratio: DEFAULT_POS_RATIO,
            neg_ratio: DEFAULT_NEG_RATIO,
            min_effective_frames: DEFAULT_MIN_EFFECTIVE_FRAMES,
            sets: EmotionSets::default(),
        }
    }
}

impl HeartMeterSettings {
    /// Check level bounds and ratios
    ///
    /// # Errors
    ///
    /// Returns `Error::ConfigError` if the start level is not strictly inside
    /// `[min_level, max_level]`, a ratio is outside `[0, 1]`, or the window is empty.
    pub fn validate(&self) -> Result<()> {
        if !(self.min_level < self.start_level && self.start_level < self.max_level) {
            return Err(Error::ConfigError(format!(
                "Start level {} must lie strictly between {} and {}",
                self.start_level, self.min_level, self.max_level
            )));
        }
        if !(0.0..=1.0).contains(&self.pos_ratio) || !(0.0..=1.0).contains(&self.neg_ratio) {
            return Err(Error::ConfigError("Meter ratios must be between 0.0 and 1.0".to_string()));
        }
        if self.window.is_zero() {
            return Err(Error::ConfigError("Meter window must be longer than zero".to_string()));
        }
        Ok(())
    }
}

/// Per-window sample counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WindowCounters {
    pub positive: u32,
    pub negative: u32,
    pub neutral: u32,
}

impl WindowCounters {
    /// Samples that carry signal; neutral frames are padding
    #[must_use]
    pub fn effective(&self) -> u32 {
        self.positive + self.negative
    }
}

/// Outcome of closing a window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowDecision {
    /// Level went up by one (or was already at the top)
    Rise,
    /// Level went down by one (or was already at the bottom)
    Fall,
    /// Enough signal, but no clear majority
    Hold,
    /// Fewer effective frames than required
    InsufficientSignal,
}

/// Decide a closed window without touching any state
#[must_use]
pub fn decide(counters: WindowCounters, settings: &HeartMeterSettings) -> WindowDecision {
    let effective = counters.effective();
    if effective < settings.min_effective_frames || effective == 0 {
        return WindowDecision::InsufficientSignal;
    }

    let pos_ratio = f64::from(counters.positive) / f64::from(effective);
    let neg_ratio = f64::from(counters.negative) / f64::from(effective);

    if pos_ratio >= settings.pos_ratio && pos_ratio > neg_ratio {
        WindowDecision::Rise
    } else if neg_ratio >= settings.neg_ratio && neg_ratio > pos_ratio {
        WindowDecision::Fall
    } else {
        WindowDecision::Hold
    }
}

/// Meter shared between the vision thread and the HTTP handlers
pub type SharedMeter = Arc<Mutex<HeartMeter>>;

/// Tumbling-window hysteresis meter
#[derive(Debug, Clone)]
pub struct HeartMeter {
    settings: HeartMeterSettings,
    level: u8,
    counters: WindowCounters,
    window_start: Instant,
}

impl HeartMeter {
    /// Create a meter whose first window opens at `now`
    #[must_use]
    pub fn new(settings: HeartMeterSettings, now: Instant) -> Self {
        let level = settings.start_level.clamp(settings.min_level, settings.max_level);
        Self {
            settings,
            level,
            counters: WindowCounters::default(),
            window_start: now,
        }
    }

    #[must_use]
    pub fn level(&self) -> u8 {
        self.level
    }

    #[must_use]
    pub fn counters(&self) -> WindowCounters {
        self.counters
    }

    #[must_use]
    pub fn settings(&self) -> &HeartMeterSettings {
        &self.settings
    }

    /// Count one classified frame, then close the window if it is due
    pub fn record(&mut self, label: &str, now: Instant) -> Option<WindowDecision> {
        match self.settings.sets.polarity(label) {
            Polarity::Positive => self.counters.positive += 1,
            Polarity::Negative => self.counters.negative += 1,
            Polarity::Neutral => self.counters.neutral += 1,
        }
        self.tick(now)
    }

    /// Close the window if `now` is at least one window length past its start
    pub fn tick(&mut self, now: Instant) -> Option<WindowDecision> {
        if now.saturating_duration_since(self.window_start) < self.settings.window {
            return None;
        }
        Some(self.close_window(now))
    }

    fn close_window(&mut self, now: Instant) -> WindowDecision {
        let decision = decide(self.counters, &self.settings);
        let previous = self.level;

        match decision {
            WindowDecision::Rise => self.level = self.level.saturating_add(1).min(self.settings.max_level),
            WindowDecision::Fall => self.level = self.level.saturating_sub(1).max(self.settings.min_level),
            WindowDecision::Hold | WindowDecision::InsufficientSignal => {}
        }

        if self.level == previous {
            debug!(
                "Meter window closed ({:?}): pos={} neg={} neu={}, level stays {}",
                decision, self.counters.positive, self.counters.negative, self.counters.neutral, self.level
            );
        } else {
            info!("Heart level {} -> {} ({:?})", previous, self.level, decision);
        }

        self.counters = WindowCounters::default();
        self.window_start = now;
        decision
    }
}
