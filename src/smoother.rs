//! Windowed majority-vote smoother for the three-way mood label.

use crate::constants::DEFAULT_WINDOW_SECS;
use crate::emotion::Mood;
use log::debug;
use std::time::{Duration, Instant};

/// Per-window vote counts, indexed in `Mood::ALL` order
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MoodCounts {
    pub happy: u32,
    pub neutral: u32,
    pub upset: u32,
}

impl MoodCounts {
    fn bump(&mut self, mood: Mood) {
        match mood {
            Mood::Happy => self.happy += 1,
            Mood::Neutral => self.neutral += 1,
            Mood::Upset => self.upset += 1,
        }
    }

    #[must_use]
    pub fn get(&self, mood: Mood) -> u32 {
        [self.happy, self.neutral, self.upset][mood.index()]
    }

    #[must_use]
    pub fn total(&self) -> u32 {
        self.happy + self.neutral + self.upset
    }

    /// Majority mood; ties resolve to the earliest mood in `Mood::ALL`.
    ///
    /// Returns `None` for an empty window.
    #[must_use]
    pub fn majority(&self) -> Option<Mood> {
        if self.total() == 0 {
            return None;
        }
        Mood::ALL
            .into_iter()
            .fold(None, |best: Option<Mood>, mood| match best {
                Some(current) if self.get(current) >= self.get(mood) => Some(current),
                _ => Some(mood),
            })
    }
}

/// Tumbling-window majority vote over mapped labels
#[derive(Debug, Clone)]
pub struct MajoritySmoother {
    window: Duration,
    counts: MoodCounts,
    window_start: Instant,
    label: Mood,
}

impl MajoritySmoother {
    /// Create a smoother with the default window, starting at `neutral`
    #[must_use]
    pub fn new(now: Instant) -> Self {
        Self::with_window(Duration::from_secs_f64(DEFAULT_WINDOW_SECS), now)
    }

    #[must_use]
    pub fn with_window(window: Duration, now: Instant) -> Self {
        Self {
            window,
            counts: MoodCounts::default(),
            window_start: now,
            label: Mood::default(),
        }
    }

    /// Current stabilized label; only changes when a window closes
    #[must_use]
    pub fn label(&self) -> Mood {
        self.label
    }

    #[must_use]
    pub fn counts(&self) -> MoodCounts {
        self.counts
    }

    /// Vote with one raw label, then close the window if it is due
    pub fn record(&mut self, label: &str, now: Instant) -> Option<Mood> {
        self.counts.bump(Mood::from_label(label));
        self.tick(now)
    }

    /// Close the window if due; returns the label in force afterwards
    pub fn tick(&mut self, now: Instant) -> Option<Mood> {
        if now.saturating_duration_since(self.window_start) < self.window {
            return None;
        }

        // An empty window carries no evidence and keeps the previous label
        if let Some(winner) = self.counts.majority() {
            if winner != self.label {
                debug!(
                    "Stabilized mood {} -> {} (happy={} neutral={} upset={})",
                    self.label, winner, self.counts.happy, self.counts.neutral, self.counts.upset
                );
            }
            self.label = winner;
        }

        self.counts = MoodCounts::default();
        self.window_start = now;
        Some(self.label)
    }
}
