//! Emotion vocabulary shared by the windowed components.
//!
//! The classifier speaks in raw expression labels ("happy", "sad", ...).
//! The heart meter folds them into a polarity, the smoother into one of
//! three coarse moods.

use crate::constants::{DEFAULT_NEGATIVE_LABELS, DEFAULT_POSITIVE_LABELS};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Direction a label pushes the heart meter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    Positive,
    Negative,
    Neutral,
}

/// Stabilized three-way label reported to clients
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    Happy,
    #[default]
    Neutral,
    Upset,
}

impl Mood {
    /// Enumeration order; also the tie-break order of the majority vote
    pub const ALL: [Mood; 3] = [Mood::Happy, Mood::Neutral, Mood::Upset];

    /// Fixed mapping from a raw classifier label
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        match normalize(label).as_str() {
            "happy" | "surprise" => Self::Happy,
            "angry" | "disgust" | "fear" | "sad" => Self::Upset,
            _ => Self::Neutral,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Happy => "happy",
            Self::Neutral => "neutral",
            Self::Upset => "upset",
        }
    }

    pub(crate) fn index(self) -> usize {
        match self {
            Self::Happy => 0,
            Self::Neutral => 1,
            Self::Upset => 2,
        }
    }
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Positive and negative label sets; anything else is neutral
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmotionSets {
    positive: HashSet<String>,
    negative: HashSet<String>,
}

impl EmotionSets {
    /// Build sets from label lists; labels are matched case-insensitively
    pub fn new<I, J, S, T>(positive: I, negative: J) -> Self
    where
        I: IntoIterator<Item = S>,
        J: IntoIterator<Item = T>,
        S: AsRef<str>,
        T: AsRef<str>,
    {
        Self {
            positive: positive.into_iter().map(|l| normalize(l.as_ref())).collect(),
            negative: negative.into_iter().map(|l| normalize(l.as_ref())).collect(),
        }
    }

    #[must_use]
    pub fn polarity(&self, label: &str) -> Polarity {
        let label = normalize(label);
        if self.positive.contains(&label) {
            Polarity::Positive
        } else if self.negative.contains(&label) {
            Polarity::Negative
        } else {
            Polarity::Neutral
        }
    }
}

impl Default for EmotionSets {
    fn default() -> Self {
        Self::new(DEFAULT_POSITIVE_LABELS, DEFAULT_NEGATIVE_LABELS)
    }
}

fn normalize(label: &str) -> String {
    label.trim().to_lowercase()
}
