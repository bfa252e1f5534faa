//! Mood meter library: face-locked emotion tracking for a small companion device.
//!
//! The vision pipeline consists of:
//! 1. Face lock: detect the largest face once, then follow it with a frame tracker
//! 2. Emotion classification of the locked face on every Nth frame
//! 3. A windowed hysteresis meter turning labels into a slow 1-5 hearts level
//! 4. A majority smoother producing a stable happy/neutral/upset label
//!
//! Alongside it run a display arbiter (text or progress image, toggled by a
//! button) and a local HTTP endpoint exposing the latest status snapshot.
//!
//! # Examples
//!
//! ## Heart meter
//!
//! ```
//! use mood_meter::heart_meter::{HeartMeter, HeartMeterSettings};
//! use std::time::{Duration, Instant};
//!
//! let start = Instant::now();
//! let mut meter = HeartMeter::new(HeartMeterSettings::default(), start);
//!
//! for _ in 0..10 {
//!     meter.record("happy", start);
//! }
//! meter.tick(start + Duration::from_secs(5));
//! assert_eq!(meter.level(), 4);
//! ```
//!
//! ## Status snapshot
//!
//! ```
//! use mood_meter::status::{FrameObservation, SharedStatus, StatusResponse};
//! use mood_meter::emotion::Mood;
//!
//! let status = SharedStatus::new();
//! status.publish(
//!     FrameObservation {
//!         present: true,
//!         emotion: Mood::Happy,
//!         confidence: Some(0.8),
//!         embedding: Some(vec![0.6, 0.8]),
//!     },
//!     1_700_000_000,
//! );
//!
//! let response = StatusResponse::from(&status.snapshot());
//! assert!(response.present);
//! assert_eq!(response.last_seen_ts, 1_700_000_000);
//! ```

/// Main application module
pub mod app;

/// Frame sources and detector/tracker backends
pub mod capture;

/// Emotion classifier strategy
pub mod classifier;

/// Configuration management
pub mod config;

/// Constants used throughout the application
pub mod constants;

/// Display arbitration, button input and the preview panel
pub mod display;

/// Expression labels, polarity sets and the three-way mood
pub mod emotion;

/// Error types and result handling
pub mod error;

/// Largest-face lock with a frame tracker
pub mod face_lock;

/// Windowed hysteresis hearts meter
pub mod heart_meter;

/// Per-frame vision loop
pub mod pipeline;

/// Local HTTP endpoints
pub mod server;

/// Majority vote label smoother
pub mod smoother;

/// Shared presence and emotion snapshot
pub mod status;

/// Utility functions for numeric conversions and vector math
pub mod utils;

pub use error::{Error, Result};
