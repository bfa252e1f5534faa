//! Button edges.
//!
//! Producers (the GPIO poller, the HTTP toggle endpoint) debounce on their
//! side and push `ButtonEvent`s into a bounded channel; the display arbiter
//! drains it on every reconciliation.

use crate::constants::{BUTTON_CHANNEL_CAPACITY, DEFAULT_BUTTON_POLL_MS, DEFAULT_DEBOUNCE_MS};
use crate::{Error, Result};
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use log::{debug, info, warn};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// A debounced button press
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonEvent {
    Pressed,
}

/// Cloneable producer side of the button channel
#[derive(Debug, Clone)]
pub struct ButtonSender {
    tx: Sender<ButtonEvent>,
}

impl ButtonSender {
    /// Queue a press; returns `false` if the channel is full or closed
    pub fn press(&self) -> bool {
        match self.tx.try_send(ButtonEvent::Pressed) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                warn!("Button channel full, dropping press");
                false
            }
            Err(TrySendError::Disconnected(_)) => false,
        }
    }
}

/// Create the bounded button channel
#[must_use]
pub fn button_channel() -> (ButtonSender, Receiver<ButtonEvent>) {
    let (tx, rx) = bounded(BUTTON_CHANNEL_CAPACITY);
    (ButtonSender { tx }, rx)
}

/// Suppresses edges closer together than `interval`
#[derive(Debug, Clone)]
pub struct Debouncer {
    interval: Duration,
    last_accepted: Option<Instant>,
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(Duration::from_millis(DEFAULT_DEBOUNCE_MS))
    }
}

impl Debouncer {
    #[must_use]
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_accepted: None,
        }
    }

    /// Whether an edge at `now` counts
    pub fn accept(&mut self, now: Instant) -> bool {
        match self.last_accepted {
            Some(last) if now.saturating_duration_since(last) < self.interval => false,
            _ => {
                self.last_accepted = Some(now);
                true
            }
        }
    }
}

/// Polls a sysfs GPIO `value` file for falling edges (pull-up wiring, active low)
pub struct GpioButton {
    value_path: PathBuf,
    poll_interval: Duration,
    debouncer: Debouncer,
    sender: ButtonSender,
    last_high: Option<bool>,
}

impl GpioButton {
    /// Open the button; the value file must exist and be readable
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if the value file cannot be read.
    pub fn new<P: AsRef<Path>>(value_path: P, debounce: Duration, sender: ButtonSender) -> Result<Self> {
        let value_path = value_path.as_ref().to_path_buf();
        read_level(&value_path)?;
        info!("GPIO button on {}", value_path.display());

        Ok(Self {
            value_path,
            poll_interval: Duration::from_millis(DEFAULT_BUTTON_POLL_MS),
            debouncer: Debouncer::new(debounce),
            sender,
            last_high: None,
        })
    }

    #[must_use]
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Feed one level sample; returns `true` if a press was emitted
    pub fn sample(&mut self, high: bool, now: Instant) -> bool {
        let falling = self.last_high == Some(true) && !high;
        self.last_high = Some(high);

        if falling && self.debouncer.accept(now) {
            debug!("Button falling edge");
            return self.sender.press();
        }
        false
    }

    /// Poll until `stop` is raised; read errors are logged and skipped
    pub fn run(mut self, stop: &AtomicBool) {
        while !stop.load(Ordering::Relaxed) {
            match read_level(&self.value_path) {
                Ok(high) => {
                    self.sample(high, Instant::now());
                }
                Err(e) => debug!("GPIO read failed: {e}"),
            }
            std::thread::sleep(self.poll_interval);
        }
    }
}

fn read_level(path: &Path) -> Result<bool> {
    let raw = std::fs::read_to_string(path)?;
    match raw.trim() {
        "1" => Ok(true),
        "0" => Ok(false),
        other => Err(Error::InvalidInput(format!("Unexpected GPIO value: {other:?}"))),
    }
}
