//! Player configuration types
//!
//! The player only needs to know how long to wait after each kind of frame
//! and whether to keep replay snapshots. Everything else (which file to
//! load, real-time speed, output format) belongs to the host application.

use crate::types::DelayClass;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the replay controller
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerConfig {
    /// Delay per event class, applied after each played frame
    #[serde(default)]
    pub step_delay: StepDelay,

    /// Store node state after every N-th replayed frame (0 = never)
    #[serde(default)]
    pub snapshot_interval: usize,
}

/// Delays in milliseconds for each delay class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepDelay {
    /// Used by `pos`, `route` and `beacon` frames
    #[serde(default = "default_position_delay")]
    pub position: u64,

    /// Used by `buffer` frames
    #[serde(default = "default_buffer_delay")]
    pub buffer: u64,

    /// Used by `send` frames and any unrecognised event kind
    #[serde(default = "default_message_delay")]
    pub message: u64,
}

fn default_position_delay() -> u64 {
    1
}

fn default_buffer_delay() -> u64 {
    2
}

fn default_message_delay() -> u64 {
    300
}

impl Default for StepDelay {
    fn default() -> Self {
        Self {
            position: default_position_delay(),
            buffer: default_buffer_delay(),
            message: default_message_delay(),
        }
    }
}

impl StepDelay {
    /// Create a delay table from milliseconds per class
    pub fn new(position: u64, buffer: u64, message: u64) -> Self {
        Self {
            position,
            buffer,
            message,
        }
    }

    /// The configured delay of a single class
    pub fn for_class(&self, class: DelayClass) -> Duration {
        let ms = match class {
            DelayClass::Position => self.position,
            DelayClass::Buffer => self.buffer,
            DelayClass::Message => self.message,
        };
        Duration::from_millis(ms)
    }

    /// The longest delay among the given classes (zero when empty)
    pub fn max_for<I>(&self, classes: I) -> Duration
    where
        I: IntoIterator<Item = DelayClass>,
    {
        classes
            .into_iter()
            .map(|class| self.for_class(class))
            .max()
            .unwrap_or(Duration::ZERO)
    }
}

impl PlayerConfig {
    /// Create a new player configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: set the per-class delays
    pub fn with_step_delay(mut self, step_delay: StepDelay) -> Self {
        self.step_delay = step_delay;
        self
    }

    /// Builder method: keep a snapshot every `interval` frames
    pub fn with_snapshot_interval(mut self, interval: usize) -> Self {
        self.snapshot_interval = interval;
        self
    }
}
