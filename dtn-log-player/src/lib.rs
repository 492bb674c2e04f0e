//! DTN Log Player Library
//!
//! Parses recorded delay-tolerant network simulation logs and replays them
//! deterministically, frame by frame.
//!
//! # Architecture
//!
//! - The parser turns log text into a topology (area + nodes) and a
//!   [`Timeline`] of typed, time-ordered event frames
//! - The [`Executor`] applies one frame of events to the [`NodeTable`]
//! - The [`Player`] is the playback state machine: play, pause, step,
//!   jump and reset, with per-event-class delays between frames
//!
//! The library does NOT:
//! - Draw anything (the host supplies a [`Renderer`])
//! - Own an event loop (the host supplies a [`Scheduler`] and feeds fired
//!   timers back through [`Player::on_timer`])
//! - Simulate the network; it only replays what was recorded
//!
//! # Example Usage
//!
//! ```no_run
//! use dtn_log_player::{parse_log_file, FrameView, Player, PlayerConfig, TimerQueue};
//! use std::path::Path;
//!
//! let log = parse_log_file(Path::new("dtn-run.log")).unwrap();
//! let renderer = |view: &FrameView<'_>| println!("t={}", view.time());
//! let mut player = Player::new(log, PlayerConfig::new(), TimerQueue::new(), renderer).unwrap();
//!
//! player.play().unwrap();
//! while let Some(timer) = player.scheduler_mut().pop_due() {
//!     player.on_timer(timer.handle).unwrap();
//! }
//!
//! player.jump(0).unwrap();
//! ```

// Public modules
pub mod config;
pub mod executor;
pub mod parser;
pub mod player;
pub mod scheduler;
pub mod timeline;
pub mod types;

// Re-export main types for convenience
pub use config::{PlayerConfig, StepDelay};
pub use executor::{Executor, NodeTable, StateSnapshot};
pub use parser::{parse_log_file, parse_log_str, ParsedLog};
pub use player::{FrameView, PlaybackState, Player, Renderer};
pub use scheduler::{Scheduler, Timer, TimerHandle, TimerQueue};
pub use timeline::Timeline;
pub use types::{
    Area, Color, DelayClass, Event, FieldValue, Fields, Node, NodeId, NodeState, PlayerError,
    Result, TimeFrame, Topology,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
