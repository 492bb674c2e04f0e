//! Host event loop
//!
//! Drains the player's [`TimerQueue`] one timer at a time. In real-time mode
//! the loop sleeps for each timer's delay (scaled by the speed factor)
//! before delivering it; in instant mode it delivers immediately.

use anyhow::{Context, Result};
use dtn_log_player::{Player, Renderer, TimerQueue};
use std::thread;
use std::time::{Duration, Instant};

/// How the loop paces ticks
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pacing {
    pub instant: bool,
    pub speed: f64,
}

impl Pacing {
    /// Real time to wait for a timer scheduled with `delay`
    pub fn wait_for(&self, delay: Duration) -> Duration {
        if self.instant {
            Duration::ZERO
        } else {
            delay.div_f64(self.speed)
        }
    }
}

/// What happened during a playback run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaybackSummary {
    pub ticks: usize,
    /// Accumulated virtual delay of all delivered timers
    pub virtual_time: Duration,
    pub wall_time: Duration,
}

/// Play from the current cursor until the end of the timeline
///
/// A frame that fails to apply stops playback and is reported with the
/// frame it happened at.
pub fn play_to_end<R: Renderer>(player: &mut Player<TimerQueue, R>, pacing: Pacing) -> Result<PlaybackSummary> {
    let started = Instant::now();
    let mut ticks = 1;

    player
        .play()
        .with_context(|| format!("Playback failed at frame {}", player.index()))?;

    while let Some(timer) = player.scheduler_mut().pop_due() {
        let wait = pacing.wait_for(timer.delay);
        if !wait.is_zero() {
            thread::sleep(wait);
        }

        player
            .on_timer(timer.handle)
            .with_context(|| format!("Playback failed at frame {}", player.index()))?;
        ticks += 1;
    }

    let summary = PlaybackSummary {
        ticks,
        virtual_time: player.scheduler().now(),
        wall_time: started.elapsed(),
    };

    log::info!(
        "Playback finished after {} ticks ({:?} simulated delay, {:?} wall time)",
        summary.ticks,
        summary.virtual_time,
        summary.wall_time
    );

    Ok(summary)
}
