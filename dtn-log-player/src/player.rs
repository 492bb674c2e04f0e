//! Replay controller
//!
//! [`Player`] is the playback state machine. It owns the node table and the
//! timeline, drives the [`Executor`] one frame at a time and tells an
//! injected [`Renderer`] whenever the displayed frame or the selected node
//! changes.
//!
//! # Cursor
//!
//! - `index` is the next frame a tick will apply, in `[0, len]`.
//! - `displayed` is the frame whose effects were applied last and whose
//!   transient events (`send`, `beacon`) are shown.
//!
//! Node state has no undo, so [`Player::jump`] always rebuilds state from
//! the initial state (or from a stored snapshot of an earlier replay) and
//! re-applies every frame up to the target.

use crate::config::PlayerConfig;
use crate::executor::{Executor, NodeTable, StateSnapshot};
use crate::parser::ParsedLog;
use crate::scheduler::{Scheduler, TimerHandle};
use crate::timeline::Timeline;
use crate::types::{Area, Event, Node, NodeId, PlayerError, Result, TimeFrame};
use std::collections::BTreeMap;
use std::time::Duration;

/// Playback state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Stopped,
    Playing,
}

/// What a renderer gets to see after every cursor or selection change
#[derive(Debug, Clone, Copy)]
pub struct FrameView<'a> {
    pub area: Option<Area>,
    pub nodes: &'a NodeTable,
    /// Index of the displayed frame
    pub index: usize,
    pub frame: &'a TimeFrame,
    pub selected: Option<&'a Node>,
}

impl<'a> FrameView<'a> {
    pub fn time(&self) -> f64 {
        self.frame.time
    }

    /// Route of the selected node, if any
    pub fn route(&self) -> Option<&'a [NodeId]> {
        self.selected.map(|node| node.state.route.as_slice())
    }

    /// Buffer of the selected node, if any
    pub fn selected_buffer(&self) -> Option<&'a [String]> {
        self.selected.map(|node| node.state.buffer.as_slice())
    }

    /// Transient events of the displayed frame
    pub fn transient_events(self) -> impl Iterator<Item = &'a Event> {
        self.frame.events.iter().filter(|event| event.is_transient())
    }
}

/// Drawing surface driven by the player
pub trait Renderer {
    fn render(&mut self, view: &FrameView<'_>);
}

impl<F> Renderer for F
where
    F: FnMut(&FrameView<'_>),
{
    fn render(&mut self, view: &FrameView<'_>) {
        self(view)
    }
}

/// The replay state machine
pub struct Player<S: Scheduler, R: Renderer> {
    area: Option<Area>,
    nodes: NodeTable,
    timeline: Timeline,
    config: PlayerConfig,
    scheduler: S,
    renderer: R,
    state: PlaybackState,
    index: usize,
    displayed: usize,
    selected: Option<NodeId>,
    pending: Option<TimerHandle>,
    /// Node state after applying frames `0..=key` from the initial state
    snapshots: BTreeMap<usize, StateSnapshot>,
}

impl<S: Scheduler, R: Renderer> Player<S, R> {
    /// Load a parsed log: apply frame 0 and render it
    ///
    /// Fails on an empty timeline or if frame 0 references unknown nodes.
    pub fn new(log: ParsedLog, config: PlayerConfig, scheduler: S, renderer: R) -> Result<Self> {
        if log.timeline.is_empty() {
            return Err(PlayerError::EmptyTimeline);
        }

        let mut player = Self {
            area: log.area,
            nodes: NodeTable::new(log.nodes),
            timeline: log.timeline,
            config,
            scheduler,
            renderer,
            state: PlaybackState::Stopped,
            index: 0,
            displayed: 0,
            selected: None,
            pending: None,
            snapshots: BTreeMap::new(),
        };

        player.apply_frame(0)?;

        let unplaced = player.nodes.unplaced();
        if !unplaced.is_empty() {
            log::warn!("{} node(s) have no position after frame 0: {:?}", unplaced.len(), unplaced);
        }

        log::info!(
            "Player loaded: {} nodes, {} frames",
            player.nodes.len(),
            player.timeline.len()
        );
        player.render();
        Ok(player)
    }

    // ======================================================
    // Playback control
    // ======================================================

    /// Start playing; the first tick runs immediately
    pub fn play(&mut self) -> Result<()> {
        if self.state == PlaybackState::Playing {
            return Ok(());
        }

        log::debug!("Play from frame {}", self.index);
        self.state = PlaybackState::Playing;
        self.tick()
    }

    /// Stop playing and cancel the pending tick, if any
    pub fn pause(&mut self) {
        if self.state == PlaybackState::Playing {
            log::debug!("Pause at frame {}", self.index);
        }
        self.state = PlaybackState::Stopped;

        if let Some(handle) = self.pending.take() {
            self.scheduler.cancel(handle);
        }
    }

    pub fn toggle(&mut self) -> Result<()> {
        match self.state {
            PlaybackState::Stopped => self.play(),
            PlaybackState::Playing => {
                self.pause();
                Ok(())
            }
        }
    }

    /// Deliver a fired timer back to the player
    ///
    /// Handles that were cancelled or superseded are ignored.
    pub fn on_timer(&mut self, handle: TimerHandle) -> Result<()> {
        if self.pending != Some(handle) {
            log::debug!("Ignoring stale timer {}", handle.id());
            return Ok(());
        }

        self.pending = None;
        self.tick()
    }

    /// Apply the next frame while stopped
    ///
    /// Pauses first if playing. Fails with [`PlayerError::EndOfTimeline`]
    /// once every frame has been applied.
    pub fn step(&mut self) -> Result<()> {
        self.pause();

        if self.index >= self.timeline.len() {
            return Err(PlayerError::EndOfTimeline);
        }

        self.advance().map(|_| ())
    }

    /// Rebuild node state as of frame `target` by full replay
    pub fn jump(&mut self, target: usize) -> Result<()> {
        if target >= self.timeline.len() {
            return Err(PlayerError::OutOfBounds {
                index: target,
                len: self.timeline.len(),
            });
        }

        self.pause();

        let start = match self.snapshots.range(..=target).next_back() {
            Some((&at, snapshot)) => {
                log::debug!("Jump to {}: restoring snapshot at frame {}", target, at);
                self.nodes.restore(snapshot);
                at + 1
            }
            None => {
                log::debug!("Jump to {}: replaying from frame 0", target);
                self.nodes.reset();
                0
            }
        };

        for i in start..=target {
            if let Err(e) = self.apply_frame(i) {
                self.index = i;
                self.displayed = i;
                return Err(e);
            }
        }

        self.index = target;
        self.displayed = target;
        self.render();
        Ok(())
    }

    /// Jump to the last frame at or before simulation time `time`
    pub fn jump_to_time(&mut self, time: f64) -> Result<()> {
        let target = self.timeline.index_at_time(time).unwrap_or(0);
        self.jump(target)
    }

    pub fn reset_to_zero(&mut self) -> Result<()> {
        self.jump(0)
    }

    /// Select a node for detail display, or clear the selection
    pub fn select_node(&mut self, nid: Option<&str>) -> Result<()> {
        if let Some(nid) = nid {
            self.nodes.node(nid)?;
        }

        self.selected = nid.map(str::to_string);
        self.render();
        Ok(())
    }

    /// Cancel any pending tick; also done on drop
    pub fn shutdown(&mut self) {
        log::debug!("Shutting down player");
        self.pause();
    }

    // ======================================================
    // Accessors
    // ======================================================

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state == PlaybackState::Playing
    }

    /// Next frame a tick will apply
    pub fn index(&self) -> usize {
        self.index
    }

    /// Frame currently displayed
    pub fn displayed_index(&self) -> usize {
        self.displayed
    }

    pub fn current_frame(&self) -> &TimeFrame {
        &self.timeline[self.displayed]
    }

    /// Simulation time of the displayed frame
    pub fn current_time(&self) -> f64 {
        self.current_frame().time
    }

    pub fn is_finished(&self) -> bool {
        self.index >= self.timeline.len()
    }

    pub fn area(&self) -> Option<Area> {
        self.area
    }

    pub fn nodes(&self) -> &NodeTable {
        &self.nodes
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    pub fn config(&self) -> &PlayerConfig {
        &self.config
    }

    /// Node list labels, e.g. `"n1 [1/4]"`
    pub fn node_labels(&self) -> Vec<String> {
        self.nodes.display_labels()
    }

    pub fn selected_node(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn pending_timer(&self) -> Option<TimerHandle> {
        self.pending
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    /// Delay after a frame: the slowest configured class among its events
    pub fn frame_delay(&self, frame: &TimeFrame) -> Duration {
        self.config
            .step_delay
            .max_for(frame.events.iter().map(Event::delay_class))
    }

    // ======================================================
    // Internals
    // ======================================================

    fn tick(&mut self) -> Result<()> {
        if self.state != PlaybackState::Playing {
            return Ok(());
        }

        if self.index >= self.timeline.len() {
            log::info!("End of timeline reached at frame {}", self.displayed);
            self.pause();
            return Ok(());
        }

        let delay = match self.advance() {
            Ok(delay) => delay,
            Err(e) => {
                log::error!("Playback stopped at frame {}: {}", self.index, e);
                self.pause();
                return Err(e);
            }
        };

        if self.state == PlaybackState::Playing {
            self.pending = Some(self.scheduler.schedule(delay));
        }
        Ok(())
    }

    /// Apply `timeline[index]`, render it and move the cursor on
    fn advance(&mut self) -> Result<Duration> {
        let i = self.index;
        self.apply_frame(i)?;

        self.displayed = i;
        self.render();
        self.index = i + 1;

        Ok(self.frame_delay(&self.timeline[i]))
    }

    fn apply_frame(&mut self, i: usize) -> Result<()> {
        let frame = self.timeline.frame(i)?;
        log::debug!("Applying frame {} (t={}, {} events)", i, frame.time, frame.events.len());
        Executor::apply_events(&mut self.nodes, &frame.events)?;

        let interval = self.config.snapshot_interval;
        if interval > 0 && i % interval == 0 && !self.snapshots.contains_key(&i) {
            self.snapshots.insert(i, self.nodes.snapshot());
        }
        Ok(())
    }

    fn render(&mut self) {
        let frame = &self.timeline[self.displayed];
        let selected = self.selected.as_deref().and_then(|nid| self.nodes.get(nid));

        let view = FrameView {
            area: self.area,
            nodes: &self.nodes,
            index: self.displayed,
            frame,
            selected,
        };
        self.renderer.render(&view);
    }
}

impl<S: Scheduler, R: Renderer> Drop for Player<S, R> {
    fn drop(&mut self) {
        if let Some(handle) = self.pending.take() {
            self.scheduler.cancel(handle);
        }
    }
}
