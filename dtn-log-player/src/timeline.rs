//! Timeline model
//!
//! A timeline is the ordered list of event frames. Timestamps are strictly
//! increasing: frames that share a timestamp in the log are merged into
//! one, keeping their events in encounter order.

use crate::types::{PlayerError, Result, TimeFrame};
use serde::{Deserialize, Serialize};
use std::ops::Index;

/// Ordered, merged sequence of time frames
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Timeline {
    frames: Vec<TimeFrame>,
}

impl Timeline {
    /// Sort frames by time and merge frames sharing a timestamp
    ///
    /// The sort is stable, so events of equal-time frames stay in the order
    /// they were encountered.
    pub fn from_frames(mut frames: Vec<TimeFrame>) -> Self {
        frames.sort_by(|a, b| a.time.total_cmp(&b.time));

        let mut merged: Vec<TimeFrame> = Vec::with_capacity(frames.len());
        for frame in frames {
            match merged.last_mut() {
                Some(last) if last.time == frame.time => last.events.extend(frame.events),
                _ => merged.push(frame),
            }
        }

        Self { frames: merged }
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn frames(&self) -> &[TimeFrame] {
        &self.frames
    }

    pub fn get(&self, index: usize) -> Option<&TimeFrame> {
        self.frames.get(index)
    }

    /// Like [`Timeline::get`], but reports an out-of-bounds error
    pub fn frame(&self, index: usize) -> Result<&TimeFrame> {
        self.frames.get(index).ok_or(PlayerError::OutOfBounds {
            index,
            len: self.frames.len(),
        })
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TimeFrame> {
        self.frames.iter()
    }

    /// All frame timestamps, ascending
    pub fn times(&self) -> impl Iterator<Item = f64> + '_ {
        self.frames.iter().map(|frame| frame.time)
    }

    /// Index of the last frame whose timestamp is `<= time`
    pub fn index_at_time(&self, time: f64) -> Option<usize> {
        let after = self.frames.partition_point(|frame| frame.time <= time);
        after.checked_sub(1)
    }

    /// Total number of events across all frames
    pub fn event_count(&self) -> usize {
        self.frames.iter().map(|frame| frame.events.len()).sum()
    }
}

impl Index<usize> for Timeline {
    type Output = TimeFrame;

    fn index(&self, index: usize) -> &TimeFrame {
        &self.frames[index]
    }
}

impl<'a> IntoIterator for &'a Timeline {
    type Item = &'a TimeFrame;
    type IntoIter = std::slice::Iter<'a, TimeFrame>;

    fn into_iter(self) -> Self::IntoIter {
        self.frames.iter()
    }
}
