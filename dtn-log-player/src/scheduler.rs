//! Cancellable timers
//!
//! The player never sleeps or owns an event loop. It asks a [`Scheduler`]
//! for a timer and expects the host to hand the [`TimerHandle`] back to
//! [`Player::on_timer`](crate::Player::on_timer) once the delay has passed.
//!
//! [`TimerQueue`] is a deterministic implementation on a virtual clock. The
//! host pops due timers from it in order and decides itself whether to wait
//! in real time before firing them.

use std::collections::BTreeMap;
use std::time::Duration;

/// Identifies one scheduled timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(u64);

impl TimerHandle {
    pub fn id(self) -> u64 {
        self.0
    }
}

/// Host-provided timer service
///
/// `cancel` must be idempotent: cancelling an unknown, already fired or
/// already cancelled handle does nothing.
pub trait Scheduler {
    /// Arrange for `handle` to be delivered back after `delay`
    fn schedule(&mut self, delay: Duration) -> TimerHandle;

    /// Withdraw a timer
    fn cancel(&mut self, handle: TimerHandle);
}

/// A timer popped from a [`TimerQueue`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timer {
    pub handle: TimerHandle,
    /// Virtual time at which the timer fires
    pub due: Duration,
    /// Delay the timer was scheduled with
    pub delay: Duration,
}

/// Deterministic timer queue on a virtual clock
#[derive(Debug, Default)]
pub struct TimerQueue {
    now: Duration,
    next_id: u64,
    /// Keyed by (due time, id) so equal due times fire in scheduling order
    pending: BTreeMap<(Duration, u64), Duration>,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current virtual time
    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn is_idle(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn is_pending(&self, handle: TimerHandle) -> bool {
        self.pending.keys().any(|&(_, id)| id == handle.0)
    }

    /// The next timer to fire, without removing it
    pub fn peek(&self) -> Option<Timer> {
        self.pending
            .iter()
            .next()
            .map(|(&(due, id), &delay)| Timer {
                handle: TimerHandle(id),
                due,
                delay,
            })
    }

    /// Remove the next timer and advance the clock to its due time
    pub fn pop_due(&mut self) -> Option<Timer> {
        let ((due, id), delay) = self.pending.pop_first()?;
        self.now = due;
        Some(Timer {
            handle: TimerHandle(id),
            due,
            delay,
        })
    }
}

impl Scheduler for TimerQueue {
    fn schedule(&mut self, delay: Duration) -> TimerHandle {
        let id = self.next_id;
        self.next_id += 1;
        self.pending.insert((self.now + delay, id), delay);
        log::trace!("Scheduled timer {} in {:?}", id, delay);
        TimerHandle(id)
    }

    fn cancel(&mut self, handle: TimerHandle) {
        let before = self.pending.len();
        self.pending.retain(|&(_, id), _| id != handle.0);
        if self.pending.len() < before {
            log::trace!("Cancelled timer {}", handle.0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timers_fire_in_due_order() {
        let mut queue = TimerQueue::new();
        let slow = queue.schedule(Duration::from_millis(300));
        let fast = queue.schedule(Duration::from_millis(1));

        let first = queue.pop_due().unwrap();
        assert_eq!(first.handle, fast);
        assert_eq!(queue.now(), Duration::from_millis(1));

        let second = queue.pop_due().unwrap();
        assert_eq!(second.handle, slow);
        assert_eq!(second.delay, Duration::from_millis(300));
        assert!(queue.pop_due().is_none());
    }

    #[test]
    fn test_delay_is_relative_to_virtual_now() {
        let mut queue = TimerQueue::new();
        queue.schedule(Duration::from_millis(10));
        queue.pop_due();

        queue.schedule(Duration::from_millis(5));
        assert_eq!(queue.peek().unwrap().due, Duration::from_millis(15));
    }

    #[test]
    fn test_cancel_is_idempotent() {
        let mut queue = TimerQueue::new();
        let handle = queue.schedule(Duration::from_millis(10));
        assert!(queue.is_pending(handle));

        queue.cancel(handle);
        queue.cancel(handle);
        assert!(queue.is_idle());

        let fired = queue.schedule(Duration::ZERO);
        queue.pop_due();
        queue.cancel(fired);
        assert!(queue.is_idle());
    }

    #[test]
    fn test_equal_due_times_keep_scheduling_order() {
        let mut queue = TimerQueue::new();
        let a = queue.schedule(Duration::from_millis(2));
        let b = queue.schedule(Duration::from_millis(2));

        assert_eq!(queue.pop_due().unwrap().handle, a);
        assert_eq!(queue.pop_due().unwrap().handle, b);
    }
}
