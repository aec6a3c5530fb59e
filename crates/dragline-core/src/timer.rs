//! Timer system for dragline.
//!
//! Provides one-shot and repeating timers driven by the host. The manager never
//! sleeps or spawns threads: the host calls [`TimerManager::process_expired`]
//! with the current instant and dispatches the returned ids to their owners.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::time::{Duration, Instant};

use slotmap::{SlotMap, new_key_type};

use crate::error::{Result, TimerError};
use crate::logging::targets;

new_key_type! {
    /// A unique identifier for a timer.
    pub struct TimerId;
}

/// The type of timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    /// Fires once after the specified duration.
    OneShot,
    /// Fires repeatedly at the specified interval.
    Repeating,
}

/// Internal timer data.
#[derive(Debug)]
struct TimerData {
    /// When this timer should next fire.
    next_fire: Instant,
    /// The interval for repeating timers.
    interval: Duration,
    kind: TimerKind,
}

/// An entry in the timer queue (min-heap by fire time).
#[derive(Debug, Clone, Copy)]
struct TimerQueueEntry {
    id: TimerId,
    fire_time: Instant,
    /// Insertion sequence, so timers due at the same instant fire in start order.
    seq: u64,
}

impl PartialEq for TimerQueueEntry {
    fn eq(&self, other: &Self) -> bool {
        self.fire_time == other.fire_time && self.seq == other.seq
    }
}

impl Eq for TimerQueueEntry {}

impl PartialOrd for TimerQueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TimerQueueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse order for min-heap (BinaryHeap is max-heap by default).
        other
            .fire_time
            .cmp(&self.fire_time)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Manages the timers owned by drag sources.
#[derive(Debug, Default)]
pub struct TimerManager {
    /// All registered timers.
    timers: SlotMap<TimerId, TimerData>,
    /// Priority queue of pending timer fires (min-heap by fire time).
    queue: BinaryHeap<TimerQueueEntry>,
    next_seq: u64,
}

impl TimerManager {
    /// Create a new timer manager.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a one-shot timer that fires `duration` after now.
    pub fn start_one_shot(&mut self, duration: Duration) -> TimerId {
        self.start_one_shot_at(Instant::now(), duration)
    }

    /// Start a one-shot timer that fires `duration` after `now`.
    ///
    /// Returns the timer ID that can be used to cancel the timer.
    pub fn start_one_shot_at(&mut self, now: Instant, duration: Duration) -> TimerId {
        self.insert(now, duration, TimerKind::OneShot)
    }

    /// Start a repeating timer that fires every `interval` from now.
    pub fn start_repeating(&mut self, interval: Duration) -> TimerId {
        self.start_repeating_at(Instant::now(), interval)
    }

    /// Start a repeating timer anchored at `now`.
    ///
    /// The first fire occurs after `interval`.
    pub fn start_repeating_at(&mut self, now: Instant, interval: Duration) -> TimerId {
        self.insert(now, interval, TimerKind::Repeating)
    }

    fn insert(&mut self, now: Instant, interval: Duration, kind: TimerKind) -> TimerId {
        let next_fire = now + interval;
        let id = self.timers.insert(TimerData {
            next_fire,
            interval,
            kind,
        });
        self.push(id, next_fire);
        tracing::trace!(target: targets::TIMER, ?id, ?kind, ?interval, "timer started");
        id
    }

    fn push(&mut self, id: TimerId, fire_time: Instant) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.queue.push(TimerQueueEntry { id, fire_time, seq });
    }

    /// Stop and remove a timer.
    ///
    /// Returns `Ok(())` if the timer was found and removed, or an error if not found.
    pub fn stop(&mut self, id: TimerId) -> Result<()> {
        match self.timers.remove(id) {
            Some(_) => {
                tracing::trace!(target: targets::TIMER, ?id, "timer stopped");
                Ok(())
            }
            None => Err(TimerError::InvalidTimerId.into()),
        }
    }

    /// Check if a timer is currently active.
    pub fn is_active(&self, id: TimerId) -> bool {
        self.timers.contains_key(id)
    }

    /// Get the kind of an active timer.
    pub fn kind(&self, id: TimerId) -> Option<TimerKind> {
        self.timers.get(id).map(|t| t.kind)
    }

    /// Get the duration from `now` until the next timer fires, if any.
    pub fn time_until_next(&mut self, now: Instant) -> Option<Duration> {
        self.discard_stale();
        self.queue
            .peek()
            .map(|entry| entry.fire_time.saturating_duration_since(now))
    }

    /// Drop queue entries whose timers were stopped or rescheduled.
    fn discard_stale(&mut self) {
        while let Some(entry) = self.queue.peek() {
            let live = self
                .timers
                .get(entry.id)
                .is_some_and(|t| t.next_fire == entry.fire_time);
            if live {
                break;
            }
            self.queue.pop();
        }
    }

    /// Process all timers due at `now`.
    ///
    /// Returns the ids that fired, earliest first. One-shot timers are removed;
    /// repeating timers are rescheduled one interval after `now`.
    #[tracing::instrument(skip(self), target = "dragline_core::timer", level = "trace")]
    pub fn process_expired(&mut self, now: Instant) -> Vec<TimerId> {
        let mut fired = Vec::new();
        let mut rescheduled = Vec::new();

        while let Some(entry) = self.queue.peek().copied() {
            if entry.fire_time > now {
                break;
            }
            self.queue.pop();

            let Some(timer) = self.timers.get_mut(entry.id) else {
                continue;
            };
            if timer.next_fire != entry.fire_time {
                continue;
            }

            tracing::trace!(target: targets::TIMER, id = ?entry.id, "timer fired");
            fired.push(entry.id);

            match timer.kind {
                TimerKind::OneShot => {
                    self.timers.remove(entry.id);
                }
                TimerKind::Repeating => {
                    timer.next_fire = now + timer.interval;
                    rescheduled.push((entry.id, timer.next_fire));
                }
            }
        }

        for (id, fire_time) in rescheduled {
            self.push(id, fire_time);
        }

        fired
    }

    /// Get the number of active timers.
    pub fn active_count(&self) -> usize {
        self.timers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;

    #[test]
    fn test_one_shot_fires_once() {
        let start = Instant::now();
        let mut timers = TimerManager::new();
        let id = timers.start_one_shot_at(start, Duration::from_millis(10));

        assert!(timers.process_expired(start).is_empty());
        assert_eq!(timers.process_expired(start + Duration::from_millis(10)), vec![id]);
        assert!(!timers.is_active(id));
        assert!(timers.process_expired(start + Duration::from_millis(50)).is_empty());
    }

    #[test]
    fn test_zero_delay_fires_on_next_process() {
        let start = Instant::now();
        let mut timers = TimerManager::new();
        let id = timers.start_one_shot_at(start, Duration::ZERO);
        assert_eq!(timers.process_expired(start), vec![id]);
    }

    #[test]
    fn test_repeating_reschedules() {
        let start = Instant::now();
        let mut timers = TimerManager::new();
        let id = timers.start_repeating_at(start, Duration::from_millis(10));

        assert_eq!(timers.process_expired(start + Duration::from_millis(10)), vec![id]);
        assert!(timers.is_active(id));
        assert!(timers.process_expired(start + Duration::from_millis(15)).is_empty());
        assert_eq!(timers.process_expired(start + Duration::from_millis(20)), vec![id]);
        assert_eq!(timers.kind(id), Some(TimerKind::Repeating));
    }

    #[test]
    fn test_stop() {
        let start = Instant::now();
        let mut timers = TimerManager::new();
        let id = timers.start_repeating_at(start, Duration::from_millis(10));

        assert!(timers.stop(id).is_ok());
        assert_eq!(
            timers.stop(id),
            Err(CoreError::Timer(TimerError::InvalidTimerId))
        );
        assert!(timers.process_expired(start + Duration::from_secs(1)).is_empty());
        assert_eq!(timers.active_count(), 0);
    }

    #[test]
    fn test_same_instant_fires_in_start_order() {
        let start = Instant::now();
        let mut timers = TimerManager::new();
        let a = timers.start_one_shot_at(start, Duration::from_millis(5));
        let b = timers.start_one_shot_at(start, Duration::from_millis(5));
        let c = timers.start_one_shot_at(start, Duration::from_millis(1));

        assert_eq!(
            timers.process_expired(start + Duration::from_millis(5)),
            vec![c, a, b]
        );
    }

    #[test]
    fn test_time_until_next() {
        let start = Instant::now();
        let mut timers = TimerManager::new();
        assert_eq!(timers.time_until_next(start), None);

        let first = timers.start_one_shot_at(start, Duration::from_millis(5));
        timers.start_one_shot_at(start, Duration::from_millis(20));
        assert_eq!(timers.time_until_next(start), Some(Duration::from_millis(5)));

        timers.stop(first).unwrap();
        assert_eq!(timers.time_until_next(start), Some(Duration::from_millis(20)));
        assert_eq!(
            timers.time_until_next(start + Duration::from_secs(1)),
            Some(Duration::ZERO)
        );
    }
}
