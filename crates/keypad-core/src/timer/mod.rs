//! Tag-addressable delayed-action queue.
//!
//! # How it works (for beginners)
//!
//! [`TimerService`] does not own a clock or a thread.  The owner schedules an
//! *action* (any value, typically a small enum) to become due at an
//! [`Instant`], and later asks "what is due at `now`?" via
//! [`TimerService::pop_due`].  An event loop sleeps until
//! [`TimerService::next_deadline`], then drains the due actions and executes
//! them itself.  Because the caller runs the actions, they execute on the
//! caller's thread, strictly serialized with everything else it does.
//!
//! Every entry carries a *tag*.  [`TimerService::cancel`] removes all pending
//! entries under a tag at once; scheduling under a tag that already has
//! entries does not replace them.
//!
//! # Ordering
//!
//! Entries are keyed by `(fire_at, sequence)`.  The sequence number increases
//! with every `schedule` call, so entries that fall due at the same instant
//! come out in the order they were scheduled.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

/// A pending delayed action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerEntry<T, A> {
    pub tag: T,
    pub fire_at: Instant,
    pub action: A,
}

/// Single-threaded tag-addressable timer queue.
#[derive(Debug)]
pub struct TimerService<T, A> {
    entries: BTreeMap<(Instant, u64), TimerEntry<T, A>>,
    next_seq: u64,
}

impl<T, A> Default for TimerService<T, A> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
            next_seq: 0,
        }
    }
}

impl<T: PartialEq, A> TimerService<T, A> {
    /// Creates an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedules `action` under `tag` to fall due at `fire_at`.
    pub fn schedule(&mut self, tag: T, fire_at: Instant, action: A) {
        let seq = self.next_seq;
        self.next_seq = self.next_seq.wrapping_add(1);
        self.entries.insert((fire_at, seq), TimerEntry { tag, fire_at, action });
    }

    /// Schedules `action` under `tag` to fall due `delay` after `now`.
    pub fn schedule_after(&mut self, now: Instant, tag: T, delay: Duration, action: A) {
        self.schedule(tag, now + delay, action);
    }

    /// Removes every pending entry under `tag`.
    ///
    /// Returns the number of entries removed.
    pub fn cancel(&mut self, tag: &T) -> usize {
        self.cancel_where(|t| t == tag)
    }

    /// Removes every pending entry whose tag satisfies `predicate`.
    ///
    /// Returns the number of entries removed.
    pub fn cancel_where<F>(&mut self, mut predicate: F) -> usize
    where
        F: FnMut(&T) -> bool,
    {
        let before = self.entries.len();
        self.entries.retain(|_, entry| !predicate(&entry.tag));
        before - self.entries.len()
    }

    /// Returns `true` if at least one entry is pending under `tag`.
    pub fn is_pending(&self, tag: &T) -> bool {
        self.entries.values().any(|entry| entry.tag == *tag)
    }

    /// The earliest pending fire time, if any.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.entries.keys().next().map(|(fire_at, _)| *fire_at)
    }

    /// Removes and returns the earliest entry due at or before `now`.
    pub fn pop_due(&mut self, now: Instant) -> Option<TimerEntry<T, A>> {
        match self.entries.first_key_value() {
            Some(((fire_at, _), _)) if *fire_at <= now => {
                self.entries.pop_first().map(|(_, entry)| entry)
            }
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
