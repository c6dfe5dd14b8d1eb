//! Virtual-clock timer queue.
//!
//! Stands in for `setTimeout`: tasks are scheduled relative to the queue's
//! current time and fire when the clock is advanced past their deadline.
//! Timers cannot be cancelled and are never de-duplicated.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::time::Duration;

/// Identifier returned by [`TimerQueue::schedule`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

#[derive(Debug)]
struct Entry<T> {
    deadline: Duration,
    id: TimerId,
    task: T,
}

// Ordered by deadline, then by scheduling order; the task is not compared.
impl<T> PartialEq for Entry<T> {
    fn eq(&self, other: &Self) -> bool {
        self.deadline == other.deadline && self.id == other.id
    }
}

impl<T> Eq for Entry<T> {}

impl<T> PartialOrd for Entry<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Entry<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.deadline
            .cmp(&other.deadline)
            .then_with(|| self.id.cmp(&other.id))
    }
}

/// One-shot timers on a virtual clock starting at zero.
#[derive(Debug)]
pub struct TimerQueue<T> {
    now: Duration,
    next_id: u64,
    pending: BinaryHeap<Reverse<Entry<T>>>,
}

impl<T> Default for TimerQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> TimerQueue<T> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            now: Duration::ZERO,
            next_id: 0,
            pending: BinaryHeap::new(),
        }
    }

    /// Current virtual time.
    #[must_use]
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Number of timers that have not fired yet.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Deadline of the earliest pending timer.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Duration> {
        self.pending.peek().map(|Reverse(entry)| entry.deadline)
    }

    /// Schedule `task` to fire `delay` after the current time.
    pub fn schedule(&mut self, delay: Duration, task: T) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.pending.push(Reverse(Entry {
            deadline: self.now.saturating_add(delay),
            id,
            task,
        }));
        id
    }

    /// Pop the earliest timer due at or before `until`, moving the clock to
    /// its deadline.
    ///
    /// Callers advancing to a target time call this in a loop, running each
    /// task before popping the next, so tasks scheduled by a running task
    /// fire in the same window when they fall due inside it. Finish with
    /// [`TimerQueue::settle`].
    pub fn pop_due(&mut self, until: Duration) -> Option<(TimerId, T)> {
        if self.next_deadline()? > until {
            return None;
        }
        let Reverse(entry) = self.pending.pop()?;
        self.now = self.now.max(entry.deadline);
        Some((entry.id, entry.task))
    }

    /// Move the clock to `until` once every due timer has been popped.
    pub fn settle(&mut self, until: Duration) {
        self.now = self.now.max(until);
    }
}
