//! Cancellable timer table.
//!
//! Sans-IO: the scheduler never sleeps or spawns. Owners schedule a key with a
//! deadline, keep the returned [`TimerHandle`], and feed the current time to
//! [`Scheduler::pop_expired`] from their tick handler.
//!
//! # Invariants
//!
//! - A cancelled handle never fires
//! - Each handle fires at most once
//! - Expired keys are returned in deadline order, ties in scheduling order

use std::collections::{BTreeMap, HashMap};

/// Token identifying one scheduled timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(u64);

/// Deadline-ordered set of pending timers carrying keys of type `K`.
#[derive(Debug, Clone)]
pub struct Scheduler<K, I> {
    next_handle: u64,
    queue: BTreeMap<(I, TimerHandle), K>,
    deadlines: HashMap<TimerHandle, I>,
}

impl<K, I> Scheduler<K, I>
where
    I: Copy + Ord,
{
    /// Create an empty scheduler.
    pub fn new() -> Self {
        Self { next_handle: 0, queue: BTreeMap::new(), deadlines: HashMap::new() }
    }

    /// Schedule `key` to fire at `deadline`.
    pub fn schedule(&mut self, key: K, deadline: I) -> TimerHandle {
        let handle = TimerHandle(self.next_handle);
        self.next_handle += 1;

        self.queue.insert((deadline, handle), key);
        self.deadlines.insert(handle, deadline);
        handle
    }

    /// Cancel a pending timer. Returns false if it already fired or was
    /// cancelled.
    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        match self.deadlines.remove(&handle) {
            Some(deadline) => self.queue.remove(&(deadline, handle)).is_some(),
            None => false,
        }
    }

    /// Whether `handle` is still pending.
    pub fn is_scheduled(&self, handle: TimerHandle) -> bool {
        self.deadlines.contains_key(&handle)
    }

    /// Earliest pending deadline.
    pub fn next_deadline(&self) -> Option<I> {
        self.queue.keys().next().map(|(deadline, _)| *deadline)
    }

    /// Remove and return every key whose deadline is `<= now`.
    pub fn pop_expired(&mut self, now: I) -> Vec<K> {
        let mut expired = Vec::new();

        while let Some(entry) = self.queue.first_entry() {
            let (deadline, handle) = *entry.key();
            if deadline > now {
                break;
            }
            let key = entry.remove();
            self.deadlines.remove(&handle);
            expired.push(key);
        }

        expired
    }

    /// Cancel every pending timer.
    pub fn clear(&mut self) {
        self.queue.clear();
        self.deadlines.clear();
    }

    /// Number of pending timers.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Whether no timers are pending.
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

impl<K, I> Default for Scheduler<K, I>
where
    I: Copy + Ord,
{
    fn default() -> Self {
        Self::new()
    }
}
