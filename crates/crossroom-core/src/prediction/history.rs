//! Bounded FIFO history.

use std::collections::{VecDeque, vec_deque};

/// Insertion-ordered buffer that evicts its oldest entry once full.
#[derive(Debug, Clone)]
pub(crate) struct History<T> {
    entries: VecDeque<T>,
    capacity: usize,
}

impl<T> History<T> {
    pub(crate) fn new(capacity: usize) -> Self {
        Self { entries: VecDeque::with_capacity(capacity), capacity }
    }

    /// Append `entry`, evicting from the front while over capacity.
    pub(crate) fn push(&mut self, entry: T) {
        if self.capacity == 0 {
            return;
        }
        while self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    pub(crate) fn retain(&mut self, keep: impl FnMut(&T) -> bool) {
        self.entries.retain(keep);
    }

    pub(crate) fn iter(&self) -> vec_deque::Iter<'_, T> {
        self.entries.iter()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}
