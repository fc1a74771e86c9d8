//! Miss Queue.
//!
//! Bounded FIFO of line fills that have been requested but have not arrived.
//! Demand misses and issued prefetches both wait here until their ready time,
//! and the spatial engine treats a queued line as still belonging to its
//! generation.

use std::collections::VecDeque;

/// One outstanding line fill.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PendingFill {
    /// Line-aligned address being filled.
    pub line: u64,
    /// Security domain of the request.
    pub secure: bool,
    /// Logical time at which the line arrives.
    pub ready_at: u64,
    /// True when the fill was issued by a prefetcher.
    pub prefetch: bool,
}

/// Bounded queue of outstanding fills.
#[derive(Clone, Debug)]
pub struct MissQueue {
    entries: VecDeque<PendingFill>,
    capacity: usize,
    line_bytes: u64,
}

impl MissQueue {
    /// Creates an empty queue.
    ///
    /// # Arguments
    ///
    /// * `capacity` - Maximum number of outstanding fills.
    /// * `line_bytes` - Cache line size; queued addresses are aligned to it.
    pub fn new(capacity: usize, line_bytes: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
            line_bytes: line_bytes.max(1) as u64,
        }
    }

    #[inline]
    const fn align(&self, addr: u64) -> u64 {
        addr - addr % self.line_bytes
    }

    /// Maximum number of outstanding fills.
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of outstanding fills.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing is outstanding.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// True when no further fill can be queued.
    pub fn is_full(&self) -> bool {
        self.entries.len() >= self.capacity
    }

    /// True when a fill for the line containing `addr` is outstanding.
    pub fn contains(&self, addr: u64, secure: bool) -> bool {
        let line = self.align(addr);
        self.entries
            .iter()
            .any(|f| f.line == line && f.secure == secure)
    }

    /// Queues a fill for the line containing `addr`.
    ///
    /// Returns `false`, leaving the queue untouched, when it is full.
    pub fn push(&mut self, addr: u64, secure: bool, ready_at: u64, prefetch: bool) -> bool {
        if self.is_full() {
            return false;
        }
        self.entries.push_back(PendingFill {
            line: self.align(addr),
            secure,
            ready_at,
            prefetch,
        });
        true
    }

    /// Removes and returns every fill whose ready time is at or before `now`,
    /// oldest first.
    pub fn drain_ready(&mut self, now: u64) -> Vec<PendingFill> {
        let mut ready = Vec::new();
        self.entries.retain(|f| {
            if f.ready_at <= now {
                ready.push(*f);
                false
            } else {
                true
            }
        });
        ready
    }

    /// Outstanding fills, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &PendingFill> {
        self.entries.iter()
    }
}
