//! Pseudo-LRU (PLRU) Replacement Policy.
//!
//! Approximates LRU with one "recently used" bit per way. Touching a way sets
//! its bit; when every bit of a set would be set, the set is cleared down to
//! the way just touched. The victim is the first way whose bit is clear.
//!
//! # Performance
//!
//! - **Time Complexity:**
//!   - `touch()` / `reset()` / `invalidate()`: O(1)
//!   - `victim()`: O(W)
//! - **Space Complexity:** O(S) words; associativity is limited to [`MAX_WAYS`]

use super::ReplacementPolicy;

/// Widest set a PLRU usage word can track. Configuration validation rejects
/// wider PLRU tables.
pub const MAX_WAYS: usize = 64;

/// PLRU Policy state.
#[derive(Debug)]
pub struct PlruPolicy {
    /// Recently-used bitmask for each set.
    usage: Vec<u64>,
    /// Number of ways per set (at most [`MAX_WAYS`]).
    ways: usize,
}

impl PlruPolicy {
    /// Creates a new PLRU policy instance.
    ///
    /// # Arguments
    ///
    /// * `sets` - The number of sets in the table.
    /// * `ways` - The associativity (number of ways), at most [`MAX_WAYS`].
    pub fn new(sets: usize, ways: usize) -> Self {
        Self {
            usage: vec![0; sets],
            ways: ways.min(MAX_WAYS),
        }
    }

    const fn full_mask(&self) -> u64 {
        if self.ways >= MAX_WAYS {
            u64::MAX
        } else {
            (1u64 << self.ways) - 1
        }
    }
}

impl ReplacementPolicy for PlruPolicy {
    fn touch(&mut self, set: usize, way: usize) {
        if way >= self.ways {
            return;
        }
        let mask = 1u64 << way;
        self.usage[set] |= mask;
        if self.usage[set] & self.full_mask() == self.full_mask() {
            self.usage[set] = mask;
        }
    }

    fn reset(&mut self, set: usize, way: usize) {
        self.touch(set, way);
    }

    fn invalidate(&mut self, set: usize, way: usize) {
        if way < self.ways {
            self.usage[set] &= !(1u64 << way);
        }
    }

    /// Returns the first way whose recently-used bit is clear.
    fn victim(&mut self, set: usize) -> usize {
        (0..self.ways)
            .find(|&i| (self.usage[set] >> i) & 1 == 0)
            .unwrap_or(0)
    }
}
