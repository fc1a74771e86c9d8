//! Least Recently Used (LRU) Replacement Policy.
//!
//! Keeps a usage stack per set. Touching or inserting a way moves it to the top
//! (Most Recently Used position); invalidating a way drops it to the bottom so
//! it is reused first. The bottom of the stack is the victim.
//!
//! # Performance
//!
//! - **Time Complexity:**
//!   - `touch()` / `reset()` / `invalidate()`: O(W) where W is the associativity
//!   - `victim()`: O(1)
//! - **Space Complexity:** O(S × W) where S is the number of sets

use super::ReplacementPolicy;

/// LRU Policy state.
#[derive(Debug)]
pub struct LruPolicy {
    /// A vector of usage stacks (one per set).
    /// Index 0 is MRU, last index is LRU.
    usage: Vec<Vec<usize>>,
}

impl LruPolicy {
    /// Creates a new LRU policy instance.
    ///
    /// # Arguments
    ///
    /// * `sets` - The number of sets in the table.
    /// * `ways` - The associativity (number of ways) of the table.
    pub fn new(sets: usize, ways: usize) -> Self {
        Self {
            usage: (0..sets).map(|_| (0..ways).collect()).collect(),
        }
    }

    fn promote(&mut self, set: usize, way: usize) {
        let stack = &mut self.usage[set];
        if let Some(pos) = stack.iter().position(|&x| x == way) {
            let _ = stack.remove(pos);
        }
        stack.insert(0, way);
    }
}

impl ReplacementPolicy for LruPolicy {
    fn touch(&mut self, set: usize, way: usize) {
        self.promote(set, way);
    }

    fn reset(&mut self, set: usize, way: usize) {
        self.promote(set, way);
    }

    fn invalidate(&mut self, set: usize, way: usize) {
        let stack = &mut self.usage[set];
        if let Some(pos) = stack.iter().position(|&x| x == way) {
            let _ = stack.remove(pos);
        }
        stack.push(way);
    }

    /// Returns the way at the bottom of the usage stack (LRU position).
    fn victim(&mut self, set: usize) -> usize {
        self.usage[set].last().copied().unwrap_or(0)
    }
}
