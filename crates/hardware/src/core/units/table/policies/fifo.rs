//! First-In, First-Out (FIFO) Replacement Policy.
//!
//! Evicts the entry inserted longest ago, regardless of how recently it was
//! accessed. Each way carries its insertion stamp; touching an entry does not
//! change it.
//!
//! # Performance
//!
//! - **Time Complexity:**
//!   - `touch()`: O(1) (no-op)
//!   - `reset()` / `invalidate()`: O(1)
//!   - `victim()`: O(W) where W is the associativity
//! - **Space Complexity:** O(S × W)

use super::ReplacementPolicy;

/// FIFO Policy state.
#[derive(Debug)]
pub struct FifoPolicy {
    /// Insertion stamp of every way, `sets * ways` long. Zero means empty.
    inserted: Vec<u64>,
    /// Number of ways per set.
    ways: usize,
    /// Monotonic insertion clock.
    clock: u64,
}

impl FifoPolicy {
    /// Creates a new FIFO policy instance.
    ///
    /// # Arguments
    ///
    /// * `sets` - The number of sets in the table.
    /// * `ways` - The associativity (number of ways) of the table.
    pub fn new(sets: usize, ways: usize) -> Self {
        Self {
            inserted: vec![0; sets * ways],
            ways,
            clock: 0,
        }
    }
}

impl ReplacementPolicy for FifoPolicy {
    fn touch(&mut self, _set: usize, _way: usize) {}

    fn reset(&mut self, set: usize, way: usize) {
        self.clock += 1;
        self.inserted[set * self.ways + way] = self.clock;
    }

    fn invalidate(&mut self, set: usize, way: usize) {
        self.inserted[set * self.ways + way] = 0;
    }

    /// Returns the way with the oldest insertion stamp (first one on ties).
    fn victim(&mut self, set: usize) -> usize {
        let base = set * self.ways;
        self.inserted[base..base + self.ways]
            .iter()
            .enumerate()
            .min_by_key(|&(_, stamp)| *stamp)
            .map_or(0, |(way, _)| way)
    }
}
