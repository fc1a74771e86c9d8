//! Random Replacement Policy.
//!
//! Evicts a pseudo-random way. A xorshift generator with a fixed seed keeps
//! replays of the same trace reproducible.

use super::ReplacementPolicy;

/// Fixed generator seed.
const SEED: u64 = 123_456_789;

/// Random Policy state.
#[derive(Debug)]
pub struct RandomPolicy {
    /// Number of ways per set.
    ways: usize,
    /// Internal state for the pseudo-random number generator.
    state: u64,
}

impl RandomPolicy {
    /// Creates a new Random policy instance.
    ///
    /// # Arguments
    ///
    /// * `_sets` - The number of sets (unused by this policy).
    /// * `ways` - The associativity (number of ways) of the table.
    pub const fn new(_sets: usize, ways: usize) -> Self {
        Self { ways, state: SEED }
    }

    const fn next(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        x
    }
}

impl ReplacementPolicy for RandomPolicy {
    fn touch(&mut self, _set: usize, _way: usize) {}

    fn reset(&mut self, _set: usize, _way: usize) {}

    fn invalidate(&mut self, _set: usize, _way: usize) {}

    fn victim(&mut self, _set: usize) -> usize {
        if self.ways == 0 {
            return 0;
        }
        (self.next() as usize) % self.ways
    }
}
