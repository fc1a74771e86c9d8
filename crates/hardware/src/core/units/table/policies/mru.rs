//! Most Recently Used (MRU) Replacement Policy.
//!
//! Evicts the entry that was touched most recently. Useful for cyclic access
//! patterns larger than the table, where the newest entry is the least likely
//! to be needed again soon.

use super::ReplacementPolicy;

/// MRU Policy state.
#[derive(Debug)]
pub struct MruPolicy {
    /// Usage stacks (one per set). Index 0 is the most recent way.
    usage: Vec<Vec<usize>>,
    /// Invalidated ways waiting to be refilled, per set.
    free: Vec<Vec<usize>>,
}

impl MruPolicy {
    /// Creates a new MRU policy instance.
    ///
    /// # Arguments
    ///
    /// * `sets` - The number of sets in the table.
    /// * `ways` - The associativity (number of ways) of the table.
    pub fn new(sets: usize, ways: usize) -> Self {
        Self {
            usage: (0..sets).map(|_| (0..ways).collect()).collect(),
            free: vec![Vec::new(); sets],
        }
    }

    fn promote(&mut self, set: usize, way: usize) {
        let stack = &mut self.usage[set];
        if let Some(pos) = stack.iter().position(|&x| x == way) {
            let _ = stack.remove(pos);
        }
        stack.insert(0, way);
        self.free[set].retain(|&w| w != way);
    }
}

impl ReplacementPolicy for MruPolicy {
    fn touch(&mut self, set: usize, way: usize) {
        self.promote(set, way);
    }

    fn reset(&mut self, set: usize, way: usize) {
        self.promote(set, way);
    }

    fn invalidate(&mut self, set: usize, way: usize) {
        if !self.free[set].contains(&way) {
            self.free[set].push(way);
        }
    }

    /// Returns a freed way if one exists, otherwise the most recently used way.
    fn victim(&mut self, set: usize) -> usize {
        if let Some(&way) = self.free[set].first() {
            return way;
        }
        self.usage[set].first().copied().unwrap_or(0)
    }
}
