//! Table Replacement Policies.
//!
//! Implements the algorithms that pick a victim way when a full set of an
//! [`AssociativeTable`](super::AssociativeTable) must make room for a new entry.
//! The same policies drive the prefetcher tables and the cache model.
//!
//! # Policies
//!
//! - `Fifo`: oldest insertion is evicted.
//! - `Lru`: Least Recently Used.
//! - `Mru`: Most Recently Used.
//! - `Plru`: Pseudo-LRU (one bit per way).
//! - `Random`: Random selection.

/// First-In, First-Out replacement policy.
pub mod fifo;

/// Least Recently Used replacement policy.
pub mod lru;

/// Most Recently Used replacement policy.
pub mod mru;

/// Pseudo-LRU (bit-vector) replacement policy.
pub mod plru;

/// Random replacement policy.
pub mod random;

pub use fifo::FifoPolicy;
pub use lru::LruPolicy;
pub use mru::MruPolicy;
pub use plru::PlruPolicy;
pub use random::RandomPolicy;

use crate::config::ReplacementPolicy as PolicyType;

/// Trait for table replacement policies.
///
/// Mirrors the replacement-data lifecycle of an associative store: a way is
/// `reset` when an entry is inserted into it, `touch`ed when the entry is
/// accessed, and `invalidate`d when the entry is freed.
pub trait ReplacementPolicy: Send + Sync {
    /// Records an access to `way` of `set`.
    fn touch(&mut self, set: usize, way: usize);

    /// Records the insertion of a fresh entry into `way` of `set`.
    fn reset(&mut self, set: usize, way: usize);

    /// Records that `way` of `set` no longer holds an entry.
    fn invalidate(&mut self, set: usize, way: usize);

    /// Selects the way to evict from a full set.
    ///
    /// # Returns
    ///
    /// The index of the way to evict.
    fn victim(&mut self, set: usize) -> usize;
}

/// Builds the policy selected by configuration.
///
/// # Arguments
///
/// * `kind` - Policy selected in the configuration.
/// * `sets` - Number of sets in the table.
/// * `ways` - Associativity of the table.
pub fn build(kind: PolicyType, sets: usize, ways: usize) -> Box<dyn ReplacementPolicy> {
    match kind {
        PolicyType::Fifo => Box::new(FifoPolicy::new(sets, ways)),
        PolicyType::Random => Box::new(RandomPolicy::new(sets, ways)),
        PolicyType::Plru => Box::new(PlruPolicy::new(sets, ways)),
        PolicyType::Lru => Box::new(LruPolicy::new(sets, ways)),
        PolicyType::Mru => Box::new(MruPolicy::new(sets, ways)),
    }
}
