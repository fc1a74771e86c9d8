//! Prefetch hardware models.
//!
//! This module contains the storage structures and engines modelled by the
//! crate: the generic associative table, the cache residency model and the
//! prefetch prediction engines.

/// Functional units (tables, cache, prefetchers).
pub mod units;
