//! Functional units.
//!
//! This module contains the set-associative table shared by every structure,
//! the cache residency model built on it, and the prefetch engines.

/// Cache residency model and miss queue.
pub mod cache;

/// Prefetch prediction engines (stride, spatial) and their dispatcher.
pub mod prefetch;

/// Set-associative table and replacement policies.
pub mod table;
