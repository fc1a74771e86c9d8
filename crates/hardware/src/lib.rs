//! Memory prefetch decision engines.
//!
//! This crate decides which memory lines are worth prefetching, given a stream
//! of accesses. It contains the following:
//! 1. **Stride:** A per-instruction reference prediction table with a
//!    four-state confidence machine.
//! 2. **Spatial:** Spatial memory streaming over filter, active generation and
//!    pattern sequence tables, plus a Markov region transition predictor.
//! 3. **Dispatch:** A per-access dispatcher that owns the engines and the
//!    logical clock.
//! 4. **Replay:** A cache residency model, miss queue, trace loader and
//!    statistics for driving the engines from recorded traces.

/// Common types (addresses, saturating counter, errors).
pub mod common;
/// Configuration (defaults, enums, hierarchical config structures).
pub mod config;
/// Associative tables, cache model and prefetch engines.
pub mod core;
/// Trace loading and replay.
pub mod sim;
/// Replay statistics collection and reporting.
pub mod stats;

/// Root configuration type; use `Config::default()` or `Config::from_json`.
pub use crate::config::Config;
/// Per-access prefetch dispatcher.
pub use crate::core::units::prefetch::PrefetchDispatcher;
/// Trace-replay driver.
pub use crate::sim::Simulator;
