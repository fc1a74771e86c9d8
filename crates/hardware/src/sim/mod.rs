//! Trace replay.
//!
//! Loads recorded access streams and replays them through the cache model and
//! the prefetch dispatcher.

/// Replay driver.
pub mod simulator;

/// Access trace format and loading.
pub mod trace;

pub use self::simulator::Simulator;
pub use self::trace::{AccessRecord, load_trace, parse_trace};
