//! Error types.
//!
//! This module defines every failure the library reports. It provides:
//! 1. **Configuration errors:** Geometry that cannot be modelled (for example a
//!    spatial region size that is not a power of two). These are fatal at
//!    construction time.
//! 2. **Prefetch errors:** Invariant violations inside an engine, such as a
//!    full table that yields no victim slot.
//! 3. **Trace errors:** Failures while reading or parsing an access trace.
//! 4. **Simulation errors:** The union of the above for the replay harness.
//!
//! A missing instruction address on an access is not an error; engines skip
//! such accesses silently.

use thiserror::Error;

/// Invalid configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// The spatial region size must be a power of two.
    #[error("the spatial region size must be a power of 2 (got {0})")]
    RegionSizeNotPowerOfTwo(usize),

    /// The cache line size must be a power of two.
    #[error("the cache line size must be a power of 2 (got {0})")]
    LineSizeNotPowerOfTwo(usize),

    /// A spatial region must hold at least one cache line.
    #[error("spatial region size {region} is smaller than the cache line size {line}")]
    RegionSmallerThanLine {
        /// Configured region size in bytes.
        region: usize,
        /// Configured line size in bytes.
        line: usize,
    },

    /// A size, count or degree that must be non-zero was zero.
    #[error("{0} must be non-zero")]
    Zero(&'static str),

    /// A table whose entry count does not split into whole sets.
    #[error("{table}: {entries} entries cannot be split into {assoc}-way sets")]
    TableGeometry {
        /// Name of the offending table.
        table: &'static str,
        /// Configured entry count.
        entries: usize,
        /// Configured associativity.
        assoc: usize,
    },

    /// A PLRU table configured wider than its usage word.
    #[error("{table}: PLRU replacement supports at most {max} ways (got {assoc})")]
    PlruTooWide {
        /// Name of the offending table.
        table: &'static str,
        /// Configured associativity.
        assoc: usize,
        /// Widest supported set.
        max: usize,
    },

    /// The configuration text could not be parsed.
    #[error("invalid configuration: {0}")]
    Json(String),
}

/// Invariant violation while handling an access.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PrefetchError {
    /// A table returned no usable victim slot.
    #[error("{table}: no victim slot available for key {key:#x}")]
    NoVictim {
        /// Name of the table that failed.
        table: &'static str,
        /// Key being allocated.
        key: u64,
    },
}

/// Failure to read an access trace.
#[derive(Debug, Error)]
pub enum TraceError {
    /// The trace file could not be read.
    #[error("could not read trace '{path}': {source}")]
    Io {
        /// Path that was opened.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A record could not be parsed.
    #[error("trace line {line}: {source}")]
    Parse {
        /// One-based line number of the bad record.
        line: usize,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// The trace contained no records.
    #[error("trace contains no access records")]
    Empty,
}

/// Any failure of the replay harness.
#[derive(Debug, Error)]
pub enum SimError {
    /// Invalid configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Engine invariant violation.
    #[error(transparent)]
    Prefetch(#[from] PrefetchError),

    /// Trace loading failure.
    #[error(transparent)]
    Trace(#[from] TraceError),
}
