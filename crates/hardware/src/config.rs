//! Configuration system for the prefetch simulator.
//!
//! This module defines all configuration structures and enums used to parameterize
//! the engines and the replay harness. It provides:
//! 1. **Defaults:** Baseline geometry for the cache model, the reference prediction
//!    table and the three spatial tables.
//! 2. **Structures:** Hierarchical config for general, cache and prefetch settings.
//! 3. **Enums:** Replacement policy and prefetcher selection.
//! 4. **Validation:** Geometry checks that reject configurations the engines cannot
//!    model (for example a spatial region size that is not a power of two).
//!
//! Configuration is supplied as JSON (`Config::from_json`) or built with `Config::default()`.

use serde::{Deserialize, Serialize};

use crate::common::error::ConfigError;
use crate::core::units::table::policies::plru;

/// Default configuration constants.
///
/// These values define the baseline configuration when a field is not
/// explicitly given in the JSON configuration.
mod defaults {
    /// Default cache size in bytes (32 KiB L1 data cache).
    pub const CACHE_SIZE: usize = 32 * 1024;

    /// Default cache line size in bytes (64 bytes).
    pub const CACHE_LINE: usize = 64;

    /// Default cache associativity (8 ways).
    pub const CACHE_WAYS: usize = 8;

    /// Default number of outstanding line fills.
    pub const MISS_QUEUE_ENTRIES: usize = 16;

    /// Default fill latency, in accesses.
    pub const MISS_LATENCY: u64 = 20;

    /// Default Reference Prediction Table capacity (512 entries).
    pub const RPT_ENTRIES: usize = 512;

    /// Default stride prefetch degree (1 address per prediction).
    pub const PREFETCH_DEGREE: usize = 1;

    /// Default spatial region size (2 KiB).
    pub const SPATIAL_REGION_SIZE: usize = 2048;

    /// Default Filter Table / Active Generation Table entry count.
    pub const GENERATION_TABLE_ENTRIES: usize = 64;

    /// Default Filter Table / Active Generation Table associativity (fully associative).
    pub const GENERATION_TABLE_ASSOC: usize = 64;

    /// Default Pattern Sequence Table entry count.
    pub const PATTERN_TABLE_ENTRIES: usize = 16384;

    /// Default Pattern Sequence Table associativity.
    pub const PATTERN_TABLE_ASSOC: usize = 16;
}

/// Table replacement policy algorithms.
///
/// Selects which way of a full set is evicted when a new entry is allocated,
/// both in the cache model and in the prefetcher tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ReplacementPolicy {
    /// Least Recently Used replacement policy.
    #[default]
    #[serde(alias = "Lru")]
    Lru,
    /// Pseudo-LRU (bit-vector) replacement policy.
    #[serde(alias = "Plru")]
    Plru,
    /// First In First Out replacement policy (oldest insertion is evicted).
    #[serde(alias = "Fifo")]
    Fifo,
    /// Random replacement policy.
    #[serde(alias = "Random")]
    Random,
    /// Most Recently Used replacement policy.
    #[serde(alias = "Mru")]
    Mru,
}

impl ReplacementPolicy {
    /// Rejects set widths the policy cannot track.
    const fn check_width(self, table: &'static str, ways: usize) -> Result<(), ConfigError> {
        if matches!(self, Self::Plru) && ways > plru::MAX_WAYS {
            return Err(ConfigError::PlruTooWide {
                table,
                assoc: ways,
                max: plru::MAX_WAYS,
            });
        }
        Ok(())
    }
}

/// Which prediction engines the dispatcher runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase")]
pub enum Prefetcher {
    /// No prefetching enabled.
    #[default]
    None,
    /// Per-instruction stride predictor (reference prediction table).
    Stride,
    /// Spatial pattern engine with region transition model.
    #[serde(alias = "SMS")]
    Spatial,
    /// Both engines; stride candidates first, then the spatial candidate.
    #[serde(alias = "Both")]
    Hybrid,
}

impl Prefetcher {
    /// True when the stride predictor is enabled.
    pub const fn uses_stride(self) -> bool {
        matches!(self, Self::Stride | Self::Hybrid)
    }

    /// True when the spatial pattern engine is enabled.
    pub const fn uses_spatial(self) -> bool {
        matches!(self, Self::Spatial | Self::Hybrid)
    }
}

/// Root configuration structure.
///
/// Every section and field may be omitted; missing values take their defaults.
///
/// # Examples
///
/// ```
/// use smsim_core::config::{Config, Prefetcher, ReplacementPolicy};
///
/// let json = r#"{
///     "cache": { "size_bytes": 16384, "line_bytes": 64, "ways": 4 },
///     "prefetch": {
///         "prefetcher": "Hybrid",
///         "stride": { "degree": 4 },
///         "spatial": {
///             "region_size": 1024,
///             "pattern_sequence_table": { "entries": 256, "assoc": 16, "policy": "FIFO" }
///         }
///     }
/// }"#;
///
/// let config = Config::from_json(json).unwrap();
/// assert_eq!(config.cache.ways, 4);
/// assert_eq!(config.prefetch.prefetcher, Prefetcher::Hybrid);
/// assert_eq!(config.prefetch.stride.degree, 4);
/// assert_eq!(config.prefetch.stride.table_size, 512);
/// assert_eq!(config.prefetch.spatial.pattern_sequence_table.policy, ReplacementPolicy::Fifo);
/// ```
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    /// General simulation settings
    #[serde(default)]
    pub general: GeneralConfig,
    /// Cache residency model used by the replay harness
    #[serde(default)]
    pub cache: CacheConfig,
    /// Prediction engine configuration
    #[serde(default)]
    pub prefetch: PrefetchConfig,
}

impl Config {
    /// Parses a JSON configuration and validates it.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Json`] when the text is not a valid configuration
    /// document, or the first geometry error found by [`Config::validate`].
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::Json(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that the configuration describes a geometry the engines can model.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.cache.validate()?;
        self.prefetch.validate(self.cache.line_bytes)
    }
}

/// General simulation settings.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct GeneralConfig {
    /// Log every access and every emitted candidate (raises the default log filter to `trace`)
    #[serde(default)]
    pub trace_accesses: bool,
}

/// Cache residency model configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheConfig {
    /// Total cache size in bytes
    #[serde(default = "CacheConfig::default_size")]
    pub size_bytes: usize,

    /// Cache line size in bytes (also the prefetchers' block size)
    #[serde(default = "CacheConfig::default_line")]
    pub line_bytes: usize,

    /// Associativity (number of ways)
    #[serde(default = "CacheConfig::default_ways")]
    pub ways: usize,

    /// Replacement policy
    #[serde(default)]
    pub policy: ReplacementPolicy,

    /// Maximum number of outstanding line fills
    #[serde(default = "CacheConfig::default_miss_queue")]
    pub miss_queue_entries: usize,

    /// Accesses between a fill request and its arrival
    #[serde(default = "CacheConfig::default_miss_latency")]
    pub miss_latency: u64,
}

impl CacheConfig {
    /// Returns the default cache size in bytes.
    fn default_size() -> usize {
        defaults::CACHE_SIZE
    }

    /// Returns the default cache line size in bytes.
    fn default_line() -> usize {
        defaults::CACHE_LINE
    }

    /// Returns the default cache associativity (number of ways).
    fn default_ways() -> usize {
        defaults::CACHE_WAYS
    }

    /// Returns the default miss queue depth.
    fn default_miss_queue() -> usize {
        defaults::MISS_QUEUE_ENTRIES
    }

    /// Returns the default fill latency.
    fn default_miss_latency() -> u64 {
        defaults::MISS_LATENCY
    }

    /// Number of lines the cache holds.
    pub const fn num_lines(&self) -> usize {
        self.size_bytes / self.line_bytes
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.line_bytes == 0 {
            return Err(ConfigError::Zero("cache.line_bytes"));
        }
        if !self.line_bytes.is_power_of_two() {
            return Err(ConfigError::LineSizeNotPowerOfTwo(self.line_bytes));
        }
        if self.size_bytes == 0 {
            return Err(ConfigError::Zero("cache.size_bytes"));
        }
        if self.ways == 0 {
            return Err(ConfigError::Zero("cache.ways"));
        }
        if self.miss_queue_entries == 0 {
            return Err(ConfigError::Zero("cache.miss_queue_entries"));
        }
        let lines = self.num_lines();
        if lines == 0 || lines % self.ways != 0 {
            return Err(ConfigError::TableGeometry {
                table: "cache",
                entries: lines,
                assoc: self.ways,
            });
        }
        self.policy.check_width("cache", self.ways)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            size_bytes: defaults::CACHE_SIZE,
            line_bytes: defaults::CACHE_LINE,
            ways: defaults::CACHE_WAYS,
            policy: ReplacementPolicy::default(),
            miss_queue_entries: defaults::MISS_QUEUE_ENTRIES,
            miss_latency: defaults::MISS_LATENCY,
        }
    }
}

/// Prediction engine configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PrefetchConfig {
    /// Engines run by the dispatcher
    #[serde(default)]
    pub prefetcher: Prefetcher,

    /// Stride predictor settings
    #[serde(default)]
    pub stride: StrideConfig,

    /// Spatial pattern engine settings
    #[serde(default)]
    pub spatial: SpatialConfig,
}

impl PrefetchConfig {
    /// Validates the engine geometry against the cache line size.
    ///
    /// Only the enabled engines are checked.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub fn validate(&self, line_bytes: usize) -> Result<(), ConfigError> {
        if self.prefetcher.uses_stride() {
            self.stride.validate()?;
        }
        if self.prefetcher.uses_spatial() {
            self.spatial.validate(line_bytes)?;
        }
        Ok(())
    }
}

/// Stride predictor (reference prediction table) settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StrideConfig {
    /// Maximum number of RPT entries
    #[serde(default = "StrideConfig::default_table_size")]
    pub table_size: usize,

    /// Addresses generated per prediction
    #[serde(default = "StrideConfig::default_degree")]
    pub degree: usize,
}

impl StrideConfig {
    /// Returns the default RPT capacity.
    fn default_table_size() -> usize {
        defaults::RPT_ENTRIES
    }

    /// Returns the default prefetch degree.
    fn default_degree() -> usize {
        defaults::PREFETCH_DEGREE
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.table_size == 0 {
            return Err(ConfigError::Zero("prefetch.stride.table_size"));
        }
        if self.degree == 0 {
            return Err(ConfigError::Zero("prefetch.stride.degree"));
        }
        Ok(())
    }
}

impl Default for StrideConfig {
    fn default() -> Self {
        Self {
            table_size: defaults::RPT_ENTRIES,
            degree: defaults::PREFETCH_DEGREE,
        }
    }
}

/// Geometry of one associative table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct TableConfig {
    /// Total number of entries
    pub entries: usize,
    /// Associativity (entries per set)
    pub assoc: usize,
    /// Replacement policy within a set
    #[serde(default)]
    pub policy: ReplacementPolicy,
}

impl TableConfig {
    /// Creates a table geometry with the default (LRU) policy.
    pub const fn new(entries: usize, assoc: usize) -> Self {
        Self {
            entries,
            assoc,
            policy: ReplacementPolicy::Lru,
        }
    }

    /// Number of sets.
    pub const fn sets(&self) -> usize {
        self.entries / self.assoc
    }

    /// Checks that the entries split into whole, non-empty sets that the
    /// replacement policy can track.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::TableGeometry`] when the sets do not divide
    /// evenly, or [`ConfigError::PlruTooWide`] for an over-wide PLRU set.
    pub const fn validate(&self, table: &'static str) -> Result<(), ConfigError> {
        if self.entries == 0 || self.assoc == 0 || self.entries % self.assoc != 0 {
            return Err(ConfigError::TableGeometry {
                table,
                entries: self.entries,
                assoc: self.assoc,
            });
        }
        self.policy.check_width(table, self.assoc)
    }
}

/// Spatial pattern engine settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SpatialConfig {
    /// Size of a spatial region in bytes (power of two)
    #[serde(default = "SpatialConfig::default_region_size")]
    pub region_size: usize,

    /// Filter Table geometry
    #[serde(default = "SpatialConfig::default_generation_table")]
    pub filter_table: TableConfig,

    /// Active Generation Table geometry
    #[serde(default = "SpatialConfig::default_generation_table")]
    pub active_generation_table: TableConfig,

    /// Pattern Sequence Table geometry
    #[serde(default = "SpatialConfig::default_pattern_table")]
    pub pattern_sequence_table: TableConfig,
}

impl SpatialConfig {
    /// Returns the default region size.
    fn default_region_size() -> usize {
        defaults::SPATIAL_REGION_SIZE
    }

    /// Returns the default Filter / Active Generation Table geometry.
    const fn default_generation_table() -> TableConfig {
        TableConfig::new(
            defaults::GENERATION_TABLE_ENTRIES,
            defaults::GENERATION_TABLE_ASSOC,
        )
    }

    /// Returns the default Pattern Sequence Table geometry.
    const fn default_pattern_table() -> TableConfig {
        TableConfig::new(
            defaults::PATTERN_TABLE_ENTRIES,
            defaults::PATTERN_TABLE_ASSOC,
        )
    }

    /// Number of line offsets a region holds.
    pub const fn offsets_per_region(&self, line_bytes: usize) -> usize {
        self.region_size / line_bytes
    }

    /// Validates region and table geometry.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::RegionSizeNotPowerOfTwo`] for a bad region size,
    /// or the first other [`ConfigError`] found.
    pub fn validate(&self, line_bytes: usize) -> Result<(), ConfigError> {
        if !self.region_size.is_power_of_two() {
            return Err(ConfigError::RegionSizeNotPowerOfTwo(self.region_size));
        }
        if self.region_size < line_bytes {
            return Err(ConfigError::RegionSmallerThanLine {
                region: self.region_size,
                line: line_bytes,
            });
        }
        self.filter_table.validate("filter table")?;
        self.active_generation_table
            .validate("active generation table")?;
        self.pattern_sequence_table
            .validate("pattern sequence table")
    }
}

impl Default for SpatialConfig {
    fn default() -> Self {
        Self {
            region_size: defaults::SPATIAL_REGION_SIZE,
            filter_table: Self::default_generation_table(),
            active_generation_table: Self::default_generation_table(),
            pattern_sequence_table: Self::default_pattern_table(),
        }
    }
}
