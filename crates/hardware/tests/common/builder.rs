//! Configuration and access builders.

use smsim_core::config::{
    CacheConfig, Config, PrefetchConfig, Prefetcher, ReplacementPolicy, SpatialConfig,
    TableConfig,
};
use smsim_core::core::units::prefetch::AccessInfo;

/// A non-secure access with a program counter and identity address mapping.
pub const fn access(pc: u64, addr: u64) -> AccessInfo {
    AccessInfo::new(Some(pc), addr)
}

/// A non-secure access without a program counter.
pub const fn access_no_pc(addr: u64) -> AccessInfo {
    AccessInfo::new(None, addr)
}

/// Small fully associative spatial tables.
///
/// `region_size` bytes per region; FT and AGT hold 8 entries each, the PST 16.
pub fn small_spatial(region_size: usize) -> SpatialConfig {
    SpatialConfig {
        region_size,
        filter_table: TableConfig::new(8, 8),
        active_generation_table: TableConfig::new(8, 8),
        pattern_sequence_table: TableConfig::new(16, 16),
    }
}

/// A table geometry with an explicit policy.
pub const fn table(entries: usize, assoc: usize, policy: ReplacementPolicy) -> TableConfig {
    TableConfig {
        entries,
        assoc,
        policy,
    }
}

/// A tiny cache: `lines` lines of `line_bytes`, fully associative, LRU.
pub fn tiny_cache(lines: usize, line_bytes: usize) -> CacheConfig {
    CacheConfig {
        size_bytes: lines * line_bytes,
        line_bytes,
        ways: lines,
        policy: ReplacementPolicy::Lru,
        miss_queue_entries: 4,
        miss_latency: 2,
    }
}

/// A full configuration running `prefetcher` on a tiny cache.
pub fn config_with(prefetcher: Prefetcher, cache: CacheConfig, spatial: SpatialConfig) -> Config {
    Config {
        cache,
        prefetch: PrefetchConfig {
            prefetcher,
            spatial,
            ..PrefetchConfig::default()
        },
        ..Config::default()
    }
}
