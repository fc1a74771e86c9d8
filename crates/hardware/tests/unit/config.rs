//! Configuration Tests.
//!
//! Verifies defaults, JSON parsing (including aliases) and validation errors.

use pretty_assertions::assert_eq;
use smsim_core::common::error::ConfigError;
use smsim_core::config::{Config, Prefetcher, ReplacementPolicy, SpatialConfig, TableConfig};

// ══════════════════════════════════════════════════════════
// 1. Defaults
// ══════════════════════════════════════════════════════════

/// Built-in defaults match the documented geometry.
#[test]
fn defaults() {
    let c = Config::default();
    assert_eq!(c.cache.size_bytes, 32 * 1024);
    assert_eq!(c.cache.line_bytes, 64);
    assert_eq!(c.cache.ways, 8);
    assert_eq!(c.cache.policy, ReplacementPolicy::Lru);
    assert_eq!(c.prefetch.prefetcher, Prefetcher::None);
    assert_eq!(c.prefetch.stride.table_size, 512);
    assert_eq!(c.prefetch.stride.degree, 1);
    assert_eq!(c.prefetch.spatial.region_size, 2048);
    assert_eq!(c.prefetch.spatial.filter_table, TableConfig::new(64, 64));
    assert_eq!(c.prefetch.spatial.active_generation_table, TableConfig::new(64, 64));
    assert_eq!(c.prefetch.spatial.pattern_sequence_table, TableConfig::new(16384, 16));
    assert!(c.validate().is_ok());
}

/// An empty document yields the defaults.
#[test]
fn empty_json_is_default() {
    let c = Config::from_json("{}").unwrap();
    assert_eq!(c.cache.num_lines(), 512);
    assert_eq!(c.prefetch.spatial.offsets_per_region(64), 32);
}

// ══════════════════════════════════════════════════════════
// 2. Parsing
// ══════════════════════════════════════════════════════════

/// Engine and policy aliases are accepted.
#[test]
fn aliases() {
    let c = Config::from_json(r#"{"prefetch": {"prefetcher": "SMS"}, "cache": {"policy": "Plru"}}"#)
        .unwrap();
    assert_eq!(c.prefetch.prefetcher, Prefetcher::Spatial);
    assert_eq!(c.cache.policy, ReplacementPolicy::Plru);

    let c = Config::from_json(r#"{"prefetch": {"prefetcher": "Both"}}"#).unwrap();
    assert_eq!(c.prefetch.prefetcher, Prefetcher::Hybrid);
    assert!(c.prefetch.prefetcher.uses_stride());
    assert!(c.prefetch.prefetcher.uses_spatial());
}

/// Malformed documents are reported as JSON errors.
#[test]
fn malformed_json() {
    let err = Config::from_json(r#"{"cache": {"ways": "eight"}}"#).unwrap_err();
    assert!(matches!(err, ConfigError::Json(_)));
}

/// Serialization round-trips through `from_json`.
#[test]
fn dump_and_reload() {
    let mut c = Config::default();
    c.prefetch.prefetcher = Prefetcher::Hybrid;
    c.prefetch.stride.degree = 3;
    let text = serde_json::to_string(&c).unwrap();
    let back = Config::from_json(&text).unwrap();
    assert_eq!(back.prefetch.prefetcher, Prefetcher::Hybrid);
    assert_eq!(back.prefetch.stride.degree, 3);
}

// ══════════════════════════════════════════════════════════
// 3. Validation
// ══════════════════════════════════════════════════════════

/// A region size that is not a power of two is rejected when spatial is on.
#[test]
fn region_size_must_be_power_of_two() {
    let err = Config::from_json(
        r#"{"prefetch": {"prefetcher": "Spatial", "spatial": {"region_size": 3000}}}"#,
    )
    .unwrap_err();
    assert_eq!(err, ConfigError::RegionSizeNotPowerOfTwo(3000));
}

/// Disabled engines are not validated.
#[test]
fn disabled_engine_not_checked() {
    let c = Config::from_json(
        r#"{"prefetch": {"prefetcher": "Stride", "spatial": {"region_size": 3000}}}"#,
    );
    assert!(c.is_ok());
}

/// A region must hold at least one line.
#[test]
fn region_smaller_than_line() {
    let spatial = SpatialConfig {
        region_size: 32,
        ..SpatialConfig::default()
    };
    assert_eq!(
        spatial.validate(64),
        Err(ConfigError::RegionSmallerThanLine { region: 32, line: 64 })
    );
}

/// Table entries must split into whole sets.
#[test]
fn table_geometry() {
    assert_eq!(
        TableConfig::new(10, 4).validate("t"),
        Err(ConfigError::TableGeometry {
            table: "t",
            entries: 10,
            assoc: 4
        })
    );
    assert!(TableConfig::new(0, 4).validate("t").is_err());
    assert!(TableConfig::new(16, 4).validate("t").is_ok());
    assert_eq!(TableConfig::new(16, 4).sets(), 4);
}

/// Cache line size must be a power of two and the degree non-zero.
#[test]
fn cache_and_stride_checks() {
    let err = Config::from_json(r#"{"cache": {"line_bytes": 48}}"#).unwrap_err();
    assert_eq!(err, ConfigError::LineSizeNotPowerOfTwo(48));

    let err = Config::from_json(r#"{"prefetch": {"prefetcher": "Stride", "stride": {"degree": 0}}}"#)
        .unwrap_err();
    assert_eq!(err, ConfigError::Zero("prefetch.stride.degree"));
}

/// PLRU tracks at most 64 ways per set; wider PLRU sets are rejected.
#[test]
fn plru_width_is_bounded() {
    let wide = TableConfig {
        entries: 128,
        assoc: 128,
        policy: ReplacementPolicy::Plru,
    };
    assert_eq!(
        wide.validate("t"),
        Err(ConfigError::PlruTooWide {
            table: "t",
            assoc: 128,
            max: 64
        })
    );
    let widest = TableConfig {
        entries: 64,
        assoc: 64,
        policy: ReplacementPolicy::Plru,
    };
    assert!(widest.validate("t").is_ok());
    assert!(TableConfig::new(128, 128).validate("t").is_ok());

    let err = Config::from_json(
        r#"{"prefetch": {"prefetcher": "Spatial",
            "spatial": {"filter_table": {"entries": 256, "assoc": 128, "policy": "PLRU"}}}}"#,
    )
    .unwrap_err();
    assert_eq!(
        err,
        ConfigError::PlruTooWide {
            table: "filter table",
            assoc: 128,
            max: 64
        }
    );

    let err = Config::from_json(
        r#"{"cache": {"size_bytes": 8192, "line_bytes": 64, "ways": 128, "policy": "PLRU"}}"#,
    )
    .unwrap_err();
    assert_eq!(
        err,
        ConfigError::PlruTooWide {
            table: "cache",
            assoc: 128,
            max: 64
        }
    );
    assert!(Config::from_json(r#"{"cache": {"size_bytes": 8192, "line_bytes": 64, "ways": 128}}"#).is_ok());
}
