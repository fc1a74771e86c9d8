//! Prefetch Dispatcher.
//!
//! Owns the enabled engines and the logical clock. Every access advances the
//! clock by one, is offered to the stride predictor and then to the spatial
//! engine, and their candidates are concatenated in that order.

use super::{AccessInfo, AddrPriority, CacheProbe, Prefetcher, SpatialPrefetcher, StridePrefetcher};
use crate::common::error::{ConfigError, PrefetchError};
use crate::config::PrefetchConfig;

/// Per-access orchestration of the prediction engines.
#[derive(Debug)]
pub struct PrefetchDispatcher {
    /// Logical clock, incremented once per access.
    current_hit: u64,
    stride: Option<StridePrefetcher>,
    spatial: Option<SpatialPrefetcher>,
}

impl PrefetchDispatcher {
    /// Builds the engines selected by `config`.
    ///
    /// # Arguments
    ///
    /// * `config` - Engine selection and geometry.
    /// * `line_bytes` - The size of a cache line in bytes.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if an enabled engine is misconfigured, in
    /// particular [`ConfigError::RegionSizeNotPowerOfTwo`].
    pub fn new(config: &PrefetchConfig, line_bytes: usize) -> Result<Self, ConfigError> {
        config.validate(line_bytes)?;
        let stride = config.prefetcher.uses_stride().then(|| {
            StridePrefetcher::new(line_bytes, config.stride.table_size, config.stride.degree)
        });
        let spatial = if config.prefetcher.uses_spatial() {
            Some(SpatialPrefetcher::new(&config.spatial, line_bytes)?)
        } else {
            None
        };
        Ok(Self::from_engines(stride, spatial))
    }

    /// Wraps already built engines.
    pub const fn from_engines(
        stride: Option<StridePrefetcher>,
        spatial: Option<SpatialPrefetcher>,
    ) -> Self {
        Self {
            current_hit: 0,
            stride,
            spatial,
        }
    }

    /// Number of accesses seen so far.
    pub const fn current_hit(&self) -> u64 {
        self.current_hit
    }

    /// Stride predictor, if enabled.
    pub const fn stride(&self) -> Option<&StridePrefetcher> {
        self.stride.as_ref()
    }

    /// Spatial engine, if enabled.
    pub const fn spatial(&self) -> Option<&SpatialPrefetcher> {
        self.spatial.as_ref()
    }

    /// True when no engine is enabled.
    pub const fn is_idle(&self) -> bool {
        self.stride.is_none() && self.spatial.is_none()
    }

    /// Runs one access through the enabled engines.
    ///
    /// # Returns
    ///
    /// The stride run (if any) followed by the spatial candidate (if any).
    ///
    /// # Errors
    ///
    /// Propagates the first [`PrefetchError`] raised by an engine.
    pub fn on_access(
        &mut self,
        access: &AccessInfo,
        probe: &dyn CacheProbe,
    ) -> Result<Vec<AddrPriority>, PrefetchError> {
        self.current_hit += 1;
        let now = self.current_hit;

        let mut candidates = Vec::new();
        if let Some(stride) = self.stride.as_mut() {
            candidates.extend(stride.calculate_prefetch(access, now, probe)?);
        }
        if let Some(spatial) = self.spatial.as_mut() {
            candidates.extend(spatial.calculate_prefetch(access, now, probe)?);
        }
        Ok(candidates)
    }
}
