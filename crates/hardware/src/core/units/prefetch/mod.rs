//! Prefetch decision engines.
//!
//! This module contains the interface shared by the prediction engines and the
//! dispatcher that runs them on every access. The engines only decide which
//! addresses are worth fetching; issuing the fetches is the caller's concern.

/// Per-access dispatcher owning the engines and the logical clock.
pub mod dispatch;

/// Spatial pattern engine (filter, active generation and pattern sequence tables).
pub mod spatial;

/// Stride predictor (reference prediction table).
pub mod stride;

pub use self::dispatch::PrefetchDispatcher;
pub use self::spatial::SpatialPrefetcher;
pub use self::stride::StridePrefetcher;

use crate::common::addr::{PhysAddr, VirtAddr};
use crate::common::error::PrefetchError;

/// One access as observed by the prefetchers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AccessInfo {
    /// Address of the instruction that issued the access, when known.
    pub pc: Option<u64>,
    /// Requested address.
    pub addr: VirtAddr,
    /// Physical address the request resolved to.
    pub paddr: PhysAddr,
    /// Security domain of the access.
    pub secure: bool,
}

impl AccessInfo {
    /// Creates a non-secure access whose physical address equals its requested address.
    pub const fn new(pc: Option<u64>, addr: u64) -> Self {
        Self {
            pc,
            addr: VirtAddr(addr),
            paddr: PhysAddr(addr),
            secure: false,
        }
    }

    /// Sets the physical address.
    #[must_use]
    pub const fn with_paddr(mut self, paddr: u64) -> Self {
        self.paddr = PhysAddr(paddr);
        self
    }

    /// Sets the security domain.
    #[must_use]
    pub const fn with_secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }
}

/// A candidate prefetch address and its priority.
///
/// Higher priorities are more urgent. The engines in this crate do not rank
/// their candidates and always emit priority 0.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AddrPriority {
    /// Address to prefetch.
    pub addr: u64,
    /// Relative priority.
    pub priority: i32,
}

impl AddrPriority {
    /// Creates a candidate.
    pub const fn new(addr: u64, priority: i32) -> Self {
        Self { addr, priority }
    }
}

/// Residency oracle consulted by the engines.
///
/// Implemented by the cache that owns the prefetcher.
pub trait CacheProbe {
    /// True when the line containing `addr` is currently held by the cache.
    fn resident(&self, addr: u64, secure: bool) -> bool;

    /// True when a fill for the line containing `addr` is outstanding.
    fn in_flight(&self, addr: u64, secure: bool) -> bool;
}

/// Trait for prefetch prediction engines.
///
/// Engines observe accesses, learn patterns and return candidate addresses.
pub trait Prefetcher: Send + Sync {
    /// Short engine name used in logs.
    fn name(&self) -> &'static str;

    /// Observes an access and generates prefetch candidates.
    ///
    /// # Arguments
    ///
    /// * `access` - The access being observed.
    /// * `now` - Logical clock: number of accesses seen so far, this one included.
    /// * `probe` - Residency oracle of the owning cache.
    ///
    /// # Returns
    ///
    /// The candidates in emission order. Empty if nothing should be fetched.
    ///
    /// # Errors
    ///
    /// Returns a [`PrefetchError`] when an internal table invariant is violated.
    fn calculate_prefetch(
        &mut self,
        access: &AccessInfo,
        now: u64,
        probe: &dyn CacheProbe,
    ) -> Result<Vec<AddrPriority>, PrefetchError>;
}
