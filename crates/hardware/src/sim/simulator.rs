//! Trace-replay simulator.
//!
//! Drives the prefetch dispatcher with a recorded access stream against the
//! cache residency model. Each access runs through four steps:
//! 1. **Fill:** Outstanding fills whose latency has elapsed are installed.
//! 2. **Demand:** The access is looked up; a miss queues a fill for its line.
//! 3. **Predict:** The dispatcher sees the access and returns candidates.
//! 4. **Issue:** Each candidate becomes a prefetch fill unless its line is
//!    already resident or in flight, or the miss queue is full.
//!
//! The cache is physically indexed. Candidates are treated as physical
//! addresses, which holds for traces whose requested and physical addresses
//! coincide.

use std::time::Instant;

use tracing::{debug, trace};

use super::trace::AccessRecord;
use crate::common::error::{PrefetchError, SimError};
use crate::config::Config;
use crate::core::units::cache::CacheSim;
use crate::core::units::prefetch::{AddrPriority, PrefetchDispatcher};
use crate::stats::PrefetchStats;

/// Top-level simulator: cache model + prefetch dispatcher.
#[derive(Debug)]
pub struct Simulator {
    /// Cache residency model (also the prefetchers' probe).
    pub cache: CacheSim,
    /// Prediction engines.
    pub dispatcher: PrefetchDispatcher,
    stats: PrefetchStats,
    /// Logical time in accesses.
    now: u64,
    miss_latency: u64,
}

impl Simulator {
    /// Creates a simulator from a configuration.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Config`] if the configuration is invalid.
    pub fn new(config: &Config) -> Result<Self, SimError> {
        config.validate()?;
        Ok(Self {
            cache: CacheSim::new(&config.cache),
            dispatcher: PrefetchDispatcher::new(&config.prefetch, config.cache.line_bytes)?,
            stats: PrefetchStats::default(),
            now: 0,
            miss_latency: config.cache.miss_latency,
        })
    }

    /// Logical time: number of accesses replayed.
    pub const fn now(&self) -> u64 {
        self.now
    }

    /// Statistics so far, engine counters included.
    pub fn stats(&self) -> PrefetchStats {
        let mut stats = self.stats.clone();
        if let Some(stride) = self.dispatcher.stride() {
            stats.stride_predictions = stride.predictions();
        }
        if let Some(spatial) = self.dispatcher.spatial() {
            stats.spatial = spatial.counters();
        }
        stats
    }

    /// Replays one access.
    ///
    /// # Returns
    ///
    /// The candidates produced by the dispatcher for this access.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Prefetch`] if an engine or the cache model hits
    /// an invariant violation.
    pub fn step(&mut self, record: &AccessRecord) -> Result<Vec<AddrPriority>, SimError> {
        self.now += 1;
        self.stats.accesses += 1;
        self.complete_fills()?;

        let access = record.to_access();
        let (paddr, secure) = (access.paddr.val(), access.secure);
        if access.pc.is_none() {
            self.stats.skipped_no_pc += 1;
        }

        let outcome = self.cache.access(paddr, secure);
        if outcome.hit {
            self.stats.hits += 1;
            if outcome.prefetch_hit {
                self.stats.prefetches_useful += 1;
            }
        } else {
            self.stats.misses += 1;
            if self.cache.miss_queue().contains(paddr, secure) {
                self.stats.in_flight_hits += 1;
            } else {
                let ready_at = self.now.saturating_add(self.miss_latency);
                if !self
                    .cache
                    .miss_queue_mut()
                    .push(paddr, secure, ready_at, false)
                {
                    // Demand data is never dropped; bypass the queue instead.
                    self.install(paddr, secure, false)?;
                }
            }
        }
        trace!(
            "access {}: pc {:?} addr {:#x} paddr {paddr:#x} hit {}",
            self.now,
            access.pc,
            access.addr.val(),
            outcome.hit
        );

        let candidates = self.dispatcher.on_access(&access, &self.cache)?;
        self.stats.candidates += candidates.len() as u64;
        for candidate in &candidates {
            self.issue(candidate.addr, secure);
        }
        Ok(candidates)
    }

    /// Replays a whole trace and returns the final statistics.
    ///
    /// # Errors
    ///
    /// Stops at the first access that fails; see [`Simulator::step`].
    pub fn run(&mut self, records: &[AccessRecord]) -> Result<PrefetchStats, SimError> {
        let start = Instant::now();
        for record in records {
            let _ = self.step(record)?;
        }
        self.stats.host_seconds += start.elapsed().as_secs_f64();
        debug!("replayed {} accesses", records.len());
        Ok(self.stats())
    }

    fn issue(&mut self, addr: u64, secure: bool) {
        if self.cache.contains(addr, secure) || self.cache.miss_queue().contains(addr, secure) {
            self.stats.prefetches_redundant += 1;
            return;
        }
        let ready_at = self.now.saturating_add(self.miss_latency);
        if self.cache.miss_queue_mut().push(addr, secure, ready_at, true) {
            self.stats.prefetches_issued += 1;
        } else {
            self.stats.prefetches_dropped += 1;
            trace!("prefetch {addr:#x} dropped: miss queue full");
        }
    }

    fn complete_fills(&mut self) -> Result<(), PrefetchError> {
        for fill in self.cache.miss_queue_mut().drain_ready(self.now) {
            self.install(fill.line, fill.secure, fill.prefetch)?;
        }
        Ok(())
    }

    fn install(&mut self, addr: u64, secure: bool, prefetched: bool) -> Result<(), PrefetchError> {
        if let Some(evicted) = self.cache.install(addr, secure, prefetched)? {
            self.stats.evictions += 1;
            if evicted.unused_prefetch {
                self.stats.prefetches_unused_evicted += 1;
            }
        }
        Ok(())
    }
}
