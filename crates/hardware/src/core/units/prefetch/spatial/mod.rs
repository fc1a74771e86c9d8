//! Spatial Pattern Prefetcher.
//!
//! Spatial memory streaming with a Markov region predictor. Memory is divided
//! into fixed-size, power-of-two regions; the engine records which lines of a
//! region are touched while the region is "live" (a generation) and keeps the
//! finished patterns for later reuse.
//!
//! Three tables share the [`GenerationEntry`] shape:
//! 1. **Filter Table (FT):** Regions touched exactly once so far.
//! 2. **Active Generation Table (AGT):** Regions whose offsets are being recorded.
//! 3. **Pattern Sequence Table (PST):** Finished generations, keyed by the
//!    instruction that started them.
//!
//! A generation ends when any line it recorded is neither resident nor in
//! flight in the owning cache, i.e. when the cache has evicted part of the
//! pattern. Ends are detected by a sweep over the AGT at the start of every
//! access.
//!
//! The PST is searched by region on trigger accesses while finished
//! generations are stored by instruction address, and the Markov prediction is
//! computed but not turned into candidates. Both behaviours are kept as-is.

/// Entry shape shared by the three spatial tables.
pub mod generation;

/// Region transition (Markov) predictor.
pub mod markov;

use serde::Serialize;
use tracing::{debug, trace};

pub use self::generation::{GenerationEntry, SequenceSlot};
pub use self::markov::{RegionTransitionTable, Transition};
use super::{AccessInfo, AddrPriority, CacheProbe, Prefetcher};
use crate::common::addr::PhysAddr;
use crate::common::error::{ConfigError, PrefetchError};
use crate::config::SpatialConfig;
use crate::core::units::table::{AssociativeTable, EntryId};

/// Event counters of the spatial engine.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SpatialCounters {
    /// Accesses that hit an active generation.
    pub accesses_since_trigger: u64,
    /// Generations migrated into the PST.
    pub generations_ended: u64,
    /// Trigger accesses answered from the PST.
    pub pattern_hits: u64,
    /// Filter Table entries promoted to the AGT.
    pub promotions: u64,
    /// Fresh Filter Table allocations.
    pub filter_allocations: u64,
}

/// Spatial Pattern Prefetcher state.
#[derive(Debug)]
pub struct SpatialPrefetcher {
    /// Region size in bytes.
    region_size: u64,
    /// Cache line size in bytes.
    line_bytes: u64,
    /// Filter Table, keyed by region.
    filter: AssociativeTable<GenerationEntry>,
    /// Active Generation Table, keyed by region.
    active: AssociativeTable<GenerationEntry>,
    /// Pattern Sequence Table, keyed by instruction address.
    patterns: AssociativeTable<GenerationEntry>,
    /// Region transition frequencies.
    transitions: RegionTransitionTable,
    /// Region of the previous access.
    prev_region: u64,
    /// Markov prediction made at the most recent trigger access.
    predicted_region: Option<u64>,
    counters: SpatialCounters,
}

impl SpatialPrefetcher {
    /// Creates a new spatial prefetcher.
    ///
    /// # Arguments
    ///
    /// * `config` - Region size and table geometry.
    /// * `line_bytes` - The size of a cache line in bytes.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::RegionSizeNotPowerOfTwo`] when the region size
    /// is not a power of two, or another [`ConfigError`] for bad line size or
    /// table geometry.
    pub fn new(config: &SpatialConfig, line_bytes: usize) -> Result<Self, ConfigError> {
        if !line_bytes.is_power_of_two() {
            return Err(ConfigError::LineSizeNotPowerOfTwo(line_bytes));
        }
        config.validate(line_bytes)?;

        let prototype = GenerationEntry::new(config.offsets_per_region(line_bytes));
        Ok(Self {
            region_size: config.region_size as u64,
            line_bytes: line_bytes as u64,
            filter: AssociativeTable::new("filter table", &config.filter_table, prototype.clone()),
            active: AssociativeTable::new(
                "active generation table",
                &config.active_generation_table,
                prototype.clone(),
            ),
            patterns: AssociativeTable::new(
                "pattern sequence table",
                &config.pattern_sequence_table,
                prototype,
            ),
            transitions: RegionTransitionTable::new(),
            prev_region: 0,
            predicted_region: None,
            counters: SpatialCounters::default(),
        })
    }

    /// Region size in bytes.
    pub const fn region_size(&self) -> u64 {
        self.region_size
    }

    /// Filter Table.
    pub const fn filter_table(&self) -> &AssociativeTable<GenerationEntry> {
        &self.filter
    }

    /// Active Generation Table.
    pub const fn active_generation_table(&self) -> &AssociativeTable<GenerationEntry> {
        &self.active
    }

    /// Pattern Sequence Table.
    pub const fn pattern_sequence_table(&self) -> &AssociativeTable<GenerationEntry> {
        &self.patterns
    }

    /// Region transition table.
    pub const fn transitions(&self) -> &RegionTransitionTable {
        &self.transitions
    }

    /// Region of the previous access (0 before the first one).
    pub const fn prev_region(&self) -> u64 {
        self.prev_region
    }

    /// Next region predicted at the most recent trigger access.
    pub const fn predicted_region(&self) -> Option<u64> {
        self.predicted_region
    }

    /// Event counters.
    pub const fn counters(&self) -> SpatialCounters {
        self.counters
    }

    /// Migrates every active generation that lost a recorded line to the PST.
    ///
    /// A recorded offset is probed at the line `offset` lines past the
    /// region-aligned physical address of the generation.
    ///
    /// # Errors
    ///
    /// Returns [`PrefetchError::NoVictim`] if the PST cannot provide a slot.
    pub fn check_generations_end(&mut self, probe: &dyn CacheProbe) -> Result<(), PrefetchError> {
        for id in self.active.valid_ids() {
            let secure = self.active.is_secure(id);
            let entry = self.active.get(id);
            let base = PhysAddr(entry.paddr).align_down(self.region_size).val();
            let ended = entry.recorded_offsets().any(|offset| {
                let line = base.wrapping_add(u64::from(offset) * self.line_bytes);
                !probe.resident(line, secure) && !probe.in_flight(line, secure)
            });
            if ended {
                let finished = entry.clone();
                self.end_generation(id, &finished)?;
            }
        }
        Ok(())
    }

    fn end_generation(&mut self, id: EntryId, finished: &GenerationEntry) -> Result<(), PrefetchError> {
        let region = self.active.key(id);
        // The PST is keyed by instruction; its secure bit is unused.
        let pst = match self.patterns.find(finished.pc, false) {
            Some(pst) => {
                self.patterns.access(pst);
                pst
            }
            None => {
                let pst = self.patterns.find_victim(finished.pc)?;
                self.patterns.insert(finished.pc, false, pst);
                pst
            }
        };
        self.patterns.get_mut(pst).update_from(finished);
        self.active.invalidate(id);
        self.counters.generations_ended += 1;
        debug!(
            "spatial: generation of region {region:#x} ended, {} offsets stored for pc {:#x}",
            finished.recorded_offsets().count(),
            finished.pc
        );
        Ok(())
    }

    /// Handles one access with a known instruction address.
    ///
    /// # Errors
    ///
    /// Returns [`PrefetchError::NoVictim`] if a table cannot provide a slot.
    pub fn observe(
        &mut self,
        pc: u64,
        access: &AccessInfo,
        probe: &dyn CacheProbe,
    ) -> Result<Vec<AddrPriority>, PrefetchError> {
        let secure = access.secure;
        let region = access.addr.region(self.region_size);
        let offset = access.addr.region_offset(self.region_size, self.line_bytes) as u32;
        let mut candidates = Vec::new();

        self.check_generations_end(probe)?;

        let touched = self.active.find(region, secure);
        if let Some(id) = touched {
            self.active.access(id);
            self.active.get_mut(id).add_offset(offset);
            self.counters.accesses_since_trigger += 1;
            self.transitions.record_transition(self.prev_region, region);
        } else {
            self.trigger(pc, access, region, offset, &mut candidates)?;
        }

        for id in self.active.valid_ids() {
            if Some(id) != touched {
                let entry = self.active.get_mut(id);
                entry.seq_counter = entry.seq_counter.saturating_add(1);
            }
        }

        self.prev_region = region;
        Ok(candidates)
    }

    /// First access to a region that is not being recorded.
    fn trigger(
        &mut self,
        pc: u64,
        access: &AccessInfo,
        region: u64,
        offset: u32,
        candidates: &mut Vec<AddrPriority>,
    ) -> Result<(), PrefetchError> {
        let secure = access.secure;
        self.predicted_region = self.transitions.predict(self.prev_region);
        if let Some(next) = self.predicted_region {
            trace!(
                "spatial: markov predicts region {next:#x} after {:#x}",
                self.prev_region
            );
        }

        if let Some(pst) = self.patterns.find(region, secure) {
            let addr = self.patterns.get(pst).paddr;
            candidates.push(AddrPriority::new(addr, 0));
            self.counters.pattern_hits += 1;
            trace!("spatial: pattern hit for region {region:#x} -> {addr:#x}");
        } else if self.filter.find(region, secure).is_some() {
            let id = self.active.find_victim(region)?;
            self.active.insert(region, secure, id);
            let entry = self.active.get_mut(id);
            entry.pc = pc;
            entry.paddr = access.paddr.val();
            entry.add_offset(offset);
            self.transitions.record_transition(self.prev_region, region);
            self.counters.promotions += 1;
            debug!("spatial: region {region:#x} promoted to active generation (pc {pc:#x})");
        } else {
            let id = self.filter.find_victim(region)?;
            self.transitions.evict(region);
            self.filter.insert(region, secure, id);
            let entry = self.filter.get_mut(id);
            entry.pc = pc;
            entry.add_offset(offset);
            self.transitions.add_entry(region);
            self.counters.filter_allocations += 1;
            debug!("spatial: region {region:#x} entered filter table (pc {pc:#x})");
        }
        Ok(())
    }
}

impl Prefetcher for SpatialPrefetcher {
    fn name(&self) -> &'static str {
        "spatial"
    }

    fn calculate_prefetch(
        &mut self,
        access: &AccessInfo,
        _now: u64,
        probe: &dyn CacheProbe,
    ) -> Result<Vec<AddrPriority>, PrefetchError> {
        let Some(pc) = access.pc else {
            debug!("spatial: ignoring request with no pc ({:#x})", access.addr.val());
            return Ok(Vec::new());
        };
        self.observe(pc, access, probe)
    }
}
