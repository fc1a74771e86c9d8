//! Stride Prefetcher.
//!
//! A Chen-Baer reference prediction table (RPT). Every entry is tagged with the
//! address of the instruction that issued the access and tracks the last
//! address that instruction touched, the stride between consecutive accesses
//! and a four-state confidence machine:
//!
//! | state     | correct | next state | stride   |
//! |-----------|---------|------------|----------|
//! | Initial   | no      | Transient  | observed |
//! | not NoPred| yes     | Steady     | kept     |
//! | Steady    | no      | Initial    | kept     |
//! | Transient | no      | NoPred     | observed |
//! | NoPred    | yes     | Transient  | kept     |
//! | NoPred    | no      | NoPred     | observed |
//!
//! Candidates are emitted for every state except `NoPred`. When the table is
//! full, the entry with the oldest `last_hit` stamp is evicted.
//!
//! # Performance
//!
//! - **Time Complexity:**
//!   - `lookup()`: O(T) linear scan
//!   - `observe()`: O(T + D) where D is the prefetch degree
//! - **Space Complexity:** O(T) where T is the table capacity (512 by default)
//! - **Best Case:** Regular strided loops (array traversals, matrix rows)
//! - **Worst Case:** Pointer chasing and other irregular streams

use tracing::{debug, trace};

use super::{AccessInfo, AddrPriority, CacheProbe, Prefetcher};
use crate::common::error::PrefetchError;

/// Confidence state of an RPT entry.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum EntryState {
    /// First sighting, or a steady stream that just broke.
    #[default]
    Initial,
    /// A new stride has been observed once.
    Transient,
    /// The stride has been confirmed.
    Steady,
    /// The stream is irregular; nothing is predicted.
    NoPred,
}

/// Entry in the Reference Prediction Table.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RptEntry {
    /// Instruction address that owns this entry.
    pub tag: u64,
    /// Last address accessed by this instruction.
    pub prev_addr: u64,
    /// Detected stride in bytes.
    pub stride: i64,
    /// Confidence state.
    pub state: EntryState,
    /// Logical clock value at the last hit; 0 until the first hit.
    pub last_hit: u64,
}

impl RptEntry {
    const fn new(tag: u64, addr: u64) -> Self {
        Self {
            tag,
            prev_addr: addr,
            stride: 0,
            state: EntryState::Initial,
            last_hit: 0,
        }
    }

    /// Applies one observed address to the state machine.
    fn train(&mut self, addr: u64) {
        let correct = addr == self.prev_addr.wrapping_add_signed(self.stride);
        let observed = addr.wrapping_sub(self.prev_addr) as i64;

        match (self.state, correct) {
            (EntryState::Initial, false) => {
                self.stride = observed;
                self.state = EntryState::Transient;
            }
            (EntryState::Initial | EntryState::Transient | EntryState::Steady, true) => {
                self.state = EntryState::Steady;
            }
            (EntryState::Steady, false) => self.state = EntryState::Initial,
            (EntryState::Transient, false) => {
                self.stride = observed;
                self.state = EntryState::NoPred;
            }
            (EntryState::NoPred, true) => self.state = EntryState::Transient,
            (EntryState::NoPred, false) => self.stride = observed,
        }
        self.prev_addr = addr;
    }
}

/// Stride Prefetcher state.
#[derive(Debug)]
pub struct StridePrefetcher {
    /// Reference Prediction Table, in insertion order.
    table: Vec<RptEntry>,
    /// Maximum number of live entries.
    capacity: usize,
    /// Size of a cache line in bytes; the minimum stride magnitude issued.
    line_bytes: u64,
    /// Number of strides to prefetch ahead.
    degree: usize,
    /// Candidates emitted so far.
    predictions: u64,
}

impl StridePrefetcher {
    /// Creates a new Stride prefetcher.
    ///
    /// # Arguments
    ///
    /// * `line_bytes` - The size of a cache line in bytes.
    /// * `capacity` - Number of RPT entries.
    /// * `degree` - The number of strides to prefetch ahead.
    pub fn new(line_bytes: usize, capacity: usize, degree: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            table: Vec::with_capacity(capacity),
            capacity,
            line_bytes: line_bytes as u64,
            degree: degree.max(1),
            predictions: 0,
        }
    }

    /// Returns the entry tagged `tag`, if any.
    pub fn lookup(&self, tag: u64) -> Option<&RptEntry> {
        self.table.iter().find(|e| e.tag == tag)
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// True when the table holds no entries.
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Maximum number of live entries.
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Configured prefetch degree.
    pub const fn degree(&self) -> usize {
        self.degree
    }

    /// All live entries, oldest insertion first.
    pub fn entries(&self) -> &[RptEntry] {
        &self.table
    }

    /// Total number of candidates emitted.
    pub const fn predictions(&self) -> u64 {
        self.predictions
    }

    /// Trains the table with one access and returns the resulting candidates.
    ///
    /// # Arguments
    ///
    /// * `tag` - Address of the issuing instruction.
    /// * `addr` - Requested address.
    /// * `now` - Logical clock, stored as the entry's `last_hit`.
    pub fn observe(&mut self, tag: u64, addr: u64, now: u64) -> Vec<AddrPriority> {
        let Some(idx) = self.table.iter().position(|e| e.tag == tag) else {
            self.allocate(tag, addr);
            return Vec::new();
        };

        let entry = &mut self.table[idx];
        entry.train(addr);
        entry.last_hit = now;
        let (state, stride) = (entry.state, entry.stride);

        if state == EntryState::NoPred {
            return Vec::new();
        }

        let stride = self.effective_stride(stride);
        let candidates: Vec<AddrPriority> = (1..=self.degree as i64)
            .map(|d| AddrPriority::new(addr.wrapping_add_signed(d.wrapping_mul(stride)), 0))
            .collect();
        trace!(
            "stride: pc {tag:#x} stride {stride} -> {} candidates",
            candidates.len()
        );
        self.predictions += candidates.len() as u64;
        candidates
    }

    /// Strides shorter than a line are rounded up to one line, keeping the sign.
    const fn effective_stride(&self, stride: i64) -> i64 {
        let line = self.line_bytes as i64;
        if stride.unsigned_abs() >= self.line_bytes {
            stride
        } else if stride < 0 {
            -line
        } else {
            line
        }
    }

    fn allocate(&mut self, tag: u64, addr: u64) {
        if self.table.len() >= self.capacity {
            // `min_by_key` keeps the first of equal keys.
            if let Some(victim) = self
                .table
                .iter()
                .enumerate()
                .min_by_key(|(_, e)| e.last_hit)
                .map(|(i, _)| i)
            {
                let evicted = self.table.remove(victim);
                debug!(
                    "stride: evicting pc {:#x} (last hit {})",
                    evicted.tag, evicted.last_hit
                );
            }
        }
        debug!("stride: new entry for pc {tag:#x} at {addr:#x}");
        self.table.push(RptEntry::new(tag, addr));
    }
}

impl Prefetcher for StridePrefetcher {
    fn name(&self) -> &'static str {
        "stride"
    }

    /// Observes an access and generates prefetch candidates.
    ///
    /// Accesses without an instruction address are ignored.
    fn calculate_prefetch(
        &mut self,
        access: &AccessInfo,
        now: u64,
        _probe: &dyn CacheProbe,
    ) -> Result<Vec<AddrPriority>, PrefetchError> {
        let Some(pc) = access.pc else {
            debug!("stride: ignoring request with no pc ({:#x})", access.addr.val());
            return Ok(Vec::new());
        };
        Ok(self.observe(pc, access.addr.val(), now))
    }
}
