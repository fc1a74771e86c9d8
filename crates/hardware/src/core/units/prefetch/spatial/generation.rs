//! Generation entries.
//!
//! One entry shape serves all three spatial tables. An entry records, for one
//! spatial region, the physical address and instruction that started the
//! generation and the sequence of line offsets touched within the region.

use crate::common::counter::SatCounter;
use crate::core::units::table::TableEntry;

/// Width of the per-offset confidence counters.
pub const CONFIDENCE_BITS: u32 = 2;

/// One recorded offset within a region.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SequenceSlot {
    /// Confidence; zero marks the slot as free.
    pub counter: SatCounter,
    /// Offset, in cache lines, within the spatial region.
    pub offset: u32,
    /// Accesses to other regions between the previous offset and this one.
    pub delta: u32,
}

impl Default for SequenceSlot {
    fn default() -> Self {
        Self {
            counter: SatCounter::new(CONFIDENCE_BITS),
            offset: 0,
            delta: 0,
        }
    }
}

impl SequenceSlot {
    /// True when the slot holds a recorded offset.
    #[inline]
    pub const fn is_used(&self) -> bool {
        !self.counter.is_zero()
    }
}

/// Filter, active generation and pattern sequence table entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GenerationEntry {
    /// Physical address of the access that started the generation.
    pub paddr: u64,
    /// Instruction that started the generation.
    pub pc: u64,
    /// Accesses to other regions since the last offset was recorded.
    pub seq_counter: u32,
    /// Recorded offsets, one slot per line of the region.
    pub sequence: Vec<SequenceSlot>,
}

impl GenerationEntry {
    /// Creates an empty entry with `positions` sequence slots.
    pub fn new(positions: usize) -> Self {
        Self {
            paddr: 0,
            pc: 0,
            seq_counter: 0,
            sequence: vec![SequenceSlot::default(); positions],
        }
    }

    /// Records an access to line `offset` of the region.
    ///
    /// A slot already holding `offset` gains confidence; otherwise the first
    /// free slot takes the offset, stamped with the current interleaving
    /// count. When every slot is taken by other offsets the access is dropped.
    /// The interleaving count restarts either way.
    pub fn add_offset(&mut self, offset: u32) {
        if let Some(slot) = self
            .sequence
            .iter_mut()
            .find(|s| s.is_used() && s.offset == offset)
        {
            slot.counter.increment();
        } else if let Some(slot) = self.sequence.iter_mut().find(|s| !s.is_used()) {
            slot.counter.increment();
            slot.offset = offset;
            slot.delta = self.seq_counter;
        }
        self.seq_counter = 0;
    }

    /// Overwrites this entry's data with that of a finished generation.
    pub fn update_from(&mut self, other: &Self) {
        self.paddr = other.paddr;
        self.pc = other.pc;
        self.seq_counter = other.seq_counter;
        self.sequence.clone_from(&other.sequence);
    }

    /// Offsets with non-zero confidence, in slot order.
    pub fn recorded_offsets(&self) -> impl Iterator<Item = u32> + '_ {
        self.sequence.iter().filter(|s| s.is_used()).map(|s| s.offset)
    }
}

impl TableEntry for GenerationEntry {
    fn invalidate(&mut self) {
        self.paddr = 0;
        self.pc = 0;
        self.seq_counter = 0;
        for slot in &mut self.sequence {
            slot.counter.reset();
            slot.offset = 0;
            slot.delta = 0;
        }
    }
}
