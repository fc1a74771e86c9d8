//! Region transition predictor.
//!
//! A first-order Markov model over spatial regions. For every source region it
//! keeps the regions visited next and how often, sorted most frequent first,
//! so the prediction is the head of the list.
//!
//! Entries are only created explicitly through [`RegionTransitionTable::add_entry`].
//! Eviction clears an entry in place (key 0, no successors) instead of
//! removing it, so a cleared entry answers for region 0 until a later
//! [`RegionTransitionTable::add_entry`] reuses its slot. The table therefore
//! never holds more slots than regions that were live at the same time.

/// A successor region and the number of observed transitions to it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Transition {
    /// Destination region.
    pub region: u64,
    /// Number of times the transition was observed.
    pub count: u32,
}

/// Successors of one source region.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RegionTransitions {
    /// Source region.
    pub region: u64,
    /// Successors, highest count first.
    pub successors: Vec<Transition>,
}

/// Frequency table of region-to-region transitions.
#[derive(Clone, Debug, Default)]
pub struct RegionTransitionTable {
    entries: Vec<RegionTransitions>,
    /// Indices of cleared entries, reused before the table grows.
    free: Vec<usize>,
}

impl RegionTransitionTable {
    /// Creates an empty table.
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
            free: Vec::new(),
        }
    }

    fn position(&self, region: u64) -> Option<usize> {
        self.entries.iter().position(|e| e.region == region)
    }

    /// Adds an empty entry for `region`.
    ///
    /// The lowest cleared slot is reused; the table only grows when none is
    /// left.
    pub fn add_entry(&mut self, region: u64) {
        if let Some(idx) = self.free.pop() {
            let entry = &mut self.entries[idx];
            entry.region = region;
            entry.successors.clear();
            return;
        }
        self.entries.push(RegionTransitions {
            region,
            successors: Vec::new(),
        });
    }

    /// Counts one transition from `src` to `dst`.
    ///
    /// Does nothing when `src` has no entry.
    pub fn record_transition(&mut self, src: u64, dst: u64) {
        let Some(idx) = self.position(src) else {
            return;
        };
        let successors = &mut self.entries[idx].successors;
        match successors.iter_mut().find(|t| t.region == dst) {
            Some(t) => t.count = t.count.saturating_add(1),
            None => successors.push(Transition {
                region: dst,
                count: 1,
            }),
        }
        // Stable: equal counts keep their insertion order.
        successors.sort_by(|a, b| b.count.cmp(&a.count));
    }

    /// Most frequent successor of `src`.
    pub fn predict(&self, src: u64) -> Option<u64> {
        self.position(src)
            .and_then(|idx| self.entries[idx].successors.first())
            .map(|t| t.region)
    }

    /// Clears the entry for `region` in place.
    pub fn evict(&mut self, region: u64) {
        if let Some(idx) = self.position(region) {
            let entry = &mut self.entries[idx];
            entry.region = 0;
            entry.successors.clear();
            if let Err(at) = self.free.binary_search_by(|f| idx.cmp(f)) {
                self.free.insert(at, idx);
            }
        }
    }

    /// Successors of `src`, highest count first.
    pub fn successors(&self, src: u64) -> Option<&[Transition]> {
        self.position(src)
            .map(|idx| self.entries[idx].successors.as_slice())
    }

    /// All slots, cleared ones included, in creation order.
    pub fn entries(&self) -> &[RegionTransitions] {
        &self.entries
    }

    /// Number of slots, cleared ones included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no entry was ever added.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
