//! Set-Associative Table.
//!
//! A capacity-bounded key → entry store used by every prefetcher table and by
//! the cache model. Entries live in `sets × ways` slots; a key maps to set
//! `key % sets` and may occupy any way of it. Each slot carries the full key,
//! a secure-domain flag and a valid bit next to the payload.
//!
//! The interface follows the usual associative-set protocol:
//! 1. `find` a valid entry by `(key, secure)`;
//! 2. on a miss, `find_victim` for the key (the slot comes back invalidated),
//!    then `insert` the key into that slot and fill the payload;
//! 3. `access` an entry on every use so the replacement policy can rank it;
//! 4. `invalidate` an entry to free its slot.
//!
//! Slots are addressed with [`EntryId`] handles rather than references, so a
//! caller can hold a handle across other table operations.

/// Victim selection algorithms.
pub mod policies;

use std::fmt;

use self::policies::ReplacementPolicy;
use crate::common::error::PrefetchError;
use crate::config::TableConfig;

/// Payload stored in an [`AssociativeTable`] slot.
pub trait TableEntry: Clone {
    /// Resets the payload to its empty state.
    fn invalidate(&mut self);
}

/// Handle to one slot of an [`AssociativeTable`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntryId {
    /// Set index.
    pub set: usize,
    /// Way index within the set.
    pub way: usize,
}

#[derive(Clone, Debug)]
struct Slot<E> {
    key: u64,
    secure: bool,
    valid: bool,
    entry: E,
}

/// A set-associative table of `E` entries.
pub struct AssociativeTable<E> {
    name: &'static str,
    sets: usize,
    ways: usize,
    slots: Vec<Slot<E>>,
    policy: Box<dyn ReplacementPolicy>,
}

impl<E: TableEntry> AssociativeTable<E> {
    /// Creates a table with every slot invalid and holding a copy of `prototype`.
    ///
    /// # Arguments
    ///
    /// * `name` - Table name used in errors and logs.
    /// * `config` - Entry count, associativity and replacement policy. The
    ///   geometry is expected to be validated already; degenerate values are
    ///   clamped to a single one-way set.
    /// * `prototype` - Empty payload copied into every slot.
    pub fn new(name: &'static str, config: &TableConfig, prototype: E) -> Self {
        let ways = config.assoc.max(1);
        let sets = (config.entries / ways).max(1);
        let mut empty = prototype;
        empty.invalidate();
        let slot = Slot {
            key: 0,
            secure: false,
            valid: false,
            entry: empty,
        };
        Self {
            name,
            sets,
            ways,
            slots: vec![slot; sets * ways],
            policy: policies::build(config.policy, sets, ways),
        }
    }

    /// Table name.
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Total number of slots.
    pub const fn capacity(&self) -> usize {
        self.sets * self.ways
    }

    /// Number of sets.
    pub const fn sets(&self) -> usize {
        self.sets
    }

    /// Associativity.
    pub const fn ways(&self) -> usize {
        self.ways
    }

    /// Number of valid entries.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.valid).count()
    }

    /// True when no slot holds a valid entry.
    pub fn is_empty(&self) -> bool {
        !self.slots.iter().any(|s| s.valid)
    }

    #[inline]
    const fn set_of(&self, key: u64) -> usize {
        (key % self.sets as u64) as usize
    }

    #[inline]
    const fn index(&self, id: EntryId) -> usize {
        id.set * self.ways + id.way
    }

    /// Looks up a valid entry by key and secure flag.
    pub fn find(&self, key: u64, secure: bool) -> Option<EntryId> {
        let set = self.set_of(key);
        let base = set * self.ways;
        self.slots[base..base + self.ways]
            .iter()
            .position(|s| s.valid && s.key == key && s.secure == secure)
            .map(|way| EntryId { set, way })
    }

    /// Chooses the slot a new entry for `key` will occupy, without freeing it.
    ///
    /// An invalid way of the key's set is preferred; otherwise the replacement
    /// policy picks one. Callers that need to know what is being displaced
    /// inspect the slot before calling [`AssociativeTable::invalidate`].
    ///
    /// # Errors
    ///
    /// Returns [`PrefetchError::NoVictim`] when the policy names a way outside
    /// the set.
    pub fn select_victim(&mut self, key: u64) -> Result<EntryId, PrefetchError> {
        let set = self.set_of(key);
        let base = set * self.ways;
        let way = match self.slots[base..base + self.ways]
            .iter()
            .position(|s| !s.valid)
        {
            Some(way) => way,
            None => self.policy.victim(set),
        };
        if way >= self.ways {
            return Err(PrefetchError::NoVictim {
                table: self.name,
                key,
            });
        }
        Ok(EntryId { set, way })
    }

    /// Chooses the slot a new entry for `key` will occupy and frees it.
    ///
    /// # Errors
    ///
    /// Returns [`PrefetchError::NoVictim`] when no slot can be chosen.
    pub fn find_victim(&mut self, key: u64) -> Result<EntryId, PrefetchError> {
        let id = self.select_victim(key)?;
        self.invalidate(id);
        Ok(id)
    }

    /// Tags slot `id` with `key`, marks it valid and resets its replacement state.
    pub fn insert(&mut self, key: u64, secure: bool, id: EntryId) {
        let idx = self.index(id);
        let slot = &mut self.slots[idx];
        slot.key = key;
        slot.secure = secure;
        slot.valid = true;
        self.policy.reset(id.set, id.way);
    }

    /// Records a use of the entry for the replacement policy.
    pub fn access(&mut self, id: EntryId) {
        self.policy.touch(id.set, id.way);
    }

    /// Frees slot `id` and clears its payload.
    pub fn invalidate(&mut self, id: EntryId) {
        let idx = self.index(id);
        let slot = &mut self.slots[idx];
        slot.valid = false;
        slot.key = 0;
        slot.secure = false;
        slot.entry.invalidate();
        self.policy.invalidate(id.set, id.way);
    }

    /// True when slot `id` holds a valid entry.
    pub fn is_valid(&self, id: EntryId) -> bool {
        self.slots[self.index(id)].valid
    }

    /// Secure flag of slot `id`.
    pub fn is_secure(&self, id: EntryId) -> bool {
        self.slots[self.index(id)].secure
    }

    /// Key of slot `id`.
    pub fn key(&self, id: EntryId) -> u64 {
        self.slots[self.index(id)].key
    }

    /// Payload of slot `id`.
    pub fn get(&self, id: EntryId) -> &E {
        &self.slots[self.index(id)].entry
    }

    /// Mutable payload of slot `id`.
    pub fn get_mut(&mut self, id: EntryId) -> &mut E {
        let idx = self.index(id);
        &mut self.slots[idx].entry
    }

    /// Handles of all valid entries, in slot order.
    ///
    /// Returned as a vector so the caller may mutate the table while walking it.
    pub fn valid_ids(&self) -> Vec<EntryId> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, s)| s.valid)
            .map(|(i, _)| EntryId {
                set: i / self.ways,
                way: i % self.ways,
            })
            .collect()
    }

    /// Iterates over valid entries as `(key, secure, entry)`, in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (u64, bool, &E)> {
        self.slots
            .iter()
            .filter(|s| s.valid)
            .map(|s| (s.key, s.secure, &s.entry))
    }
}

impl<E> fmt::Debug for AssociativeTable<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssociativeTable")
            .field("name", &self.name)
            .field("sets", &self.sets)
            .field("ways", &self.ways)
            .field("valid", &self.slots.iter().filter(|s| s.valid).count())
            .finish_non_exhaustive()
    }
}
