//! Set-Associative Cache Residency Model.
//!
//! A tag-only cache used by the replay harness. It answers the two questions
//! the prefetchers ask (is a line resident, is it being filled) and tracks
//! which resident lines were brought in by a prefetch so their first demand
//! use can be counted.
//!
//! Lines are stored in an [`AssociativeTable`] keyed by line number, so the
//! cache shares its indexing and replacement policies with the prefetcher
//! tables.

/// Outstanding fill queue.
pub mod miss_queue;

pub use self::miss_queue::{MissQueue, PendingFill};

use crate::common::addr::line_number;
use crate::common::error::PrefetchError;
use crate::config::{CacheConfig, TableConfig};
use crate::core::units::prefetch::CacheProbe;
use crate::core::units::table::{AssociativeTable, TableEntry};

/// Per-line bookkeeping.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheLine {
    /// The line was installed by a prefetch.
    pub prefetched: bool,
    /// A demand access has touched the prefetched line.
    pub used: bool,
}

impl TableEntry for CacheLine {
    fn invalidate(&mut self) {
        *self = Self::default();
    }
}

/// Result of a demand lookup.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AccessOutcome {
    /// The line was resident.
    pub hit: bool,
    /// The hit was the first demand use of a prefetched line.
    pub prefetch_hit: bool,
}

/// A line displaced by an install.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Eviction {
    /// Line-aligned address of the displaced line.
    pub addr: u64,
    /// The line was prefetched and never used.
    pub unused_prefetch: bool,
}

/// Cache residency model.
#[derive(Debug)]
pub struct CacheSim {
    lines: AssociativeTable<CacheLine>,
    line_bytes: u64,
    miss_queue: MissQueue,
}

impl CacheSim {
    /// Creates an empty cache.
    ///
    /// # Arguments
    ///
    /// * `config` - Cache geometry, replacement policy and miss queue depth.
    pub fn new(config: &CacheConfig) -> Self {
        let line_bytes = config.line_bytes.max(1);
        let geometry = TableConfig {
            entries: config.size_bytes / line_bytes,
            assoc: config.ways,
            policy: config.policy,
        };
        Self {
            lines: AssociativeTable::new("cache", &geometry, CacheLine::default()),
            line_bytes: line_bytes as u64,
            miss_queue: MissQueue::new(config.miss_queue_entries, line_bytes),
        }
    }

    /// Cache line size in bytes.
    pub const fn line_bytes(&self) -> u64 {
        self.line_bytes
    }

    /// Line-aligned address of `addr`.
    pub const fn line_addr(&self, addr: u64) -> u64 {
        addr - addr % self.line_bytes
    }

    /// Number of resident lines.
    pub fn resident_lines(&self) -> usize {
        self.lines.len()
    }

    /// Total number of line slots.
    pub fn capacity(&self) -> usize {
        self.lines.capacity()
    }

    /// Outstanding fills.
    pub const fn miss_queue(&self) -> &MissQueue {
        &self.miss_queue
    }

    /// Mutable access to the outstanding fills.
    pub const fn miss_queue_mut(&mut self) -> &mut MissQueue {
        &mut self.miss_queue
    }

    /// True when the line containing `addr` is resident.
    pub fn contains(&self, addr: u64, secure: bool) -> bool {
        self.lines
            .find(line_number(addr, self.line_bytes), secure)
            .is_some()
    }

    /// Demand lookup.
    ///
    /// A hit refreshes the line's replacement state and marks a prefetched
    /// line as used.
    pub fn access(&mut self, addr: u64, secure: bool) -> AccessOutcome {
        let Some(id) = self.lines.find(line_number(addr, self.line_bytes), secure) else {
            return AccessOutcome::default();
        };
        self.lines.access(id);
        let line = self.lines.get_mut(id);
        let prefetch_hit = line.prefetched && !line.used;
        if prefetch_hit {
            line.used = true;
        }
        AccessOutcome {
            hit: true,
            prefetch_hit,
        }
    }

    /// Installs the line containing `addr`.
    ///
    /// Installing a line that is already resident only refreshes it.
    ///
    /// # Returns
    ///
    /// The line displaced to make room, if any.
    ///
    /// # Errors
    ///
    /// Returns [`PrefetchError::NoVictim`] if the replacement policy fails to
    /// name a way.
    pub fn install(
        &mut self,
        addr: u64,
        secure: bool,
        prefetched: bool,
    ) -> Result<Option<Eviction>, PrefetchError> {
        let key = line_number(addr, self.line_bytes);
        if let Some(id) = self.lines.find(key, secure) {
            self.lines.access(id);
            return Ok(None);
        }

        let id = self.lines.select_victim(key)?;
        let evicted = self.lines.is_valid(id).then(|| {
            let line = self.lines.get(id);
            Eviction {
                addr: self.lines.key(id) * self.line_bytes,
                unused_prefetch: line.prefetched && !line.used,
            }
        });
        self.lines.invalidate(id);
        self.lines.insert(key, secure, id);
        *self.lines.get_mut(id) = CacheLine {
            prefetched,
            used: false,
        };
        Ok(evicted)
    }
}

impl CacheProbe for CacheSim {
    fn resident(&self, addr: u64, secure: bool) -> bool {
        self.contains(addr, secure)
    }

    fn in_flight(&self, addr: u64, secure: bool) -> bool {
        self.miss_queue.contains(addr, secure)
    }
}
