//! Requested and physical address types.
//!
//! Every access seen by the prefetchers carries two addresses: the address the
//! program requested and the physical address it resolved to. This module
//! provides the following:
//! 1. **Type Safety:** Keeps the two address spaces apart in `AccessInfo`.
//! 2. **Geometry:** Line and region alignment helpers used by the engines and
//!    the cache model.

/// An address as requested by the program (the address the engines train on).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VirtAddr(pub u64);

/// The physical address an access resolved to.
///
/// The spatial engine records it when a generation starts, and later probes
/// the cache with physical line addresses derived from it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PhysAddr(pub u64);

impl VirtAddr {
    /// Creates a new requested address from a raw 64-bit value.
    #[inline(always)]
    pub const fn new(addr: u64) -> Self {
        Self(addr)
    }

    /// Returns the raw 64-bit address value.
    #[inline(always)]
    pub const fn val(&self) -> u64 {
        self.0
    }

    /// Returns the spatial region number containing this address.
    ///
    /// # Arguments
    ///
    /// * `region_size` - Region size in bytes (a power of two).
    #[inline]
    pub const fn region(&self, region_size: u64) -> u64 {
        self.0 / region_size
    }

    /// Returns the offset, in cache lines, of this address within its region.
    ///
    /// # Arguments
    ///
    /// * `region_size` - Region size in bytes (a power of two).
    /// * `line_bytes` - Cache line size in bytes.
    #[inline]
    pub const fn region_offset(&self, region_size: u64, line_bytes: u64) -> u64 {
        (self.0 % region_size) / line_bytes
    }
}

impl PhysAddr {
    /// Creates a new physical address from a raw 64-bit value.
    #[inline(always)]
    pub const fn new(addr: u64) -> Self {
        Self(addr)
    }

    /// Returns the raw 64-bit address value.
    #[inline(always)]
    pub const fn val(&self) -> u64 {
        self.0
    }

    /// Aligns the address down to a power-of-two boundary.
    #[inline]
    pub const fn align_down(&self, align: u64) -> Self {
        Self(self.0 & !(align - 1))
    }
}

impl From<u64> for VirtAddr {
    fn from(addr: u64) -> Self {
        Self(addr)
    }
}

impl From<u64> for PhysAddr {
    fn from(addr: u64) -> Self {
        Self(addr)
    }
}

/// Returns the number of the cache line containing `addr`.
#[inline]
pub const fn line_number(addr: u64, line_bytes: u64) -> u64 {
    addr / line_bytes
}
