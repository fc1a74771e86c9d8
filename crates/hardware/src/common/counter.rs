//! Saturating counter.
//!
//! A fixed-width counter that stops at its maximum instead of wrapping. The
//! spatial engine uses 2-bit instances as per-offset confidence.

/// An n-bit saturating counter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SatCounter {
    value: u8,
    max: u8,
}

impl SatCounter {
    /// Creates a zeroed counter `bits` wide (1 to 8 bits).
    ///
    /// Widths outside that range are clamped.
    pub const fn new(bits: u32) -> Self {
        let bits = if bits == 0 {
            1
        } else if bits > 8 {
            8
        } else {
            bits
        };
        let max = ((1u16 << bits) - 1) as u8;
        Self { value: 0, max }
    }

    /// Increments the counter, saturating at the maximum.
    #[inline]
    pub const fn increment(&mut self) {
        if self.value < self.max {
            self.value += 1;
        }
    }

    /// Decrements the counter, saturating at zero.
    #[inline]
    pub const fn decrement(&mut self) {
        if self.value > 0 {
            self.value -= 1;
        }
    }

    /// Resets the counter to zero.
    #[inline]
    pub const fn reset(&mut self) {
        self.value = 0;
    }

    /// Current value.
    #[inline]
    pub const fn value(&self) -> u8 {
        self.value
    }

    /// Largest representable value.
    #[inline]
    pub const fn max(&self) -> u8 {
        self.max
    }

    /// True when the counter holds zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.value == 0
    }

    /// True when the counter sits at its maximum.
    #[inline]
    pub const fn is_saturated(&self) -> bool {
        self.value == self.max
    }
}
