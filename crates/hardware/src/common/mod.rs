//! Common utilities and types shared by the engines and the replay harness.
//!
//! This module provides fundamental building blocks used across the crate:
//! 1. **Address Types:** Strong types for requested and physical addresses.
//! 2. **Counters:** The saturating counter primitive.
//! 3. **Error Handling:** Configuration, engine, trace and simulation errors.

/// Address type definitions (requested and physical addresses).
pub mod addr;

/// Saturating counter primitive.
pub mod counter;

/// Error types.
pub mod error;

pub use addr::{PhysAddr, VirtAddr};
pub use counter::SatCounter;
pub use error::{ConfigError, PrefetchError, SimError, TraceError};
