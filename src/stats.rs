//! Table statistics and sticky error state.

use bitflags::bitflags;

/// Layout version of [`Stats`].
pub const STATS_VERSION: u32 = 1;

bitflags! {
    /// Accumulated failure kinds. Bits are OR'd in as failures happen and are
    /// only cleared by [`HashTable::clear_errors`](crate::HashTable::clear_errors).
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct ErrorFlags: u32 {
        const OUT_OF_MEMORY = 1 << 0;
        const TABLE_FULL = 1 << 1;
        const INTERRUPTED = 1 << 2;
    }
}

impl Default for ErrorFlags {
    fn default() -> Self {
        Self::empty()
    }
}

/// A point-in-time copy of a table's counters.
///
/// `entries` counts every non-empty slot, tombstones included;
/// `live_entries` is `entries - tombstones`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Stats {
    /// Slots examined by any probe sequence.
    pub probes: u64,
    /// Rehash-driven jumps between slots.
    pub misses: u64,
    pub entries: usize,
    pub live_entries: usize,
    pub tombstones: usize,
    pub capacity: usize,
    pub errors: ErrorFlags,
    pub version: u32,
}
