//! Slot-array sizing.
//!
//! Growth walks a fixed ladder of capacities, each the largest prime below a
//! power of two starting at 2^8. A slot array of that length plus allocator
//! bookkeeping still fits the power-of-two block, and a prime length keeps
//! every double-hashing step coprime with the capacity so a probe sequence
//! can reach every slot.

use crate::error::TableError;
use crate::slot::Slot;

/// Capacity of a freshly created table.
pub const INITIAL_CAPACITY: usize = 17;

/// Smallest capacity a table may be created with; `capacity >> 3` must not
/// be zero.
pub const MIN_CAPACITY: usize = 8;

/// Growth ladder. Running off the end is a terminal `TableFull`.
pub const CAPACITIES: [usize; 24] = [
    251,
    509,
    1_021,
    2_039,
    4_093,
    8_191,
    16_381,
    32_749,
    65_521,
    131_071,
    262_139,
    524_287,
    1_048_573,
    2_097_143,
    4_194_301,
    8_388_593,
    16_777_213,
    33_554_393,
    67_108_859,
    134_217_689,
    268_435_399,
    536_870_909,
    1_073_741_789,
    2_147_483_647,
];

/// The next capacity on the ladder strictly above `current`.
pub fn next_capacity(current: usize) -> Option<usize> {
    CAPACITIES.iter().copied().find(|&c| c > current)
}

/// Number of non-empty slots (live plus tombstones) at which the table
/// reorganizes: 7/8 of capacity.
#[inline]
pub const fn threshold(capacity: usize) -> usize {
    capacity - capacity / 8
}

/// Allocate `n` empty slots, reporting allocation failure instead of
/// aborting.
pub(crate) fn alloc_slots<T>(n: usize) -> Result<Vec<Slot<T>>, TableError> {
    #[cfg(test)]
    let capped = n > alloc_limit::get();
    #[cfg(not(test))]
    let capped = false;
    if capped {
        return Err(TableError::OutOfMemory);
    }
    let mut slots = Vec::new();
    slots
        .try_reserve_exact(n)
        .map_err(|_| TableError::OutOfMemory)?;
    slots.resize_with(n, Slot::default);
    Ok(slots)
}
