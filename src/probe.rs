//! Double-hashing probe sequence shared by insert, find, remove and
//! reorganization.

use crate::slot::Visit;
use std::sync::atomic::{AtomicU64, Ordering};

/// Diagnostic counters. Only ever incremented.
#[derive(Debug, Default)]
pub(crate) struct Counters {
    probes: AtomicU64,
    misses: AtomicU64,
}

impl Counters {
    #[inline]
    fn probe(&self) {
        self.probes.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    fn miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn probes(&self) -> u64 {
        self.probes.load(Ordering::Relaxed)
    }

    pub(crate) fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Mode {
    /// Tombstones are skipped; stop at an empty or equal slot.
    Lookup,
    /// As lookup, but the first tombstone seen is remembered as the
    /// insertion point.
    Insert,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Outcome {
    Found(usize),
    /// Insert mode only: where the new item goes.
    Vacant(usize),
    Missing,
}

/// Step between probes: `rehash mod (capacity >> 3) + 1`. Kept small
/// relative to the table so successive probes stay close together.
#[inline]
pub(crate) fn step(capacity: usize, rehash: u64) -> usize {
    let span = (capacity >> 3).max(1) as u64;
    (rehash % span) as usize + 1
}

/// Walk the probe sequence for an item with primary hash `hash`.
///
/// `rehash` is evaluated at most once, on the first collision. `visit`
/// classifies the slot at an index. At most `capacity` slots are examined;
/// running out yields the remembered tombstone in insert mode, `Missing`
/// otherwise.
pub(crate) fn probe<R, V>(
    capacity: usize,
    hash: u64,
    rehash: R,
    mode: Mode,
    counters: &Counters,
    mut visit: V,
) -> Outcome
where
    R: FnOnce() -> u64,
    V: FnMut(usize) -> Visit,
{
    if capacity == 0 {
        return Outcome::Missing;
    }

    let mut index = (hash % capacity as u64) as usize;
    let mut rehash = Some(rehash);
    let mut stride = 0;
    let mut reusable = None;

    for n in 1..=capacity {
        counters.probe();
        match visit(index) {
            Visit::Empty => {
                return match mode {
                    Mode::Lookup => Outcome::Missing,
                    Mode::Insert => Outcome::Vacant(reusable.unwrap_or(index)),
                };
            }
            Visit::Equal => return Outcome::Found(index),
            Visit::Tombstone => {
                if mode == Mode::Insert && reusable.is_none() {
                    reusable = Some(index);
                }
            }
            Visit::Different => {}
        }
        if n == capacity {
            break;
        }

        if let Some(f) = rehash.take() {
            stride = step(capacity, f());
        }
        counters.miss();
        index = (index + stride) % capacity;
    }

    match reusable {
        Some(i) => Outcome::Vacant(i),
        None => Outcome::Missing,
    }
}
