//! One cell of the slot array.

use core::cmp::Ordering;

/// Three-state slot. There is no fourth state.
#[derive(Debug, Default)]
pub(crate) enum Slot<T> {
    /// Never occupied since the array was (re)built.
    #[default]
    Empty,
    /// Held an item that has since been removed and released.
    Tombstone,
    Occupied(T),
}

/// What the probe sequence sees at a slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Visit {
    Empty,
    Tombstone,
    Equal,
    Different,
}

impl<T> Slot<T> {
    /// Classify the slot for a probe. `compare` only runs on occupied slots.
    #[inline]
    pub(crate) fn visit<F>(&self, compare: F) -> Visit
    where
        F: FnOnce(&T) -> Ordering,
    {
        match self {
            Slot::Empty => Visit::Empty,
            Slot::Tombstone => Visit::Tombstone,
            Slot::Occupied(v) => match compare(v) {
                Ordering::Equal => Visit::Equal,
                _ => Visit::Different,
            },
        }
    }

    #[inline]
    pub(crate) fn occupied(&self) -> Option<&T> {
        match self {
            Slot::Occupied(v) => Some(v),
            _ => None,
        }
    }

    #[inline]
    pub(crate) fn is_tombstone(&self) -> bool {
        matches!(self, Slot::Tombstone)
    }
}
