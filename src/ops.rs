//! Caller-supplied item behavior.
//!
//! The table knows nothing about the items it stores. Everything it needs to
//! place, find, copy and free an item comes through a [`TableOps`]
//! implementation that is fixed for the table's lifetime.

use core::borrow::Borrow;
use core::cmp::Ordering;

/// The capability set a [`HashTable`](crate::HashTable) is generic over.
///
/// `Item` is what callers pass in; `Owned` is the table's private copy,
/// produced by [`duplicate`](TableOps::duplicate) and consumed by
/// [`release`](TableOps::release) exactly once.
///
/// `hash` and `rehash` must be statistically independent: `hash` picks the
/// first slot, `rehash` picks the step between later slots. Only the
/// `Equal` outcome of `compare` is semantically relevant.
pub trait TableOps {
    type Item: ?Sized;
    type Owned: Borrow<Self::Item>;

    fn hash(&self, item: &Self::Item) -> u64;

    fn rehash(&self, item: &Self::Item) -> u64;

    fn compare(&self, a: &Self::Item, b: &Self::Item) -> Ordering;

    /// Make the owned copy stored in the table. `None` reports an allocation
    /// failure and leaves the table untouched.
    fn duplicate(&self, item: &Self::Item) -> Option<Self::Owned>;

    /// Dispose of an owned copy handed back by the table.
    fn release(&self, owned: Self::Owned);

    /// Heap bytes held by an owned copy, beyond `size_of::<Owned>()`.
    /// Only used for [`HashTable::footprint`](crate::HashTable::footprint).
    fn heap_size(&self, _owned: &Self::Owned) -> usize {
        0
    }
}
