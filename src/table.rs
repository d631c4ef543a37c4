//! HashTable: the open-addressing engine.
//!
//! All slot and counter mutations happen under one `parking_lot::RwLock`.
//! `find`, `walk` and `stats` take the read lock; `insert`, `remove` and
//! `retain` take the write lock, and any reorganization triggered by an
//! insert runs under that same write lock.

use crate::capacity::{self, alloc_slots, next_capacity};
use crate::config::TableConfig;
use crate::error::TableError;
use crate::ops::TableOps;
use crate::probe::{probe, Counters, Mode, Outcome};
use crate::reentrancy::{DebugReentrancy, ReentrancyGuard};
use crate::slot::Slot;
use crate::stats::{ErrorFlags, Stats, STATS_VERSION};
use core::borrow::Borrow;
use core::mem;
use core::ops::{ControlFlow, Deref};
use parking_lot::{MappedRwLockReadGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// A borrowed view of an item stored in the table.
///
/// Holds the table's read lock: writers on any thread wait until it is
/// dropped. Calling into the same table from this thread while holding it
/// panics in debug builds and may deadlock in release builds.
pub struct Stored<'a, T> {
    // Declared first so the lock is released before the guard is left.
    value: MappedRwLockReadGuard<'a, T>,
    _entered: ReentrancyGuard<'a>,
}

impl<T> Deref for Stored<'_, T> {
    type Target = T;

    #[inline]
    fn deref(&self) -> &T {
        &self.value
    }
}

impl<T: core::fmt::Debug> core::fmt::Debug for Stored<'_, T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Debug::fmt(&*self.value, f)
    }
}

struct Inner<T> {
    slots: Vec<Slot<T>>,
    // Non-empty slots, tombstones included.
    entries: usize,
    tombstones: usize,
    errors: ErrorFlags,
}

impl<T> Inner<T> {
    #[inline]
    fn capacity(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    fn live(&self) -> usize {
        self.entries - self.tombstones
    }

    /// Room left before the 7/8 threshold; non-positive means reorganize.
    #[inline]
    fn free(&self) -> isize {
        capacity::threshold(self.capacity()) as isize - self.entries as isize
    }
}

/// A generic open-addressing hash table with double hashing, tombstone
/// deletion and online growth.
///
/// Items are described entirely by the table's [`TableOps`]. The table owns
/// a private copy of every stored item and releases each copy exactly once:
/// on [`remove`](Self::remove), [`retain`](Self::retain) or drop.
///
/// ```
/// use dhtable::{HashTable, StrOps};
///
/// let table = HashTable::new(StrOps).unwrap();
/// table.insert("apple").unwrap();
/// assert_eq!(&**table.find("apple").unwrap(), "apple");
/// assert_eq!(table.remove("apple"), Some("apple"));
/// assert!(table.find("apple").is_none());
/// ```
pub struct HashTable<O: TableOps> {
    ops: O,
    config: TableConfig,
    inner: RwLock<Inner<O::Owned>>,
    counters: Counters,
    reentrancy: DebugReentrancy,
}

impl<O: TableOps> HashTable<O> {
    /// Create an empty table with the default configuration.
    pub fn new(ops: O) -> Result<Self, TableError> {
        Self::with_config(ops, TableConfig::default())
    }

    /// Create an empty table. Fails on an invalid initial capacity or if the
    /// first slot array cannot be allocated.
    pub fn with_config(ops: O, config: TableConfig) -> Result<Self, TableError> {
        config.validate()?;
        let slots = alloc_slots(config.capacity())?;
        Ok(Self {
            ops,
            config,
            inner: RwLock::new(Inner {
                slots,
                entries: 0,
                tombstones: 0,
                errors: ErrorFlags::empty(),
            }),
            counters: Counters::default(),
            reentrancy: DebugReentrancy::new(),
        })
    }

    pub fn ops(&self) -> &O {
        &self.ops
    }

    pub fn config(&self) -> &TableConfig {
        &self.config
    }

    /// Current slot count.
    pub fn capacity(&self) -> usize {
        let _g = self.reentrancy.enter();
        self.inner.read().capacity()
    }

    /// Number of live items.
    pub fn len(&self) -> usize {
        let _g = self.reentrancy.enter();
        self.inner.read().live()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Insert a copy of `item`, returning the stored copy.
    ///
    /// If an equal item is already present, that item is returned unchanged
    /// and no copy is made; to replace it, remove it first. When the table
    /// has reached its 7/8 load threshold it is reorganized before the
    /// insert, either in place (when tombstones dominate) or into the next
    /// capacity on the ladder.
    ///
    /// # Errors
    ///
    /// - [`TableError::OutOfMemory`] if `duplicate` or an allocation failed.
    /// - [`TableError::TableFull`] if no room could be made, including when
    ///   the probe sequence cannot reach a free slot and growth fails.
    /// - [`TableError::Interrupted`] if a reorganization was rolled back.
    pub fn insert(&self, item: &O::Item) -> Result<Stored<'_, O::Owned>, TableError> {
        let g = self.reentrancy.enter();
        let mut inner = self.inner.write();

        if inner.free() <= 0 {
            if let Err(e) = self.reorganize(&mut inner, false) {
                inner.errors |= e.flag() | ErrorFlags::TABLE_FULL;
                return Err(e);
            }
        }

        let mut outcome = self.locate(&inner, item, Mode::Insert);
        if outcome == Outcome::Missing {
            // The step shares a factor with a non-prime capacity; the ladder
            // capacities are all prime.
            if let Err(e) = self.reorganize(&mut inner, true) {
                inner.errors |= e.flag() | ErrorFlags::TABLE_FULL;
                return Err(e);
            }
            outcome = self.locate(&inner, item, Mode::Insert);
        }

        let index = match outcome {
            Outcome::Found(i) => i,
            Outcome::Vacant(i) => {
                let Some(owned) = self.ops.duplicate(item) else {
                    inner.errors |= ErrorFlags::OUT_OF_MEMORY;
                    return Err(TableError::OutOfMemory);
                };
                if inner.slots[i].is_tombstone() {
                    inner.tombstones -= 1;
                } else {
                    inner.entries += 1;
                }
                inner.slots[i] = Slot::Occupied(owned);
                if self.config.is_debug() {
                    tracing::trace!(slot = i, entries = inner.entries, "insert");
                }
                i
            }
            Outcome::Missing => {
                inner.errors |= ErrorFlags::TABLE_FULL;
                return Err(TableError::TableFull);
            }
        };

        let guard = RwLockWriteGuard::downgrade(inner);
        Ok(Stored {
            value: RwLockReadGuard::map(guard, |inner| stored_at(inner, index)),
            _entered: g,
        })
    }

    /// Look up the stored item equal to `item`.
    pub fn find(&self, item: &O::Item) -> Option<Stored<'_, O::Owned>> {
        let g = self.reentrancy.enter();
        let inner = self.inner.read();
        let Outcome::Found(index) = self.locate(&inner, item, Mode::Lookup) else {
            return None;
        };
        Some(Stored {
            value: RwLockReadGuard::map(inner, |inner| stored_at(inner, index)),
            _entered: g,
        })
    }

    /// Run `f` on the stored item equal to `item` without handing out a
    /// guard.
    pub fn find_with<F, R>(&self, item: &O::Item, f: F) -> Option<R>
    where
        F: FnOnce(&O::Owned) -> R,
    {
        let _g = self.reentrancy.enter();
        let inner = self.inner.read();
        match self.locate(&inner, item, Mode::Lookup) {
            Outcome::Found(index) => inner.slots[index].occupied().map(f),
            _ => None,
        }
    }

    pub fn contains(&self, item: &O::Item) -> bool {
        self.find_with(item, |_| ()).is_some()
    }

    /// Remove the item equal to `item`, releasing the stored copy.
    ///
    /// Returns the caller's own `item` reference on success. The stored copy
    /// has already been released at that point; only the caller's key comes
    /// back.
    pub fn remove<'q>(&self, item: &'q O::Item) -> Option<&'q O::Item> {
        let _g = self.reentrancy.enter();
        let mut inner = self.inner.write();
        let Outcome::Found(index) = self.locate(&inner, item, Mode::Lookup) else {
            return None;
        };

        // Counters match the slots before any caller code runs.
        let vacated = mem::replace(&mut inner.slots[index], Slot::Tombstone);
        inner.tombstones += 1;
        if self.config.is_debug() {
            tracing::trace!(slot = index, tombstones = inner.tombstones, "remove");
        }
        if let Slot::Occupied(owned) = vacated {
            self.ops.release(owned);
        }
        Some(item)
    }

    /// Remove every item for which `keep` returns `false`. Returns how many
    /// were removed.
    pub fn retain<F>(&self, mut keep: F) -> usize
    where
        F: FnMut(&O::Owned) -> bool,
    {
        let _g = self.reentrancy.enter();
        let mut inner = self.inner.write();
        let mut removed = 0;
        for index in 0..inner.slots.len() {
            let drop_it = match inner.slots[index].occupied() {
                Some(owned) => !keep(owned),
                None => false,
            };
            if !drop_it {
                continue;
            }
            let vacated = mem::replace(&mut inner.slots[index], Slot::Tombstone);
            inner.tombstones += 1;
            removed += 1;
            if let Slot::Occupied(owned) = vacated {
                self.ops.release(owned);
            }
        }
        removed
    }

    /// Visit every stored item in slot order until `f` breaks.
    ///
    /// Holds the read lock for the whole walk, so `f` must not call back
    /// into this table. Use [`retain`](Self::retain) to remove while
    /// scanning.
    pub fn walk<B, F>(&self, mut f: F) -> ControlFlow<B>
    where
        F: FnMut(&O::Owned) -> ControlFlow<B>,
    {
        let _g = self.reentrancy.enter();
        let inner = self.inner.read();
        for owned in inner.slots.iter().filter_map(Slot::occupied) {
            f(owned)?;
        }
        ControlFlow::Continue(())
    }

    /// Snapshot of the table's counters.
    pub fn stats(&self) -> Stats {
        let _g = self.reentrancy.enter();
        let inner = self.inner.read();
        Stats {
            probes: self.counters.probes(),
            misses: self.counters.misses(),
            entries: inner.entries,
            live_entries: inner.live(),
            tombstones: inner.tombstones,
            capacity: inner.capacity(),
            errors: inner.errors,
            version: STATS_VERSION,
        }
    }

    /// Return the accumulated error flags and reset them.
    pub fn clear_errors(&self) -> ErrorFlags {
        let _g = self.reentrancy.enter();
        mem::take(&mut self.inner.write().errors)
    }

    /// Approximate bytes used: the slot array, the table itself, and the
    /// per-item size reported by the ops.
    pub fn footprint(&self) -> usize {
        let _g = self.reentrancy.enter();
        let inner = self.inner.read();
        let items: usize = inner
            .slots
            .iter()
            .filter_map(Slot::occupied)
            .map(|owned| self.ops.heap_size(owned))
            .sum();
        mem::size_of::<Self>() + inner.slots.capacity() * mem::size_of::<Slot<O::Owned>>() + items
    }

    /// (occupied, tombstone) slot counts read straight from the array.
    #[cfg(test)]
    pub(crate) fn slot_census(&self) -> (usize, usize) {
        let inner = self.inner.read();
        let occupied = inner.slots.iter().filter(|s| s.occupied().is_some()).count();
        let tombs = inner.slots.iter().filter(|s| s.is_tombstone()).count();
        (occupied, tombs)
    }

    fn locate(&self, inner: &Inner<O::Owned>, item: &O::Item, mode: Mode) -> Outcome {
        probe(
            inner.capacity(),
            self.ops.hash(item),
            || self.ops.rehash(item),
            mode,
            &self.counters,
            |i| inner.slots[i].visit(|stored| self.ops.compare(key_of::<O>(stored), item)),
        )
    }

    /// Rebuild the slot array, dropping tombstones. Reclaims in place when
    /// tombstones exceed a quarter of the live items (unless `grow` is set),
    /// otherwise moves to the next capacity on the ladder. Either fully
    /// succeeds or leaves `inner` untouched.
    fn reorganize(&self, inner: &mut Inner<O::Owned>, grow: bool) -> Result<(), TableError> {
        let old_capacity = inner.capacity();
        let live = inner.live();
        let reclaim = !grow && inner.tombstones > live / 4;
        let capacity = if reclaim {
            old_capacity
        } else {
            match next_capacity(old_capacity).filter(|&c| c <= self.config.max()) {
                Some(c) => c,
                None => {
                    tracing::warn!(capacity = old_capacity, "capacity ladder exhausted");
                    return Err(TableError::TableFull);
                }
            }
        };

        let slots = alloc_slots(capacity).inspect_err(|_| {
            tracing::warn!(capacity, "slot array allocation failed");
        })?;
        let mut moves = Vec::new();
        moves
            .try_reserve_exact(live)
            .map_err(|_| TableError::OutOfMemory)?;

        let mut placement = Placement {
            old: &mut inner.slots,
            new: slots,
            moves,
            committed: false,
        };
        for from in 0..placement.old.len() {
            let Some(owned) = placement.old[from].occupied() else {
                continue;
            };
            let key = key_of::<O>(owned);
            let new = &placement.new;
            let outcome = probe(
                capacity,
                self.ops.hash(key),
                || self.ops.rehash(key),
                Mode::Insert,
                &self.counters,
                |i| new[i].visit(|other| self.ops.compare(key_of::<O>(other), key)),
            );
            if let Outcome::Vacant(to) = outcome {
                placement.new[to] = mem::take(&mut placement.old[from]);
                placement.moves.push((from, to));
            }
        }

        let moved = placement.moves.len();
        if moved != live {
            tracing::warn!(
                capacity = old_capacity,
                expected = live,
                moved,
                "reorganization failed consistency check; rolled back"
            );
            return Err(TableError::Interrupted);
        }

        inner.slots = placement.commit();
        inner.entries = moved;
        inner.tombstones = 0;

        tracing::debug!(
            old_capacity,
            capacity,
            moved,
            reclaim,
            "reorganized"
        );
        Ok(())
    }
}

/// Items moved from `old` into `new` during a reorganization. Unless
/// committed, dropping it puts every moved item back where it came from,
/// including when a callback panics mid-move.
struct Placement<'a, T> {
    old: &'a mut Vec<Slot<T>>,
    new: Vec<Slot<T>>,
    // (from, to) for each moved item.
    moves: Vec<(usize, usize)>,
    committed: bool,
}

impl<T> Placement<'_, T> {
    fn commit(mut self) -> Vec<Slot<T>> {
        self.committed = true;
        mem::take(&mut self.new)
    }
}

impl<T> Drop for Placement<'_, T> {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        for &(from, to) in self.moves.iter().rev() {
            self.old[from] = mem::take(&mut self.new[to]);
        }
    }
}

#[inline]
fn key_of<O: TableOps>(owned: &O::Owned) -> &O::Item {
    <O::Owned as Borrow<O::Item>>::borrow(owned)
}

fn stored_at<T>(inner: &Inner<T>, index: usize) -> &T {
    match inner.slots[index].occupied() {
        Some(owned) => owned,
        None => unreachable!("slot {index} vacated while locked"),
    }
}

impl<O: TableOps> Drop for HashTable<O> {
    fn drop(&mut self) {
        let inner = self.inner.get_mut();
        let mut released = 0usize;
        for slot in inner.slots.iter_mut() {
            if let Slot::Occupied(owned) = mem::take(slot) {
                self.ops.release(owned);
                released += 1;
            }
        }
        if self.config.is_debug() {
            tracing::trace!(released, "teardown");
        }
    }
}

impl<O> core::fmt::Debug for HashTable<O>
where
    O: TableOps,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("HashTable")
            .field("config", &self.config)
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}
