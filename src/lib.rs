//! dhtable: a generic, reentrant open-addressing hash table using double
//! hashing, tombstone deletion and online growth.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: near-constant insert/find/remove for opaque items up to
//!   millions of entries, with the item type described entirely by a
//!   caller-supplied [`TableOps`].
//! - Layers:
//!   - `slot`: the three-state cell (`Empty`, `Tombstone`, `Occupied`).
//!   - `probe`: the double-hashing sequence shared by every operation.
//!   - `capacity`: the growth ladder and the 7/8 load threshold.
//!   - `table`: [`HashTable`], which owns the slot array behind one
//!     reader/writer lock and runs reorganization.
//!
//! Probe sequence
//! - First slot: `hash(x) mod capacity`. On a collision the step is
//!   `rehash(x) mod (capacity >> 3) + 1`, keeping successive probes close.
//! - Lookups skip tombstones and stop at an empty or equal slot. Inserts
//!   remember the first tombstone and store there unless an equal item
//!   turns up later on the path.
//! - Every slot examined counts as a probe, every jump as a miss. Both
//!   counters only grow.
//!
//! Reorganization
//! - Triggered by an insert once non-empty slots reach 7/8 of capacity.
//! - If tombstones exceed a quarter of the live items the array is rebuilt
//!   at the same capacity, otherwise at the next ladder capacity.
//! - All items are placed into the new layout before any is moved. If the
//!   number placed differs from the live count the attempt is abandoned and
//!   the table is exactly as it was, with `INTERRUPTED` recorded.
//!
//! Ownership
//! - Stored items are produced by `TableOps::duplicate` and handed back
//!   through `TableOps::release` exactly once: on remove, on retain, or
//!   when the table is dropped. Reorganization moves items, it never copies
//!   or releases them.
//!
//! Concurrency
//! - `find`, `walk`, `stats` and `footprint` share a read lock; `insert`,
//!   `remove`, `retain` and `clear_errors` take the write lock. Probe and
//!   miss counters are atomics so readers can advance them.
//! - [`Stored`] guards returned by `find`/`insert` hold the read lock.
//! - `TableOps` callbacks run under the lock and must not call back into
//!   the same table, nor may the thread holding a `Stored`; debug builds
//!   panic if they do.
//!
//! Errors
//! - Each failing call returns a [`TableError`]. The same failure is also
//!   OR'd into the sticky [`ErrorFlags`] reported by [`HashTable::stats`],
//!   which only [`HashTable::clear_errors`] resets.
//!
//! Notes and non-goals
//! - No iteration order guarantee, no persistence, no custom allocator.

mod capacity;
mod config;
mod error;
mod ops;
mod probe;
mod reentrancy;
mod slot;
mod stats;
pub mod strhash;
mod table;
mod table_proptest;

// Public surface
pub use capacity::{CAPACITIES, INITIAL_CAPACITY, MIN_CAPACITY};
pub use config::TableConfig;
pub use error::TableError;
pub use ops::TableOps;
pub use stats::{ErrorFlags, Stats, STATS_VERSION};
pub use strhash::StrOps;
pub use table::{HashTable, Stored};
