//! Construction-time settings.

use crate::capacity::{INITIAL_CAPACITY, MIN_CAPACITY};
use crate::error::TableError;

/// Settings fixed when a table is created.
///
/// ```
/// use dhtable::TableConfig;
///
/// let cfg = TableConfig::default().debug(true).initial_capacity(31);
/// assert!(cfg.is_debug());
/// assert_eq!(cfg.capacity(), 31);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TableConfig {
    debug: bool,
    initial_capacity: usize,
    max_capacity: usize,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            debug: false,
            initial_capacity: INITIAL_CAPACITY,
            max_capacity: usize::MAX,
        }
    }
}

impl TableConfig {
    /// Emit per-operation `trace` events for this table.
    pub fn debug(mut self, on: bool) -> Self {
        self.debug = on;
        self
    }

    /// Slot count of the first array. Prime values keep every probe step
    /// coprime with the capacity.
    pub fn initial_capacity(mut self, n: usize) -> Self {
        self.initial_capacity = n;
        self
    }

    /// Largest capacity growth may reach. Once the next ladder capacity
    /// would exceed it, an insert at the load threshold fails with
    /// `TableFull` instead of growing. Unbounded by default.
    pub fn max_capacity(mut self, n: usize) -> Self {
        self.max_capacity = n;
        self
    }

    pub fn is_debug(&self) -> bool {
        self.debug
    }

    pub fn capacity(&self) -> usize {
        self.initial_capacity
    }

    pub fn max(&self) -> usize {
        self.max_capacity
    }

    pub(crate) fn validate(&self) -> Result<(), TableError> {
        if self.initial_capacity < MIN_CAPACITY {
            return Err(TableError::InvalidCapacity(self.initial_capacity));
        }
        Ok(())
    }
}
