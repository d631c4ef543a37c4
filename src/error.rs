//! Per-call failures.

use crate::capacity::MIN_CAPACITY;
use crate::stats::ErrorFlags;
use thiserror::Error;

/// Why a single operation failed. The table is always left structurally
/// valid; the matching [`ErrorFlags`] bit is also accumulated in the table's
/// statistics.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum TableError {
    /// `duplicate` or a slot-array allocation failed.
    #[error("out of memory")]
    OutOfMemory,
    /// Reorganization could not make room: the capacity ladder is exhausted
    /// or growth failed.
    #[error("table full")]
    TableFull,
    /// A reorganization failed its consistency check and was rolled back.
    #[error("reorganization interrupted; table restored to its previous state")]
    Interrupted,
    /// Requested initial capacity is too small for the probe step.
    #[error("initial capacity {0} is below the minimum of {min}", min = MIN_CAPACITY)]
    InvalidCapacity(usize),
}

impl TableError {
    /// The sticky flag recorded for this error.
    pub fn flag(self) -> ErrorFlags {
        match self {
            TableError::OutOfMemory => ErrorFlags::OUT_OF_MEMORY,
            TableError::TableFull => ErrorFlags::TABLE_FULL,
            TableError::Interrupted => ErrorFlags::INTERRUPTED,
            TableError::InvalidCapacity(_) => ErrorFlags::empty(),
        }
    }
}
