//! Debug-only reentrancy guard.
//!
//! `TableOps` callbacks run while the table lock is held. A callback that
//! calls back into the same table would deadlock on that lock; in debug
//! builds the guard notices the nested entry on the current thread and
//! panics instead. In release builds this compiles to a zero-cost no-op.

use core::marker::PhantomData;

#[cfg(debug_assertions)]
use std::cell::RefCell;

#[cfg(debug_assertions)]
thread_local! {
    // Addresses of the trackers this thread is currently inside.
    static ACTIVE: RefCell<Vec<usize>> = const { RefCell::new(Vec::new()) };
}

/// Per-table reentrancy tracker. Public entry points take
/// `let _g = self.reentrancy.enter();` before acquiring the lock.
#[derive(Debug, Default)]
pub(crate) struct DebugReentrancy {
    // Non-zero-sized so distinct trackers have distinct addresses.
    _id: u8,
}

impl DebugReentrancy {
    pub(crate) const fn new() -> Self {
        Self { _id: 0 }
    }

    /// Enter a guarded section. In debug builds, panics if this thread is
    /// already inside one for the same tracker.
    #[inline]
    pub(crate) fn enter(&self) -> ReentrancyGuard<'_> {
        #[cfg(debug_assertions)]
        {
            let id = self as *const Self as usize;
            ACTIVE.with(|active| {
                let mut active = active.borrow_mut();
                assert!(
                    !active.contains(&id),
                    "reentrancy detected: table operation called from inside its own callback"
                );
                active.push(id);
            });
            return ReentrancyGuard {
                id,
                _owner: PhantomData,
            };
        }

        #[cfg(not(debug_assertions))]
        {
            return ReentrancyGuard {
                _owner: PhantomData,
            };
        }
    }
}

/// RAII guard returned by `DebugReentrancy::enter`.
pub(crate) struct ReentrancyGuard<'a> {
    #[cfg(debug_assertions)]
    id: usize,
    _owner: PhantomData<&'a DebugReentrancy>,
}

impl Drop for ReentrancyGuard<'_> {
    fn drop(&mut self) {
        #[cfg(debug_assertions)]
        ACTIVE.with(|active| {
            let mut active = active.borrow_mut();
            if let Some(pos) = active.iter().rposition(|&id| id == self.id) {
                active.swap_remove(pos);
            }
        });
    }
}
