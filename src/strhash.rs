//! String hash helpers.
//!
//! Two independent hash functions over bytes, so a `hash`/`rehash` pair is
//! easy to get for string-like items. Any two sufficiently independent
//! functions work equally well; these are conveniences, not part of the
//! engine.

use crate::ops::TableOps;
use core::cmp::Ordering;

/// Fast multiplicative (`h * 31 + b`) hash.
#[inline]
pub fn multiplicative(bytes: &[u8]) -> u64 {
    bytes
        .iter()
        .fold(0u64, |h, &b| h.wrapping_mul(31).wrapping_add(u64::from(b)))
}

/// Jenkins one-at-a-time hash: every input bit affects every output bit.
#[inline]
pub fn avalanche(bytes: &[u8]) -> u64 {
    let mut h: u32 = 0;
    for &b in bytes {
        h = h.wrapping_add(u32::from(b));
        h = h.wrapping_add(h << 10);
        h ^= h >> 6;
    }
    h = h.wrapping_add(h << 3);
    h ^= h >> 11;
    h = h.wrapping_add(h << 15);
    u64::from(h)
}

/// Ready-made [`TableOps`] for string items, stored as `Box<str>`.
#[derive(Clone, Copy, Debug, Default)]
pub struct StrOps;

impl TableOps for StrOps {
    type Item = str;
    type Owned = Box<str>;

    fn hash(&self, item: &str) -> u64 {
        multiplicative(item.as_bytes())
    }

    fn rehash(&self, item: &str) -> u64 {
        avalanche(item.as_bytes())
    }

    fn compare(&self, a: &str, b: &str) -> Ordering {
        a.cmp(b)
    }

    fn duplicate(&self, item: &str) -> Option<Box<str>> {
        Some(Box::from(item))
    }

    fn release(&self, owned: Box<str>) {
        drop(owned);
    }

    fn heap_size(&self, owned: &Box<str>) -> usize {
        owned.len()
    }
}
