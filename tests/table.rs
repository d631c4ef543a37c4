// HashTable integration tests.
//
// Each test documents what behavior is being verified. The core invariants
// exercised:
// - Round-trip: inserted items are found with equal content.
// - Uniqueness: inserting an equal item returns the stored one, no copy.
// - Accounting: live = entries - tombstones; tombstones reset on reorganize.
// - Growth: crossing 7/8 load grows or reclaims; nothing is lost.
// - Rollback: a failed reorganization leaves the table exactly as it was.
// - Ownership: every stored copy is released exactly once.
use dhtable::strhash::{avalanche, multiplicative};
use dhtable::{ErrorFlags, HashTable, StrOps, TableConfig, TableError, TableOps};
use std::cmp::Ordering;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering as AtomicOrdering};
use std::sync::Arc;

#[derive(Clone, Debug, PartialEq)]
struct Record {
    key: String,
    value: i64,
}

fn rec(key: &str, value: i64) -> Record {
    Record {
        key: key.to_owned(),
        value,
    }
}

#[derive(Default)]
struct Tally {
    duplicated: AtomicUsize,
    released: AtomicUsize,
}

// Records keyed by `key`; `value` rides along.
struct RecordOps {
    tally: Arc<Tally>,
    fail_duplicate: Arc<AtomicBool>,
}

impl RecordOps {
    fn new() -> (Self, Arc<Tally>) {
        let tally = Arc::new(Tally::default());
        let ops = Self {
            tally: tally.clone(),
            fail_duplicate: Arc::new(AtomicBool::new(false)),
        };
        (ops, tally)
    }
}

impl TableOps for RecordOps {
    type Item = Record;
    type Owned = Box<Record>;

    fn hash(&self, item: &Record) -> u64 {
        multiplicative(item.key.as_bytes())
    }
    fn rehash(&self, item: &Record) -> u64 {
        avalanche(item.key.as_bytes())
    }
    fn compare(&self, a: &Record, b: &Record) -> Ordering {
        a.key.cmp(&b.key)
    }
    fn duplicate(&self, item: &Record) -> Option<Box<Record>> {
        if self.fail_duplicate.load(AtomicOrdering::Relaxed) {
            return None;
        }
        self.tally.duplicated.fetch_add(1, AtomicOrdering::Relaxed);
        Some(Box::new(item.clone()))
    }
    fn release(&self, owned: Box<Record>) {
        self.tally.released.fetch_add(1, AtomicOrdering::Relaxed);
        drop(owned);
    }
    fn heap_size(&self, owned: &Box<Record>) -> usize {
        std::mem::size_of::<Record>() + owned.key.capacity()
    }
}

// Test: the reference scenario from the table's documentation.
// Verifies: find/remove by key, remove hands back the caller's key, and the
// entries-minus-tombstones accounting.
#[test]
fn hundred_keys_scenario() {
    let (ops, tally) = RecordOps::new();
    let t = HashTable::new(ops).unwrap();
    assert_eq!(t.capacity(), 17);
    for i in 0..100 {
        t.insert(&rec(&i.to_string(), i)).unwrap();
    }

    let probe = rec("42", 0);
    assert_eq!(t.find(&probe).unwrap().value, 42);

    let removed = t.remove(&probe).expect("42 present");
    assert!(std::ptr::eq(removed, &probe));
    assert!(t.find(&probe).is_none());

    let s = t.stats();
    assert_eq!(s.tombstones, 1);
    assert_eq!(s.entries, 100);
    assert_eq!(s.live_entries, 99);
    assert_eq!(s.version, dhtable::STATS_VERSION);
    assert_eq!(tally.released.load(AtomicOrdering::Relaxed), 1);
}

// Test: insert is not an upsert.
// Verifies: the original stored record comes back and no copy is made.
#[test]
fn duplicate_insert_returns_original() {
    let (ops, tally) = RecordOps::new();
    let t = HashTable::new(ops).unwrap();
    t.insert(&rec("k", 1)).unwrap();
    let again = t.insert(&rec("k", 2)).unwrap();
    assert_eq!(again.value, 1);
    drop(again);
    assert_eq!(t.len(), 1);
    assert_eq!(tally.duplicated.load(AtomicOrdering::Relaxed), 1);
}

// Test: growth keeps every item reachable with unchanged content.
// Verifies: capacity only rises at 7/8 load and all entries survive.
#[test]
fn growth_preserves_entries() {
    let (ops, tally) = RecordOps::new();
    let t = HashTable::new(ops).unwrap();
    let mut capacity = t.capacity();
    for i in 0..5_000i64 {
        let before = t.stats();
        t.insert(&rec(&format!("key-{i}"), i * 3)).unwrap();
        let after = t.stats();
        if after.capacity != before.capacity {
            assert!(after.capacity > before.capacity);
            assert_eq!(before.entries, before.capacity - before.capacity / 8);
        }
        assert!(after.capacity >= capacity);
        capacity = after.capacity;
    }
    assert!(capacity >= 5_000 * 8 / 7);
    for i in 0..5_000i64 {
        let found = t.find_with(&rec(&format!("key-{i}"), 0), |r| r.value);
        assert_eq!(found, Some(i * 3));
    }
    assert_eq!(tally.released.load(AtomicOrdering::Relaxed), 0);
    assert_eq!(tally.duplicated.load(AtomicOrdering::Relaxed), 5_000);
}

// Test: churn reclaims tombstones in place instead of growing.
#[test]
fn churn_reclaims_without_growth() {
    let t = HashTable::new(StrOps).unwrap();
    for round in 0..50 {
        for i in 0..10 {
            t.insert(&format!("r{round}-{i}")).unwrap();
        }
        for i in 0..10 {
            assert!(t.remove(&format!("r{round}-{i}")).is_some());
        }
    }
    let s = t.stats();
    assert_eq!(s.capacity, 17);
    assert_eq!(s.live_entries, 0);
    assert!(s.errors.is_empty());
}

// Test: a failed duplicate leaves the slot untouched.
#[test]
fn out_of_memory_on_duplicate() {
    let (ops, _tally) = RecordOps::new();
    let fail = ops.fail_duplicate.clone();
    let t = HashTable::new(ops).unwrap();
    t.insert(&rec("a", 1)).unwrap();

    fail.store(true, AtomicOrdering::Relaxed);
    let err = t.insert(&rec("b", 2)).map(|_| ()).unwrap_err();
    assert_eq!(err, TableError::OutOfMemory);
    // Present items are still returned without duplicating.
    assert_eq!(t.insert(&rec("a", 9)).unwrap().value, 1);
    fail.store(false, AtomicOrdering::Relaxed);

    assert!(t.find(&rec("b", 0)).is_none());
    let s = t.stats();
    assert_eq!(s.live_entries, 1);
    assert_eq!(s.errors, ErrorFlags::OUT_OF_MEMORY);
}

// Hash and compare can be switched into a broken mode where every item
// hashes to slot 0 and compares equal to every other.
struct FaultyOps {
    broken: Arc<AtomicBool>,
}

impl TableOps for FaultyOps {
    type Item = str;
    type Owned = String;

    fn hash(&self, item: &str) -> u64 {
        if self.broken.load(AtomicOrdering::Relaxed) {
            0
        } else {
            multiplicative(item.as_bytes())
        }
    }
    fn rehash(&self, item: &str) -> u64 {
        avalanche(item.as_bytes())
    }
    fn compare(&self, a: &str, b: &str) -> Ordering {
        if self.broken.load(AtomicOrdering::Relaxed) {
            Ordering::Equal
        } else {
            a.cmp(b)
        }
    }
    fn duplicate(&self, item: &str) -> Option<String> {
        Some(item.to_owned())
    }
    fn release(&self, owned: String) {
        drop(owned);
    }
}

// Test: reorganization rollback.
// Assumes: a broken hash/compare pair makes the re-placement lose items.
// Verifies: Interrupted is reported, capacity and contents are unchanged,
// and the table keeps working once the ops behave again.
#[test]
fn failed_reorganization_restores_table() {
    let broken = Arc::new(AtomicBool::new(false));
    let t = HashTable::new(FaultyOps {
        broken: broken.clone(),
    })
    .unwrap();
    let keys: Vec<String> = (0..15).map(|i| format!("item{i}")).collect();
    for k in &keys {
        t.insert(k).unwrap();
    }
    let before = t.stats();
    assert_eq!(before.capacity, 17);

    broken.store(true, AtomicOrdering::Relaxed);
    let err = t.insert("trigger").map(|_| ()).unwrap_err();
    broken.store(false, AtomicOrdering::Relaxed);
    assert_eq!(err, TableError::Interrupted);

    let after = t.stats();
    assert_eq!(after.capacity, before.capacity);
    assert_eq!(after.entries, before.entries);
    assert_eq!(after.tombstones, before.tombstones);
    assert!(after.errors.contains(ErrorFlags::INTERRUPTED));
    assert!(after.errors.contains(ErrorFlags::TABLE_FULL));
    for k in &keys {
        assert_eq!(t.find(k).as_deref().map(String::as_str), Some(k.as_str()));
    }

    // Flags are sticky until cleared.
    let cleared = t.clear_errors();
    assert!(cleared.contains(ErrorFlags::INTERRUPTED));
    assert!(t.stats().errors.is_empty());

    t.insert("trigger").unwrap();
    assert_eq!(t.capacity(), 251);
}

// Test: teardown.
// Verifies: dropping an absent table is a no-op; dropping a table releases
// every stored copy exactly once.
#[test]
fn teardown_releases_everything_once() {
    let absent: Option<HashTable<StrOps>> = None;
    drop(absent);

    let (ops, tally) = RecordOps::new();
    let t = HashTable::new(ops).unwrap();
    for i in 0..300 {
        t.insert(&rec(&format!("t{i}"), i)).unwrap();
    }
    for i in 0..50 {
        t.remove(&rec(&format!("t{i}"), 0)).unwrap();
    }
    assert_eq!(tally.released.load(AtomicOrdering::Relaxed), 50);
    drop(t);
    assert_eq!(tally.released.load(AtomicOrdering::Relaxed), 300);
    assert_eq!(tally.duplicated.load(AtomicOrdering::Relaxed), 300);
}

#[test]
fn counters_and_footprint() {
    let t = HashTable::new(StrOps).unwrap();
    let empty = t.footprint();
    let mut last = t.stats();
    for i in 0..200 {
        t.insert(&format!("word{i}")).unwrap();
        let _ = t.contains("absent");
        let s = t.stats();
        assert!(s.probes > last.probes);
        assert!(s.misses >= last.misses);
        last = s;
    }
    assert!(t.footprint() > empty);
}

#[test]
fn config_validation_and_debug() {
    let err = HashTable::with_config(StrOps, TableConfig::default().initial_capacity(4)).unwrap_err();
    assert_eq!(err, TableError::InvalidCapacity(4));

    let t = HashTable::with_config(StrOps, TableConfig::default().debug(true).initial_capacity(31)).unwrap();
    assert_eq!(t.capacity(), 31);
    assert!(t.config().is_debug());
    t.insert("x").unwrap();
    assert_eq!(t.remove("x"), Some("x"));
    assert_eq!(t.remove("x"), None);
}

/// Invariant: once growth is capped, the insert that needs to grow fails with
/// `TableFull`, raises the flag, and changes nothing; freeing slots lets
/// inserts through again.
#[test]
fn capped_growth_is_terminal() {
    let cfg = TableConfig::default().initial_capacity(17).max_capacity(17);
    let t = HashTable::with_config(StrOps, cfg).unwrap();
    for i in 0..15 {
        t.insert(&format!("word{i}")).unwrap();
    }

    let err = t.insert("overflow").map(|_| ()).unwrap_err();
    assert_eq!(err, TableError::TableFull);
    let s = t.stats();
    assert_eq!(s.errors, ErrorFlags::TABLE_FULL);
    assert_eq!(s.capacity, 17);
    assert_eq!(s.live_entries, 15);
    assert!(!t.contains("overflow"));
    for i in 0..15 {
        assert!(t.contains(&format!("word{i}")));
    }

    for i in 0..5 {
        assert!(t.remove(&format!("word{i}")).is_some());
    }
    t.insert("overflow").unwrap();
    let s = t.stats();
    assert_eq!(s.capacity, 17);
    assert_eq!(s.tombstones, 0);
    assert_eq!(s.live_entries, 11);
    assert_eq!(t.clear_errors(), ErrorFlags::TABLE_FULL);
}
