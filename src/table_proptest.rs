#![cfg(test)]

// Property tests for HashTable kept inside the crate so they can inspect the
// slot array directly.

use crate::ops::TableOps;
use crate::table::HashTable;
use proptest::prelude::*;
use std::cmp::Ordering;
use std::collections::HashSet;

// Deliberately weak hashes so short keys collide and probe chains form.
struct CollidingOps;

impl TableOps for CollidingOps {
    type Item = str;
    type Owned = String;

    fn hash(&self, item: &str) -> u64 {
        item.bytes().next().map_or(0, u64::from)
    }
    fn rehash(&self, item: &str) -> u64 {
        item.len() as u64
    }
    fn compare(&self, a: &str, b: &str) -> Ordering {
        a.cmp(b)
    }
    fn duplicate(&self, item: &str) -> Option<String> {
        Some(item.to_owned())
    }
    fn release(&self, owned: String) {
        drop(owned);
    }
}

#[derive(Clone, Debug)]
enum Op {
    Insert(usize),
    Remove(usize),
    Find(usize),
    RetainShort(usize),
}

fn arb_scenario() -> impl Strategy<Value = (Vec<String>, Vec<Op>)> {
    proptest::collection::hash_set("[a-d]{1,4}", 1..=60).prop_flat_map(|pool| {
        let pool: Vec<String> = pool.into_iter().collect();
        let idx = 0..pool.len();
        let op = prop_oneof![
            4 => idx.clone().prop_map(Op::Insert),
            2 => idx.clone().prop_map(Op::Remove),
            2 => idx.prop_map(Op::Find),
            1 => (1usize..=4).prop_map(Op::RetainShort),
        ];
        proptest::collection::vec(op, 1..200).prop_map(move |ops| (pool.clone(), ops))
    })
}

// Property: state-machine equivalence against std::collections::HashSet.
// Invariants exercised across random operation sequences:
// - insert/find/remove agree with the model; duplicate insert is a no-op.
// - entries == occupied + tombstones, and entries never exceeds capacity.
// - stats counters match the slot array; probes and misses never decrease.
// - capacity only grows or stays put.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine((pool, ops) in arb_scenario()) {
        let sut = HashTable::new(CollidingOps).unwrap();
        let mut model: HashSet<String> = HashSet::new();
        let mut last = sut.stats();

        for op in ops {
            match op {
                Op::Insert(i) => {
                    let k = pool[i].as_str();
                    let stored = sut.insert(k).map(|s| s.clone());
                    prop_assert_eq!(stored.as_deref(), Ok(k));
                    model.insert(k.to_owned());
                }
                Op::Remove(i) => {
                    let k = pool[i].as_str();
                    let removed = sut.remove(k);
                    prop_assert_eq!(removed.is_some(), model.remove(k));
                    if let Some(r) = removed {
                        prop_assert!(core::ptr::eq(r, k), "remove hands back the caller's key");
                    }
                }
                Op::Find(i) => {
                    let k = pool[i].as_str();
                    let found = sut.find_with(k, |s| s.clone());
                    prop_assert_eq!(found.is_some(), model.contains(k));
                    if let Some(s) = found {
                        prop_assert_eq!(s.as_str(), k);
                    }
                }
                Op::RetainShort(n) => {
                    let removed = sut.retain(|s| s.len() < n);
                    let before = model.len();
                    model.retain(|s| s.len() < n);
                    prop_assert_eq!(removed, before - model.len());
                }
            }

            let s = sut.stats();
            prop_assert_eq!(s.live_entries, model.len());
            prop_assert_eq!(sut.len(), model.len());
            prop_assert!(s.entries <= s.capacity);
            prop_assert!(s.probes >= last.probes);
            prop_assert!(s.misses >= last.misses);
            prop_assert!(s.capacity >= last.capacity);
            prop_assert!(s.errors.is_empty());

            let (occupied, tombs) = sut.slot_census();
            prop_assert_eq!(occupied, s.live_entries);
            prop_assert_eq!(tombs, s.tombstones);
            last = s;
        }

        for k in &model {
            prop_assert!(sut.contains(k));
        }
        let mut walked = 0usize;
        let _ = sut.walk(|_| { walked += 1; core::ops::ControlFlow::<()>::Continue(()) });
        prop_assert_eq!(walked, model.len());
    }
}
