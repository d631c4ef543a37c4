use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use dhtable::{HashTable, StrOps};
use hashbrown::HashSet;
use std::time::Duration;

fn lcg(mut s: u64) -> impl Iterator<Item = u64> {
    std::iter::from_fn(move || {
        s = s.wrapping_mul(6364136223846793005).wrapping_add(1);
        Some(s)
    })
}

fn key(n: u64) -> String {
    format!("k{:016x}", n)
}

fn bench_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("insert_10k");
    let keys: Vec<_> = lcg(1).take(10_000).map(key).collect();
    group.bench_function("dhtable", |b| {
        b.iter_batched(
            || HashTable::new(StrOps).unwrap(),
            |t| {
                for k in &keys {
                    drop(t.insert(k).unwrap());
                }
                black_box(t)
            },
            BatchSize::SmallInput,
        )
    });
    group.bench_function("hashbrown", |b| {
        b.iter_batched(
            HashSet::<Box<str>>::new,
            |mut m| {
                for k in &keys {
                    m.insert(Box::from(k.as_str()));
                }
                black_box(m)
            },
            BatchSize::SmallInput,
        )
    });
    group.finish();
}

fn bench_find_hit(c: &mut Criterion) {
    let mut group = c.benchmark_group("find_hit");
    let keys: Vec<_> = lcg(7).take(20_000).map(key).collect();

    let t = HashTable::new(StrOps).unwrap();
    let mut m = HashSet::new();
    for k in &keys {
        drop(t.insert(k).unwrap());
        m.insert(Box::<str>::from(k.as_str()));
    }

    let mut it = keys.iter().cycle();
    group.bench_function("dhtable", |b| {
        b.iter(|| {
            let k = it.next().unwrap();
            black_box(t.contains(k));
        })
    });
    let mut it = keys.iter().cycle();
    group.bench_function("hashbrown", |b| {
        b.iter(|| {
            let k = it.next().unwrap();
            black_box(m.contains(k.as_str()));
        })
    });
    group.finish();
}

fn bench_find_miss(c: &mut Criterion) {
    let mut group = c.benchmark_group("find_miss");
    let t = HashTable::new(StrOps).unwrap();
    let mut m = HashSet::new();
    for x in lcg(11).take(10_000) {
        let k = key(x);
        drop(t.insert(&k).unwrap());
        m.insert(Box::<str>::from(k));
    }

    let mut miss = lcg(0xdead_beef);
    group.bench_function("dhtable", |b| {
        b.iter(|| {
            let k = key(miss.next().unwrap());
            black_box(t.contains(&k));
        })
    });
    let mut miss = lcg(0xdead_beef);
    group.bench_function("hashbrown", |b| {
        b.iter(|| {
            let k = key(miss.next().unwrap());
            black_box(m.contains(k.as_str()));
        })
    });
    group.finish();
}

fn bench_churn(c: &mut Criterion) {
    c.bench_function("dhtable_insert_remove_churn", |b| {
        let t = HashTable::new(StrOps).unwrap();
        let mut keys = lcg(3).map(key);
        let mut window = std::collections::VecDeque::new();
        b.iter(|| {
            let k = keys.next().unwrap();
            drop(t.insert(&k).unwrap());
            window.push_back(k);
            if window.len() > 1_000 {
                let old = window.pop_front().unwrap();
                black_box(t.remove(&old));
            }
        })
    });
}

fn bench_config() -> Criterion {
    Criterion::default()
        .sample_size(50)
        .measurement_time(Duration::from_secs(8))
        .warm_up_time(Duration::from_secs(2))
}

criterion_group! {
    name = benches;
    config = bench_config();
    targets = bench_insert, bench_find_hit, bench_find_miss, bench_churn
}
criterion_main!(benches);
