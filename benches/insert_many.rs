//! Builds a tree of a few thousand domains, persistently and in place, and
//! loads the same domains from a list file.

#![allow(missing_docs)]

use std::io::Write;

use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use dltree::{Config, DomainKey, Tree};
use tempfile::NamedTempFile;

fn domains() -> Vec<DomainKey> {
    ["com", "org", "net", "io"]
        .into_iter()
        .flat_map(|tld| (0..1000).map(move |i| format!("host{i}.zone{}.{tld}", i % 17)))
        .map(|domain| domain.parse().unwrap())
        .collect()
}

fn insert(c: &mut Criterion) {
    let keys = domains();
    let mut group = c.benchmark_group("insert 4000");

    group.bench_function("persistent", |b| {
        b.iter(|| {
            keys.iter()
                .fold(Tree::new(), |tree, key| tree.insert_key(key.clone(), 0_u32))
        });
    });

    group.bench_function("in place", |b| {
        b.iter(|| {
            let mut tree = Tree::new();
            for key in &keys {
                tree.insert_key_in_place(key.clone(), 0_u32);
            }
            tree
        });
    });

    group.finish();
}

fn load(c: &mut Criterion) {
    let mut file = NamedTempFile::new().unwrap();
    for key in domains() {
        writeln!(file, "{key} value").unwrap();
    }
    let config = Config::default();

    c.bench_function("load 4000", |b| {
        b.iter_batched(
            || file.path().to_path_buf(),
            |path| dltree::load(&path, &config).unwrap(),
            BatchSize::SmallInput,
        );
    });
}

criterion_group!(benches, insert, load);
criterion_main!(benches);
