//! # Graph Benchmarks
//!
//! Performance benchmarks for typegraph-core operations.
//!
//! Run with: `cargo bench -p typegraph-core`

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use serde_json::json;
use std::hint::black_box;
use typegraph_core::{Graph, PropertyDecl, Query, Record, TypeNode};

const SPECIES: [&str; 4] = ["cat", "dog", "bird", "fish"];

/// Records for one pet type followed by `size` pets.
fn pet_records(size: usize) -> Record {
    let mut records = Record::new();
    records.insert(
        "/type/pet".to_string(),
        serde_json::Value::Object(
            TypeNode::new("/type/pet", "Pet")
                .with_property("species", PropertyDecl::unique("string"))
                .with_property("tags", PropertyDecl::many("string"))
                .serialize(),
        ),
    );
    for i in 0..size {
        records.insert(
            format!("/pet/{}", i),
            json!({
                "type": "/type/pet",
                "species": SPECIES[i % SPECIES.len()],
                "tags": [format!("t{}", i % 10)]
            }),
        );
    }
    records
}

// =============================================================================
// BENCHMARKS
// =============================================================================

fn bench_merge(c: &mut Criterion) {
    let mut group = c.benchmark_group("merge");

    for size in [100, 1000, 10000].iter() {
        let records = pet_records(*size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &records, |b, records| {
            b.iter(|| {
                let mut graph = Graph::new();
                graph.merge(records.clone());
                black_box(graph)
            });
        });
    }

    group.finish();
}

fn bench_find(c: &mut Criterion) {
    let mut group = c.benchmark_group("find_full_scan");

    for size in [100, 1000, 10000].iter() {
        let graph = Graph::from_exchange(pet_records(*size));
        let query = Query::of_type("/type/pet")
            .with("species", json!(["cat", "dog"]))
            .with("tags", "t3");
        group.bench_with_input(BenchmarkId::from_parameter(size), &graph, |b, graph| {
            b.iter(|| black_box(graph.find(black_box(&query))));
        });
    }

    group.finish();
}

fn bench_lookup(c: &mut Criterion) {
    let graph = Graph::from_exchange(pet_records(10000));
    c.bench_function("get_by_id", |b| {
        b.iter(|| black_box(graph.get(black_box("/pet/5000"))));
    });
}

criterion_group!(benches, bench_merge, bench_find, bench_lookup);
criterion_main!(benches);
