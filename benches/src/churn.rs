//! Timed micro-loops for the object store: bump allocation, free-list
//! churn, and dereference latency. Plain wall-clock loops, printed as
//! ns/op.

use std::hint::black_box;
use std::time::Instant;

use refstore::{Ref, Store};

#[derive(Clone, Copy)]
struct Record {
    field: [u8; 64],
}

impl Record {
    fn filled(value: u8) -> Record {
        Record {
            field: [value; 64],
        }
    }
}

/// Bump-path allocation: no frees, every alloc takes a never-used slot.
fn bench_bump_alloc(iterations: usize) -> f64 {
    let mut store = Store::new();
    for i in 0..1000 {
        black_box(store.alloc(Record::filled(i as u8)));
    }

    let mut store = Store::new();
    let start = Instant::now();
    for i in 0..iterations {
        black_box(store.alloc(Record::filled(i as u8)));
    }
    start.elapsed().as_nanos() as f64 / iterations as f64
}

/// Alloc/free pairs hammering a single free-list slot.
fn bench_alloc_free_churn(iterations: usize) -> f64 {
    let mut store = Store::new();
    for i in 0..1000 {
        let (r, _) = store.alloc(Record::filled(i as u8));
        store.free(black_box(r));
    }

    let start = Instant::now();
    for i in 0..iterations {
        let (r, _) = store.alloc(Record::filled(i as u8));
        store.free(black_box(r));
    }
    start.elapsed().as_nanos() as f64 / iterations as f64
}

/// Dereference latency over a resident working set.
fn bench_get(iterations: usize) -> f64 {
    let mut store = Store::new();
    let refs: Vec<Ref<Record>> = (0..4096)
        .map(|i| store.alloc(Record::filled(i as u8)).0)
        .collect();

    for i in 0..1000 {
        black_box(store.get(refs[i % refs.len()]));
    }

    let start = Instant::now();
    for i in 0..iterations {
        black_box(store.get(refs[(i * 31) % refs.len()]));
    }
    start.elapsed().as_nanos() as f64 / iterations as f64
}

fn main() {
    let iterations = 1_000_000;

    println!("refstore churn ({} iterations per loop)", iterations);
    println!("bump alloc:        {:8.1} ns/op", bench_bump_alloc(iterations));
    println!("alloc/free churn:  {:8.1} ns/op", bench_alloc_free_churn(iterations));
    println!("get:               {:8.1} ns/op", bench_get(iterations));
}
