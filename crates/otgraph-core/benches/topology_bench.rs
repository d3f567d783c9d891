//! # Topology Benchmarks
//!
//! Performance benchmarks for otgraph-core correlation and graph queries.
//!
//! Run with: `cargo bench -p otgraph-core`

use chrono::Utc;
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use otgraph_core::{
    CandidateObservation, Connection, CorrelatorConfig, Correlator, DeviceId, Topology,
};
use std::hint::black_box;
use uuid::Uuid;

/// A batch where every device is reported by two sources sharing a MAC.
fn create_batch(devices: usize) -> Vec<CandidateObservation> {
    let mut batch = Vec::with_capacity(devices * 2);
    for i in 0..devices {
        let mac = format!("02:00:00:{:02x}:{:02x}:{:02x}", (i >> 16) & 0xff, (i >> 8) & 0xff, i & 0xff);
        batch.push(
            CandidateObservation::new("snmp", 80)
                .with_mac(mac.clone())
                .with_hostname(format!("dev-{}", i)),
        );
        batch.push(
            CandidateObservation::new("arp", 60)
                .with_mac(mac.to_uppercase())
                .with_ip(format!("10.{}.{}.{}", (i >> 16) & 0xff, (i >> 8) & 0xff, i & 0xff)),
        );
    }
    batch
}

fn device(i: usize) -> DeviceId {
    DeviceId(Uuid::from_u128(i as u128))
}

/// Linear chain of N devices.
fn create_linear_topology(size: usize) -> Topology {
    let now = Utc::now();
    let mut topology = Topology::new();
    for i in 1..size {
        topology.add_connection(Connection::new(device(i - 1), device(i), now));
    }
    topology
}

// =============================================================================
// BENCHMARKS
// =============================================================================

fn bench_correlation(c: &mut Criterion) {
    let mut group = c.benchmark_group("correlate");

    for size in [10, 100, 500].iter() {
        let batch = create_batch(*size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &batch, |b, batch| {
            b.iter(|| {
                let mut correlator =
                    Correlator::new(CorrelatorConfig::default()).expect("config");
                black_box(correlator.correlate(batch))
            });
        });
    }

    group.finish();
}

fn bench_find_path(c: &mut Criterion) {
    let mut group = c.benchmark_group("find_path");

    for size in [100, 1000, 10000].iter() {
        let topology = create_linear_topology(*size);
        let (start, end) = (device(0), device(size - 1));
        group.bench_with_input(BenchmarkId::from_parameter(size), &topology, |b, t| {
            b.iter(|| black_box(t.find_path(start, end)));
        });
    }

    group.finish();
}

fn bench_add_connection(c: &mut Criterion) {
    let mut group = c.benchmark_group("add_connection");

    for size in [100, 1000, 10000].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            b.iter(|| black_box(create_linear_topology(size)));
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_correlation,
    bench_find_path,
    bench_add_connection
);
criterion_main!(benches);
