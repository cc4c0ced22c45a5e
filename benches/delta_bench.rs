use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::io::Cursor;

use remotesync::{
    apply_codes, generate_codes, ArrayRefTable, EncodeOptions, HashRefTable, SourceIndex,
};

/// Deterministic pseudo-random bytes: every block distinct, no seed crate.
fn generate_test_data(size: usize, seed: u64) -> Vec<u8> {
    let mut state = seed;
    (0..size)
        .map(|_| {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            (state >> 33) as u8
        })
        .collect()
}

/// Scattered single-byte edits: the typical delta-friendly change.
fn edited_copy(data: &[u8]) -> Vec<u8> {
    let mut copy = data.to_vec();
    let step = copy.len() / 8 + 1;
    for offset in (0..copy.len()).step_by(step) {
        copy[offset] ^= 0xA5;
    }
    copy
}

fn bench_index_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("index_build");
    group.sample_size(20);

    let size = 4 * 1024 * 1024;
    let data = generate_test_data(size, 1);
    group.throughput(Throughput::Bytes(size as u64));

    for block_size in [1024u16, 4096] {
        group.bench_with_input(
            BenchmarkId::from_parameter(block_size),
            &block_size,
            |b, &block_size| {
                b.iter(|| SourceIndex::create(Cursor::new(black_box(&data)), block_size).unwrap());
            },
        );
    }
    group.finish();
}

fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode");
    group.sample_size(20);

    let size = 1024 * 1024;
    let block_size = 2048u16;
    let source = generate_test_data(size, 2);
    let target = edited_copy(&source);
    let index = SourceIndex::create(Cursor::new(&source), block_size).unwrap();
    let options = EncodeOptions::default();
    group.throughput(Throughput::Bytes(size as u64));

    let hash_table = HashRefTable::new(&index);
    group.bench_function(BenchmarkId::new("edited", "hash_table"), |b| {
        b.iter(|| {
            generate_codes(
                &hash_table,
                block_size,
                Cursor::new(black_box(&target)),
                &options,
            )
            .unwrap()
        });
    });

    let array_table = ArrayRefTable::new(&index);
    group.bench_function(BenchmarkId::new("edited", "array_table"), |b| {
        b.iter(|| {
            generate_codes(
                &array_table,
                block_size,
                Cursor::new(black_box(&target)),
                &options,
            )
            .unwrap()
        });
    });

    // Nothing matches: the scan rolls byte by byte the whole way.
    let unrelated = generate_test_data(size / 4, 99);
    group.throughput(Throughput::Bytes((size / 4) as u64));
    group.bench_function(BenchmarkId::new("unrelated", "hash_table"), |b| {
        b.iter(|| {
            generate_codes(
                &hash_table,
                block_size,
                Cursor::new(black_box(&unrelated)),
                &options,
            )
            .unwrap()
        });
    });

    group.finish();
}

fn bench_patch(c: &mut Criterion) {
    let mut group = c.benchmark_group("patch");
    group.sample_size(20);

    let size = 1024 * 1024;
    let source = generate_test_data(size, 3);
    let target = edited_copy(&source);
    let index = SourceIndex::create(Cursor::new(&source), 2048).unwrap();
    let list = index
        .generate_codes(Cursor::new(&target), &EncodeOptions::default())
        .unwrap();
    group.throughput(Throughput::Bytes(size as u64));

    group.bench_function("apply_codes", |b| {
        b.iter(|| {
            let mut out = Vec::with_capacity(size);
            apply_codes(&mut Cursor::new(black_box(&source)), &list, &mut out).unwrap();
            out
        });
    });
    group.finish();
}

criterion_group!(benches, bench_index_build, bench_encode, bench_patch);
criterion_main!(benches);
