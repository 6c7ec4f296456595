//! Micro benchmarks for write batch encoding, replay, and merging.
#![forbid(unsafe_code)]
#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion, Throughput};
use penumbra::{
    insert_into, BatchGroup, BatchSummary, GroupCommitOptions, KeyMetaData, SequenceNumber,
    SortedMemTable, WriteBatch,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

const OPS_PER_BATCH: u64 = 4_096;
const VALUE_LEN: usize = 100;
const FOLLOWERS: usize = 16;

fn workload(seed: u64) -> Vec<(Vec<u8>, Vec<u8>, bool)> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..OPS_PER_BATCH)
        .map(|i| {
            let key = format!("user{:012}", rng.gen_range(0..1_000_000u64)).into_bytes();
            let mut value = vec![0u8; VALUE_LEN];
            rng.fill(&mut value[..]);
            (key, value, i % 10 == 9)
        })
        .collect()
}

fn fill(ops: &[(Vec<u8>, Vec<u8>, bool)]) -> WriteBatch {
    let mut batch = WriteBatch::new();
    for (i, (key, value, delete)) in ops.iter().enumerate() {
        if *delete {
            batch.delete(key);
        } else if i % 4 == 0 {
            batch.put_with_meta(key, value, KeyMetaData::explicit_expiry(i as u64));
        } else {
            batch.put(key, value);
        }
    }
    batch
}

fn micro_batch(c: &mut Criterion) {
    let mut group = c.benchmark_group("micro/write_batch");
    group.sample_size(30);

    let ops = workload(0xBEEF_F00D);
    group.throughput(Throughput::Elements(OPS_PER_BATCH));
    group.bench_function("encode", |b| {
        b.iter(|| black_box(fill(&ops).approximate_size()));
    });

    let mut batch = fill(&ops);
    batch.set_sequence(SequenceNumber(1));
    group.throughput(Throughput::Elements(OPS_PER_BATCH));
    group.bench_function("iterate_summary", |b| {
        b.iter(|| black_box(BatchSummary::of(&batch).unwrap()));
    });

    group.throughput(Throughput::Elements(OPS_PER_BATCH));
    group.bench_function("insert_sorted_memtable", |b| {
        b.iter_batched(
            SortedMemTable::new,
            |mut mem| {
                insert_into(&batch, &mut mem, None).unwrap();
                black_box(mem.len());
            },
            BatchSize::SmallInput,
        );
    });

    let followers: Vec<WriteBatch> = (0..FOLLOWERS as u64)
        .map(|seed| fill(&workload(seed)[..64]))
        .collect();
    let options = GroupCommitOptions::default();
    group.throughput(Throughput::Elements(FOLLOWERS as u64));
    group.bench_function("group_commit_merge", |b| {
        b.iter(|| {
            let mut group = BatchGroup::new(&followers[0], &options).unwrap();
            for follower in &followers[1..] {
                group.try_add(follower);
            }
            black_box(group.finish(SequenceNumber(0)))
        });
    });

    group.finish();
}

criterion_group!(benches, micro_batch);
criterion_main!(benches);
