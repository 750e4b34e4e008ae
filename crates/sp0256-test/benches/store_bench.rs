//! Benchmarks for waveform store lookups

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use sp0256_codec::Codec;
use sp0256_core::AllophoneId;
use sp0256_store::WaveformStore;
use sp0256_test::{allophone_set, build_container};

fn delta_store() -> WaveformStore {
    match build_container(Codec::Delta, &allophone_set(9)) {
        Ok((image, _)) => WaveformStore::open(image),
        Err(_) => WaveformStore::empty(),
    }
}

fn bench_cached_fetch(c: &mut Criterion) {
    let store = delta_store();
    let id = AllophoneId::from_address(24);
    store.fetch(id);

    c.bench_function("store_cached_fetch", |b| {
        b.iter(|| store.fetch(black_box(id)))
    });
}

fn bench_cold_fetch(c: &mut Criterion) {
    let store = delta_store();
    let id = AllophoneId::from_address(24);

    c.bench_function("store_cold_fetch", |b| {
        b.iter(|| {
            store.reset();
            store.fetch(black_box(id))
        })
    });
}

fn bench_placeholder_fetch(c: &mut Criterion) {
    let store = WaveformStore::empty();

    c.bench_function("store_placeholder_fetch", |b| {
        b.iter(|| {
            store.evict_nonessential();
            store.fetch(black_box(AllophoneId::from_address(40)))
        })
    });
}

criterion_group!(
    benches,
    bench_cached_fetch,
    bench_cold_fetch,
    bench_placeholder_fetch,
);
criterion_main!(benches);
