//! Throughput benchmarks for the hot primitives.

#![allow(clippy::unwrap_used)]

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use lc_primitives::{Drbg, Sha3_256, Shake256, Xdrbg256};

#[cfg(feature = "aes")]
use lc_primitives::{Aead, AesGcm};

fn bench_hash(c: &mut Criterion) {
    let mut group = c.benchmark_group("hash");
    for size in [64usize, 1024, 16384] {
        let msg = vec![0xabu8; size];
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::new("sha3-256", size), &msg, |b, msg| {
            b.iter(|| Sha3_256::digest(msg).unwrap());
        });
        group.bench_with_input(BenchmarkId::new("shake256-x200", size), &msg, |b, msg| {
            b.iter(|| {
                let mut out = [0u8; 200];
                Shake256::hash_into(msg, &mut out).unwrap();
                out
            });
        });
    }
    group.finish();
}

fn bench_drbg(c: &mut Criterion) {
    let mut group = c.benchmark_group("drbg");
    for size in [256usize, 4096] {
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::new("xdrbg256", size), &size, |b, &size| {
            let mut drbg = Xdrbg256::new();
            drbg.seed(b"bench seed", &[]).unwrap();
            let mut out = vec![0u8; size];
            b.iter(|| drbg.generate(&[], &mut out).unwrap());
        });
    }
    group.finish();
}

#[cfg(feature = "aes")]
fn bench_aead(c: &mut Criterion) {
    let mut group = c.benchmark_group("aead");
    for size in [1024usize, 16384] {
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::new("aes-256-gcm", size), &size, |b, &size| {
            let pt = vec![0u8; size];
            let mut ct = vec![0u8; size];
            let mut tag = [0u8; 16];
            b.iter(|| {
                let mut gcm = AesGcm::new();
                gcm.set_key(&[0x42; 32], &[0x24; 12]).unwrap();
                gcm.encrypt(&pt, &mut ct, b"", &mut tag).unwrap();
            });
        });
    }
    group.finish();
}

#[cfg(feature = "aes")]
criterion_group!(benches, bench_hash, bench_drbg, bench_aead);
#[cfg(not(feature = "aes"))]
criterion_group!(benches, bench_hash, bench_drbg);
criterion_main!(benches);
