use criterion::{criterion_group, criterion_main, Criterion};
use rand::thread_rng;

use mpss_bls12_381::*;

fn bench_bls12_381_kate(c: &mut Criterion) {
    let mut rng = thread_rng();

    mpss_core::benches::bench_kate::<Bls12381, _>(c, "bls12-381", &mut rng);
}

fn bench_bls12_381_interpolation(c: &mut Criterion) {
    let mut rng = thread_rng();

    mpss_core::benches::bench_interpolation::<Bls12381, _>(c, "bls12-381", &mut rng);
}

criterion_group!(benches, bench_bls12_381_kate, bench_bls12_381_interpolation);
criterion_main!(benches);
