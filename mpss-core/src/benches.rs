//! Backend-generic benchmark functions.
#![allow(clippy::unwrap_used)]

use criterion::{BenchmarkId, Criterion, Throughput};
use rand_core::{CryptoRng, RngCore};

use crate::{
    lagrange_interpolate, share::index_scalar, CommitmentKey, FieldOf, PairingSuite, Polynomial,
};

const DEGREES: [usize; 4] = [2, 8, 32, 128];

/// Benchmark Kate commitment, witness creation and witness verification with
/// the specified backend.
pub fn bench_kate<C: PairingSuite, R: RngCore + CryptoRng>(
    c: &mut Criterion,
    name: &str,
    rng: &mut R,
) {
    let mut group = c.benchmark_group(format!("Kate {name}"));
    for degree in DEGREES {
        group.throughput(Throughput::Elements(degree as u64 + 1));
        let key = CommitmentKey::<C>::insecure_fixed(degree);
        let poly = Polynomial::<FieldOf<C>>::random(degree, rng);
        let x0 = index_scalar::<FieldOf<C>>(1);

        group.bench_with_input(BenchmarkId::new("Commit", degree), &poly, |b, poly| {
            b.iter(|| key.commit(poly).unwrap())
        });

        group.bench_with_input(BenchmarkId::new("Create witness", degree), &poly, |b, poly| {
            b.iter(|| key.create_witness(poly, x0).unwrap())
        });

        let commitment = key.commit(&poly).unwrap();
        let witness = key.create_witness(&poly, x0).unwrap();
        let y0 = poly.evaluate(x0);
        group.bench_function(BenchmarkId::new("Verify evaluation", degree), |b| {
            b.iter(|| assert!(key.verify_eval(&commitment, x0, y0, &witness)))
        });
    }
    group.finish();
}

/// Benchmark Lagrange interpolation with the specified backend.
pub fn bench_interpolation<C: PairingSuite, R: RngCore + CryptoRng>(
    c: &mut Criterion,
    name: &str,
    rng: &mut R,
) {
    let mut group = c.benchmark_group(format!("Interpolation {name}"));
    for degree in DEGREES {
        let poly = Polynomial::<FieldOf<C>>::random(degree, rng);
        let xs: Vec<_> = (1..=degree as u16 + 1)
            .map(index_scalar::<FieldOf<C>>)
            .collect();
        let ys = poly.evaluate_many(&xs);

        group.bench_with_input(
            BenchmarkId::new("Interpolate", degree),
            &(xs, ys),
            |b, (xs, ys)| b.iter(|| lagrange_interpolate::<FieldOf<C>>(xs, ys, degree).unwrap()),
        );
    }
    group.finish();
}
