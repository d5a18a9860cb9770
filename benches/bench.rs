use ark_std::test_rng;
use criterion::{black_box, BenchmarkId, Criterion};
use rand::{Rng, RngCore};

use fss_point::{
    api,
    group::mask,
    point::{bgi18::Bgi18, PointFunction, DPF},
    Endianness, Params, FSS,
};

#[macro_use]
extern crate criterion;

const DOMAIN_BITS_RANGE: [u8; 3] = [16, 32, 64];
const RANGE_BITS: u8 = 32;

fn rand_point_function<R: Rng>(domain_bits: u8, rng: &mut R) -> PointFunction {
    let params = Params::new(domain_bits, RANGE_BITS).unwrap();
    let alpha = rng.gen::<u64>() & mask(domain_bits);
    let beta = rng.gen::<u64>() & mask(RANGE_BITS);
    PointFunction::new(params, alpha, beta).unwrap()
}

fn rand_buf<R: RngCore>(f: &PointFunction, rng: &mut R) -> Vec<u8> {
    let mut buf = vec![0u8; f.params.rand_buf_size()];
    rng.fill_bytes(&mut buf);
    buf
}

/// Bench the `gen()` function for tree-based point functions
fn gen_point_bench(c: &mut Criterion) {
    let mut rng = test_rng();

    for domain_bits in DOMAIN_BITS_RANGE {
        let f = rand_point_function(domain_bits, &mut rng);
        let buf = rand_buf(&f, &mut rng);

        c.bench_with_input(
            BenchmarkId::new("Point/Gen", domain_bits),
            &domain_bits,
            |b, _| b.iter(|| black_box(Bgi18::gen(&f, &buf))),
        );
    }
}

/// Bench the `eval()` function for tree-based point functions
fn eval_point_bench(c: &mut Criterion) {
    let mut rng = test_rng();

    let mut group = c.benchmark_group("Point/Eval");

    for domain_bits in DOMAIN_BITS_RANGE {
        let f = rand_point_function(domain_bits, &mut rng);

        // Generate keys
        let (k1, k2) = Bgi18::gen(&f, &rand_buf(&f, &mut rng)).unwrap();

        // Random evaluation point
        let p = rng.gen::<u64>() & mask(domain_bits);
        let x = f.alpha;

        group.bench_with_input(
            BenchmarkId::new("P1/Random", domain_bits),
            &domain_bits,
            |b, _| b.iter(|| black_box(Bgi18::eval(&k1, &p))),
        );

        group.bench_with_input(BenchmarkId::new("P1/X", domain_bits), &domain_bits, |b, _| {
            b.iter(|| black_box(Bgi18::eval(&k1, &x)))
        });

        group.bench_with_input(
            BenchmarkId::new("P2/Random", domain_bits),
            &domain_bits,
            |b, _| b.iter(|| black_box(Bgi18::eval(&k2, &p))),
        );

        group.bench_with_input(BenchmarkId::new("P2/X", domain_bits), &domain_bits, |b, _| {
            b.iter(|| black_box(Bgi18::eval(&k2, &x)))
        });
    }
    group.finish();
}

/// Bench full-domain evaluation and the byte-buffer round trip
fn eval_all_bench(c: &mut Criterion) {
    let mut rng = test_rng();

    let mut group = c.benchmark_group("Point/EvalAll");
    group.sample_size(10);

    for domain_bits in [12u8, 16, 20] {
        let f = rand_point_function(domain_bits, &mut rng);
        let (k1, _) = Bgi18::gen(&f, &rand_buf(&f, &mut rng)).unwrap();

        group.bench_with_input(BenchmarkId::new("Typed", domain_bits), &domain_bits, |b, _| {
            b.iter(|| black_box(Bgi18::eval_all(&k1, 0, 0)))
        });

        group.bench_with_input(BenchmarkId::new("Bytes", domain_bits), &domain_bits, |b, _| {
            b.iter(|| black_box(api::eval_all(&k1, &[0], 0, Endianness::Little)))
        });
    }
    group.finish();
}

criterion_group!(benches, gen_point_bench, eval_point_bench, eval_all_bench);
criterion_main!(benches);
