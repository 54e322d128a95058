//! Commitment, signature and multi-scalar multiplication benchmarks.

use criterion::{criterion_group, criterion_main, measurement::Measurement, BenchmarkGroup, Criterion};
use elliptic_curve::{Field, Group};
use pedersen256::{
    commitment,
    mode::{Mode, Scope},
    Context, MultiMac, Oracle, ProjectivePoint, Scalar, Signature,
};
use rand_core::OsRng;
use sha2::{Digest, Sha256};

fn bench_commit<M: Measurement>(group: &mut BenchmarkGroup<'_, M>) {
    let ctx = Context::get();
    let k = Scalar::random(&mut OsRng);
    group.bench_function("commit", |b| b.iter(|| commitment::commit(ctx, &k, 1000)));
}

fn bench_sign<M: Measurement>(group: &mut BenchmarkGroup<'_, M>) {
    let ctx = Context::get();
    let sk = Scalar::random(&mut OsRng);
    let msg: [u8; 32] = Sha256::digest(b"bench").into();
    group.bench_function("sign", |b| b.iter(|| Signature::sign(ctx, &msg, &sk)));
}

fn bench_verify<M: Measurement>(group: &mut BenchmarkGroup<'_, M>) {
    let ctx = Context::get();
    let sk = Scalar::random(&mut OsRng);
    let pk = ctx.g().mul(&sk);
    let msg: [u8; 32] = Sha256::digest(b"bench").into();
    let sig = Signature::sign(ctx, &msg, &sk);
    group.bench_function("verify", |b| b.iter(|| sig.is_valid(ctx, &msg, &pk)));
}

fn bench_oracle<M: Measurement>(group: &mut BenchmarkGroup<'_, M>) {
    group.bench_function("oracle challenge", |b| {
        let mut oracle = Oracle::new();
        oracle.absorb(b"bench".as_slice());
        b.iter(|| oracle.challenge())
    });
}

fn bench_multimac<M: Measurement>(group: &mut BenchmarkGroup<'_, M>, mode: Mode, label: &str) {
    let ctx = Context::get();
    let terms: Vec<(ProjectivePoint, Scalar)> = (0..4)
        .map(|_| {
            (
                ProjectivePoint::random(&mut OsRng),
                Scalar::random(&mut OsRng),
            )
        })
        .collect();

    group.bench_function(label, |b| {
        b.iter(|| {
            let _scope = Scope::new(mode);
            let mut mm = MultiMac::<4, 1>::new();
            for (p, k) in &terms {
                mm.push_casual(*p, *k);
            }
            mm.push_prepared(ctx.ipp().gen_dot(), Scalar::ONE);
            mm.calculate(ctx)
        })
    });
}

fn bench_protocol(c: &mut Criterion) {
    let mut group = c.benchmark_group("protocol");
    bench_commit(&mut group);
    bench_sign(&mut group);
    bench_verify(&mut group);
    bench_oracle(&mut group);
    group.finish();
}

fn bench_engines(c: &mut Criterion) {
    let mut group = c.benchmark_group("multimac");
    bench_multimac(&mut group, Mode::Fast, "4 casual + 1 prepared, fast");
    bench_multimac(&mut group, Mode::Secure, "4 casual + 1 prepared, secure");
    group.finish();
}

criterion_group!(benches, bench_protocol, bench_engines);
criterion_main!(benches);
