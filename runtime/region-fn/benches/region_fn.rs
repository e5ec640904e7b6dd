use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use region_alloc::SystemRegion;
use region_fn::RegionFn;

type Counter = RegionFn<(u64,), u64, SystemRegion>;

fn counter() -> Counter {
    let mut total = 0u64;
    Counter::new(move |x: u64| {
        total = total.wrapping_add(x);
        total
    })
    .unwrap()
}

fn bench_construct(c: &mut Criterion) {
    c.bench_function("region_fn_new", |b| b.iter(|| black_box(counter())));
}

fn bench_clone(c: &mut Criterion) {
    let source = counter();
    c.bench_function("region_fn_try_clone", |b| {
        b.iter(|| black_box(source.try_clone().unwrap()))
    });
}

fn bench_invoke(c: &mut Criterion) {
    let mut f = counter();
    c.bench_function("region_fn_call", |b| {
        b.iter(|| f.call(black_box((1,))).unwrap())
    });
}

criterion_group!(benches, bench_construct, bench_clone, bench_invoke);
criterion_main!(benches);
