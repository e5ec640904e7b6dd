use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use region_alloc::{region_vec, RegionAllocator, RegionMap, SystemRegion};

fn bench_allocate_deallocate(c: &mut Criterion) {
    let mut group = c.benchmark_group("allocate_deallocate");
    let alloc = RegionAllocator::<u64, SystemRegion>::new();

    for n in [1usize, 16, 256, 4096] {
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            b.iter(|| {
                let ptr = alloc.allocate(black_box(n)).unwrap();
                unsafe { alloc.deallocate(ptr, n) };
            })
        });
    }
    group.finish();
}

fn bench_containers(c: &mut Criterion) {
    let items: Vec<u32> = (0..1024).collect();

    c.bench_function("region_vec_1024", |b| {
        b.iter(|| region_vec::<u32, SystemRegion>(black_box(&items)).unwrap())
    });

    c.bench_function("region_map_insert_256", |b| {
        b.iter(|| {
            let mut map = RegionMap::<u32, u32, SystemRegion>::new();
            for key in (0..256u32).rev() {
                map.insert(black_box(key), key).unwrap();
            }
            map
        })
    });
}

criterion_group!(benches, bench_allocate_deallocate, bench_containers);
criterion_main!(benches);
