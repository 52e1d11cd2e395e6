//! Per-frame synthesis benchmarks across grid sizes.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use swell_surface::{OceanSurface, SurfaceConfig};

fn bench_update(c: &mut Criterion) {
    let mut group = c.benchmark_group("surface_update");
    for grid in [64usize, 128, 256] {
        let mut surface = OceanSurface::new(SurfaceConfig {
            grid_dimension: grid,
            domain_length: grid as f32,
            expansion: 1,
            ..Default::default()
        })
        .unwrap();

        let mut time = 0.0f32;
        group.bench_with_input(BenchmarkId::from_parameter(grid), &grid, |b, _| {
            b.iter(|| {
                time += 1.0 / 60.0;
                surface.update(time);
                surface.swap_buffers();
            })
        });
    }
    group.finish();
}

fn bench_height_queries(c: &mut Criterion) {
    let mut surface = OceanSurface::new(SurfaceConfig {
        grid_dimension: 128,
        domain_length: 128.0,
        expansion: 1,
        ..Default::default()
    })
    .unwrap();
    surface.update(1.0);
    surface.swap_buffers();

    c.bench_function("height_at", |b| {
        let mut x = 0.0f32;
        b.iter(|| {
            x += 0.37;
            surface.height_at(glam::Vec2::new(x, -x))
        })
    });
}

criterion_group!(benches, bench_update, bench_height_queries);
criterion_main!(benches);
