use std::time::Duration;

use criterion::criterion_group;
use criterion::criterion_main;
use criterion::BatchSize;
use criterion::BenchmarkId;
use criterion::Criterion;
use criterion::Throughput;
use photonize::geometry::{Box3, CoordinateVector};
use photonize::random::RandomGenerator;
use photonize::voronoi::VoronoiGrid;

pub fn voronoi_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("voronoi_compute_grid");
    group.noise_threshold(0.05).measurement_time(Duration::from_secs(20)).sample_size(10);
    for num_generators in [100, 1000] {
        group.throughput(Throughput::Elements(num_generators as u64));
        group.bench_function(BenchmarkId::from_parameter(num_generators), |b| {
            b.iter_batched(|| setup_generators(num_generators), construct_grid, BatchSize::LargeInput)
        });
    }
    group.finish();
}

criterion_group!(benches, voronoi_benchmark);
criterion_main!(benches);

fn construct_grid(positions: Vec<CoordinateVector>) {
    let domain = Box3::new(CoordinateVector::ZERO, CoordinateVector::splat(1.0e5));
    let mut grid = VoronoiGrid::new(domain, [false; 3], 1e-9);
    for p in positions {
        grid.add_cell(p).unwrap();
    }
    grid.compute_grid(4).unwrap();
    grid.finalize().unwrap();
}

fn setup_generators(num_generators: usize) -> Vec<CoordinateVector> {
    let mut rng = RandomGenerator::new(1338);
    (0..num_generators)
        .map(|_| CoordinateVector::new(rng.uniform() * 1.0e5, rng.uniform() * 1.0e5, rng.uniform() * 1.0e5))
        .collect()
}
