use std::time::Duration;

use criterion::criterion_group;
use criterion::criterion_main;
use criterion::BatchSize;
use criterion::BenchmarkId;
use criterion::Criterion;
use criterion::Throughput;
use photonize::abundances::Abundances;
use photonize::geometry::{Box3, CoordinateVector};
use photonize::ion::NUMBER_OF_IONNAMES;
use photonize::random::RandomGenerator;
use photonize::transport::{CellAccumulators, MonochromaticPointSource, TransportContext};
use photonize::transport;
use photonize::voronoi::VoronoiGrid;

struct Fixture {
    grid: VoronoiGrid,
    number_density: Vec<f64>,
    ionic_fractions: Vec<[f64; NUMBER_OF_IONNAMES]>,
    abundances: Abundances,
}

fn build_fixture(num_cells: usize) -> Fixture {
    let domain = Box3::new(CoordinateVector::ZERO, CoordinateVector::splat(1.0e5));
    let mut grid = VoronoiGrid::new(domain, [false; 3], 1e-9);
    let mut rng = RandomGenerator::new(77);
    for _ in 0..num_cells {
        let p = CoordinateVector::new(rng.uniform() * 1.0e5, rng.uniform() * 1.0e5, rng.uniform() * 1.0e5);
        grid.add_cell(p).unwrap();
    }
    grid.compute_grid(4).unwrap();
    grid.finalize().unwrap();

    let number_density = vec![1.0e2; num_cells];
    let ionic_fractions = vec![[0.0; NUMBER_OF_IONNAMES]; num_cells];
    Fixture { grid, number_density, ionic_fractions, abundances: Abundances::default() }
}

pub fn transport_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("transport_run_iteration");
    group.noise_threshold(0.05).measurement_time(Duration::from_secs(20)).sample_size(10);
    for num_cells in [100, 500] {
        group.throughput(Throughput::Elements(10_000));
        group.bench_function(BenchmarkId::from_parameter(num_cells), |b| {
            b.iter_batched(
                || build_fixture(num_cells),
                |fixture| {
                    let accumulators = CellAccumulators::new(fixture.grid.len());
                    let ctx = TransportContext {
                        grid: &fixture.grid,
                        accumulators: &accumulators,
                        number_density: &fixture.number_density,
                        ionic_fractions: &fixture.ionic_fractions,
                        abundances: &fixture.abundances,
                        eps: 1e-12,
                    };
                    let source = MonochromaticPointSource::new(
                        fixture.grid.domain().center(),
                        3.3e15,
                        [1.0e-22; NUMBER_OF_IONNAMES],
                    );
                    transport::run_iteration(&ctx, &source, 4, 1, 100, 10_000).unwrap();
                },
                BatchSize::LargeInput,
            )
        });
    }
    group.finish();
}

criterion_group!(benches, transport_benchmark);
criterion_main!(benches);
