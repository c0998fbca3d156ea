use std::time::Duration;

use criterion::criterion_group;
use criterion::criterion_main;
use criterion::BatchSize;
use criterion::BenchmarkId;
use criterion::Criterion;
use criterion::Throughput;
use photonize::abundances::Abundances;
use photonize::density::IonizationVariables;
use photonize::ion::NUMBER_OF_IONNAMES;
use photonize::ionization;
use photonize::random::RandomGenerator;
use photonize::rates::{ChargeTransferRates, RecombinationRates};

fn build_cells(num_cells: usize) -> Vec<IonizationVariables> {
    let mut rng = RandomGenerator::new(42);
    (0..num_cells)
        .map(|_| {
            let mut vars = IonizationVariables::new(1.0e2 + rng.uniform() * 1.0e4, 1.0e4, [0.0; NUMBER_OF_IONNAMES]);
            vars.mean_intensities = [1.0e3 * rng.uniform(); NUMBER_OF_IONNAMES];
            vars
        })
        .collect()
}

pub fn ionization_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("ionization_run");
    group.noise_threshold(0.05).measurement_time(Duration::from_secs(20)).sample_size(10);
    let abundances = Abundances::default();
    let recombination_rates = RecombinationRates;
    let charge_transfer_rates = ChargeTransferRates;
    for num_cells in [1_000, 10_000] {
        group.throughput(Throughput::Elements(num_cells as u64));
        group.bench_function(BenchmarkId::from_parameter(num_cells), |b| {
            b.iter_batched(
                || build_cells(num_cells),
                |mut variables| {
                    ionization::run(
                        &mut variables,
                        1.0e49,
                        1.0e6,
                        4,
                        &abundances,
                        &recombination_rates,
                        &charge_transfer_rates,
                    )
                    .unwrap();
                },
                BatchSize::LargeInput,
            )
        });
    }
    group.finish();
}

criterion_group!(benches, ionization_benchmark);
criterion_main!(benches);
