//! The driver loop (C0): initialize the grid, then repeatedly shoot photon
//! packets and solve the ionization balance until the hydrogen neutral
//! fraction stops changing, or the iteration cap is hit.

use log::info;

use crate::config::Config;
use crate::density::{DensityFunction, IonizationVariables};
use crate::error::Result;
use crate::geometry::CoordinateVector;
use crate::ionization;
use crate::rates::{ChargeTransferRates, RecombinationRates};
use crate::transport::{self, CellAccumulators, PhotonSource, TransportContext};
use crate::voronoi::VoronoiGrid;

/// Summary returned once the loop exits, for a driver binary to report or
/// serialise.
pub struct RunReport {
    pub iterations_run: u32,
    pub converged: bool,
    pub max_relative_change: f64,
}

/// Builds the Voronoi grid over `generator_positions`, samples `density`
/// at every generator to seed the per-cell state, then iterates photon
/// transport and the ionization solve until convergence or
/// `config.max_iterations`.
pub fn run(
    config: &Config,
    generator_positions: &[CoordinateVector],
    density: &dyn DensityFunction,
    source: &dyn PhotonSource,
    luminosity: f64,
) -> Result<(VoronoiGrid, Vec<IonizationVariables>, RunReport)> {
    let domain = config.domain.to_box3();
    let mut grid = VoronoiGrid::new(domain, config.domain.periodic, config.eps);
    for &position in generator_positions {
        grid.add_cell(position)?;
    }
    info!("initializing grid with {} generators", grid.len());
    grid.compute_grid(config.num_worker_threads)?;
    grid.finalize()?;

    let mut variables: Vec<IonizationVariables> =
        (0..grid.len()).map(|i| density.sample(grid.generator_position(i))).collect();

    let recombination_rates = RecombinationRates;
    let charge_transfer_rates = ChargeTransferRates;

    let mut report = RunReport { iterations_run: 0, converged: false, max_relative_change: f64::INFINITY };

    for iteration in 0..config.max_iterations {
        for vars in &mut variables {
            vars.reset_accumulators();
        }

        let number_density: Vec<f64> = variables.iter().map(|v| v.number_density).collect();
        let ionic_fractions: Vec<_> = variables.iter().map(|v| v.ionic_fractions).collect();
        let accumulators = CellAccumulators::new(grid.len());
        let ctx = TransportContext {
            grid: &grid,
            accumulators: &accumulators,
            number_density: &number_density,
            ionic_fractions: &ionic_fractions,
            abundances: &config.abundances,
            eps: config.eps,
        };

        let (mean_intensities, totals) = transport::run_iteration(
            &ctx,
            source,
            config.num_worker_threads,
            config.seed,
            config.job_size_hint,
            config.num_photons_per_iteration,
        )?;
        info!(
            "iteration {iteration}: shot {} photons, total weight {:.3e}",
            config.num_photons_per_iteration, totals.total_weight
        );

        for (vars, intensities) in variables.iter_mut().zip(mean_intensities) {
            vars.mean_intensities = intensities;
        }

        ionization::run(
            &mut variables,
            luminosity,
            totals.total_weight,
            config.num_worker_threads,
            &config.abundances,
            &recombination_rates,
            &charge_transfer_rates,
        )?;

        let max_relative_change = variables
            .iter()
            .map(|v| {
                let old = v.neutral_fraction_h_old;
                let new = v.ionic_fractions[crate::ion::IonName::HN.index()];
                if old > 0.0 {
                    ((new - old) / old).abs()
                } else {
                    0.0
                }
            })
            .fold(0.0, f64::max);

        report.iterations_run = iteration + 1;
        report.max_relative_change = max_relative_change;
        info!("iteration {iteration}: max relative change in x(H) = {max_relative_change:e}");

        if max_relative_change < config.convergence_tolerance {
            report.converged = true;
            break;
        }
    }

    Ok((grid, variables, report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abundances::Abundances;
    use crate::config::BoxConfig;
    use crate::density::IonizationVariables as Vars;
    use crate::ion::NUMBER_OF_IONNAMES;
    use crate::transport::MonochromaticPointSource;

    struct ConstantDensity {
        number_density: f64,
        temperature: f64,
    }

    impl DensityFunction for ConstantDensity {
        fn sample(&self, _point: CoordinateVector) -> Vars {
            Vars::new(self.number_density, self.temperature, [0.0; NUMBER_OF_IONNAMES])
        }
    }

    #[test]
    fn a_short_run_converges_or_at_least_respects_the_iteration_cap() {
        let config = Config {
            domain: BoxConfig { anchor: [0.0, 0.0, 0.0], sides: [1.0, 1.0, 1.0], periodic: [false; 3] },
            num_worker_threads: 2,
            seed: 1,
            num_photons_per_iteration: 2000,
            job_size_hint: 100,
            max_iterations: 5,
            convergence_tolerance: 1.0e-2,
            eps: 1e-12,
            abundances: Abundances::default(),
        };
        let positions = vec![
            CoordinateVector::new(0.2, 0.2, 0.2),
            CoordinateVector::new(0.8, 0.2, 0.2),
            CoordinateVector::new(0.5, 0.8, 0.5),
        ];
        let density = ConstantDensity { number_density: 1.0e2, temperature: 1.0e4 };
        let source = MonochromaticPointSource::new(CoordinateVector::splat(0.5), 3.3e15, [1.0e-22; NUMBER_OF_IONNAMES]);

        let (grid, variables, report) = run(&config, &positions, &density, &source, 1.0e48).unwrap();
        assert_eq!(grid.len(), 3);
        assert_eq!(variables.len(), 3);
        assert!(report.iterations_run <= config.max_iterations);
    }
}
