use std::process::ExitCode;

use clap::Parser;
use log::{error, info, LevelFilter};
use rand::Rng;
use simplelog::{ColorChoice, Config as LogConfig, TermLogger, TerminalMode};

use photonize::cli::Cli;
use photonize::config::Config;
use photonize::density::{fully_neutral_fractions, DensityFunction, IonizationVariables};
use photonize::driver;
use photonize::geometry::CoordinateVector;
use photonize::ion::NUMBER_OF_IONNAMES;
use photonize::transport::MonochromaticPointSource;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(get_log_level(cli.verbosity));

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn get_log_level(verbosity: usize) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

fn init_logging(level: LevelFilter) {
    TermLogger::init(level, LogConfig::default(), TerminalMode::Mixed, ColorChoice::Auto)
        .expect("failed to initialize terminal logger");
}

/// A uniform generator position source over the configured box; a stand-in
/// for an external snapshot reader until one is supplied.
fn uniform_generator_positions(domain: &photonize::geometry::Box3, n: usize, seed: i32) -> Vec<CoordinateVector> {
    let mut rng = photonize::random::RandomGenerator::new(seed);
    (0..n)
        .map(|_| {
            CoordinateVector::new(
                rng.gen_range(domain.anchor.x()..domain.anchor.x() + domain.sides.x()),
                rng.gen_range(domain.anchor.y()..domain.anchor.y() + domain.sides.y()),
                rng.gen_range(domain.anchor.z()..domain.anchor.z() + domain.sides.z()),
            )
        })
        .collect()
}

struct UniformNeutralGas {
    number_density: f64,
    temperature: f64,
}

impl DensityFunction for UniformNeutralGas {
    fn sample(&self, _point: CoordinateVector) -> IonizationVariables {
        IonizationVariables::new(self.number_density, self.temperature, fully_neutral_fractions())
    }
}

fn run(cli: &Cli) -> photonize::Result<()> {
    let mut config = Config::from_yaml_file(&cli.config)?;
    if let Some(worker_threads) = cli.num_worker_threads {
        config.num_worker_threads = worker_threads;
    }
    if let Some(seed) = cli.seed {
        config.seed = seed;
    }

    let domain = config.domain.to_box3();
    let generator_positions = uniform_generator_positions(&domain, 10_000, config.seed);
    let density = UniformNeutralGas { number_density: 1.0e8, temperature: 1.0e4 };
    let source =
        MonochromaticPointSource::new(domain.center(), 3.288e15, [6.3e-22; NUMBER_OF_IONNAMES]);
    let luminosity = 1.0e49;

    let (_grid, _variables, report) = driver::run(&config, &generator_positions, &density, &source, luminosity)?;

    info!(
        "run finished after {} iterations, converged = {}, max relative change = {:e}",
        report.iterations_run, report.converged, report.max_relative_change
    );
    Ok(())
}
