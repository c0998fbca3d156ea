//! Command-line interface, mirroring the shape of the reference
//! `CommandLineOptions`: a config path, worker-thread and seed overrides,
//! and an occurrence-counted verbosity flag.

use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the YAML run configuration.
    #[clap(long)]
    pub config: PathBuf,

    /// Overrides the configured worker thread count.
    #[clap(long)]
    pub num_worker_threads: Option<usize>,

    /// Overrides the configured base RNG seed.
    #[clap(long)]
    pub seed: Option<i32>,

    #[clap(short, parse(from_occurrences))]
    pub verbosity: usize,
}
