//! The YAML-deserialized run configuration: box geometry, periodicity,
//! worker threads, RNG seed, photon budget, convergence caps and
//! abundances.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::abundances::Abundances;
use crate::error::{CoreError, Result};
use crate::geometry::{Box3, CoordinateVector};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoxConfig {
    pub anchor: [f64; 3],
    pub sides: [f64; 3],
    #[serde(default)]
    pub periodic: [bool; 3],
}

impl BoxConfig {
    pub fn to_box3(&self) -> Box3 {
        Box3::new(
            CoordinateVector::new(self.anchor[0], self.anchor[1], self.anchor[2]),
            CoordinateVector::new(self.sides[0], self.sides[1], self.sides[2]),
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub domain: BoxConfig,
    #[serde(default = "default_worker_threads")]
    pub num_worker_threads: usize,
    #[serde(default = "default_seed")]
    pub seed: i32,
    pub num_photons_per_iteration: u64,
    #[serde(default = "default_job_size_hint")]
    pub job_size_hint: u64,
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,
    #[serde(default = "default_convergence_tolerance")]
    pub convergence_tolerance: f64,
    #[serde(default = "default_eps")]
    pub eps: f64,
    #[serde(default)]
    pub abundances: Abundances,
}

fn default_worker_threads() -> usize {
    4
}

fn default_seed() -> i32 {
    1
}

fn default_max_iterations() -> u32 {
    20
}

fn default_convergence_tolerance() -> f64 {
    1.0e-3
}

fn default_job_size_hint() -> u64 {
    100
}

fn default_eps() -> f64 {
    1.0e-12
}

impl Config {
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        serde_yaml::from_str(&contents).map_err(|e| CoreError::InputViolation(format!("invalid run configuration: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_minimal_configuration() {
        let yaml = "\
domain:
  anchor: [0.0, 0.0, 0.0]
  sides: [1.0, 1.0, 1.0]
num_photons_per_iteration: 10000
";
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.num_worker_threads, 4);
        assert_eq!(config.seed, 1);
        assert_eq!(config.max_iterations, 20);
        assert_eq!(config.domain.periodic, [false, false, false]);
    }
}
