//! Density initialization from an SPH particle snapshot: cubic M4 spline
//! kernel summed over neighbours found by an [`Octree`].

use std::f64::consts::PI;

use crate::density::octree::Octree;
use crate::density::{DensityFunction, IonizationVariables};
use crate::geometry::CoordinateVector;
use crate::ion::{IonName, NUMBER_OF_IONNAMES, ELEMENTS};

/// Hydrogen atomic mass, kg. Number density assumes a hydrogen-only gas
/// unless overridden at construction.
pub const HYDROGEN_MASS: f64 = 1.674e-27;

/// 3D cubic M4 spline kernel, normalised to integrate to 1 over all space.
pub fn kernel(q: f64, h: f64) -> f64 {
    debug_assert!(h > 0.0);
    let norm = 1.0 / (PI * h * h * h);
    if q < 1.0 {
        (1.0 - 1.5 * q * q + 0.75 * q * q * q) * norm
    } else if q < 2.0 {
        0.25 * (2.0 - q).powi(3) * norm
    } else {
        0.0
    }
}

pub struct SphDensityFunction {
    positions: Vec<CoordinateVector>,
    masses: Vec<f64>,
    smoothing_lengths: Vec<f64>,
    tree: Octree,
    default_temperature: f64,
    default_ionic_fractions: [f64; NUMBER_OF_IONNAMES],
    mean_molecular_mass: f64,
}

impl SphDensityFunction {
    pub fn new(
        positions: Vec<CoordinateVector>,
        masses: Vec<f64>,
        smoothing_lengths: Vec<f64>,
        default_temperature: f64,
        default_ionic_fractions: [f64; NUMBER_OF_IONNAMES],
    ) -> Self {
        let tree = Octree::build(&positions, &smoothing_lengths);
        Self {
            positions,
            masses,
            smoothing_lengths,
            tree,
            default_temperature,
            default_ionic_fractions,
            mean_molecular_mass: HYDROGEN_MASS,
        }
    }

    pub fn mass_density(&self, p: CoordinateVector) -> f64 {
        let ngbs = self.tree.get_ngbs(p, &self.positions, &self.smoothing_lengths);
        let mut rho = 0.0;
        for i in ngbs {
            let h = self.smoothing_lengths[i];
            let q = (self.positions[i] - p).norm() / h;
            rho += self.masses[i] * kernel(q, h);
        }
        rho
    }

    /// Log-binned histogram of pairwise distances, for diagnostics only;
    /// never consumed by the core.
    pub fn neighbour_distance_histogram(&self, bins: usize) -> Vec<usize> {
        let mut histogram = vec![0usize; bins];
        if self.positions.len() < 2 {
            return histogram;
        }
        let mut max_dist: f64 = 0.0;
        for i in 0..self.positions.len() {
            for j in (i + 1)..self.positions.len() {
                max_dist = max_dist.max((self.positions[i] - self.positions[j]).norm());
            }
        }
        if max_dist <= 0.0 {
            return histogram;
        }
        let log_max = max_dist.ln();
        for i in 0..self.positions.len() {
            for j in (i + 1)..self.positions.len() {
                let d = (self.positions[i] - self.positions[j]).norm();
                if d <= 0.0 {
                    continue;
                }
                let t = (d.ln() / log_max).clamp(0.0, 1.0);
                let bin = ((t * bins as f64) as usize).min(bins - 1);
                histogram[bin] += 1;
            }
        }
        histogram
    }
}

impl DensityFunction for SphDensityFunction {
    fn sample(&self, point: CoordinateVector) -> IonizationVariables {
        let rho = self.mass_density(point);
        let number_density = rho / self.mean_molecular_mass;
        IonizationVariables::new(number_density, self.default_temperature, self.default_ionic_fractions)
    }
}

/// The lowest tracked ionization stage of every element set to fraction 1,
/// i.e. a fully neutral (or, for carbon, lowest-tracked-stage) gas.
pub fn fully_neutral_fractions() -> [f64; NUMBER_OF_IONNAMES] {
    let mut fractions = [0.0; NUMBER_OF_IONNAMES];
    for element in ELEMENTS {
        let lowest_stage = IonName::stages_of(element)[0];
        fractions[lowest_stage.index()] = 1.0;
    }
    fractions
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kernel_vanishes_beyond_twice_the_smoothing_length() {
        assert_eq!(kernel(2.0, 1.0), 0.0);
        assert_eq!(kernel(5.0, 1.0), 0.0);
    }

    #[test]
    fn kernel_integrates_to_one_over_a_fine_radial_grid() {
        let h = 1.0;
        let steps = 20_000;
        let dq = 2.0 / steps as f64;
        let mut integral = 0.0;
        for i in 0..steps {
            let q = (i as f64 + 0.5) * dq;
            integral += kernel(q, h) * 4.0 * PI * (q * h).powi(2) * (dq * h);
        }
        assert!((integral - 1.0).abs() < 1e-3);
    }

    #[test]
    fn a_single_particle_gives_the_kernel_peak_density_at_its_own_position() {
        let positions = vec![CoordinateVector::ZERO];
        let masses = vec![1.0];
        let h = vec![1.0];
        let f = SphDensityFunction::new(positions, masses, h, 1.0e4, fully_neutral_fractions());
        let rho_at_center = f.mass_density(CoordinateVector::ZERO);
        let rho_further = f.mass_density(CoordinateVector::new(1.5, 0.0, 0.0));
        assert!(rho_at_center > rho_further);
        assert!(rho_further >= 0.0);
    }
}
