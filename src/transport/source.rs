//! External radiation sources.

use rand::Rng;

use crate::geometry::CoordinateVector;
use crate::ion::{IonName, NUMBER_OF_IONNAMES};
use crate::random::RandomGenerator;

/// An external collaborator emitting photon packets: sampling an emission
/// point and direction, and supplying frequency-dependent ionization cross
/// sections. A driver may supply any source shape; [`MonochromaticPointSource`]
/// is the one concrete implementation the core provides.
pub trait PhotonSource {
    /// Draws one packet's `(position, direction, frequency)`.
    fn sample(&self, rng: &mut RandomGenerator) -> (CoordinateVector, CoordinateVector, f64);

    /// The ionization cross section of `ion` at `frequency`.
    fn cross_section(&self, ion: IonName, frequency: f64) -> f64;
}

/// A point source emitting isotropically at a single frequency, with a
/// fixed cross section per ion (the common idealized test case: an
/// O star treated as monochromatic at its ionizing edge).
pub struct MonochromaticPointSource {
    position: CoordinateVector,
    frequency: f64,
    cross_sections: [f64; NUMBER_OF_IONNAMES],
}

impl MonochromaticPointSource {
    pub fn new(position: CoordinateVector, frequency: f64, cross_sections: [f64; NUMBER_OF_IONNAMES]) -> Self {
        Self { position, frequency, cross_sections }
    }
}

impl PhotonSource for MonochromaticPointSource {
    fn sample(&self, rng: &mut RandomGenerator) -> (CoordinateVector, CoordinateVector, f64) {
        let direction = sample_isotropic_direction(rng);
        (self.position, direction, self.frequency)
    }

    fn cross_section(&self, ion: IonName, _frequency: f64) -> f64 {
        self.cross_sections[ion.index()]
    }
}

/// A uniformly-distributed unit vector on the sphere.
fn sample_isotropic_direction(rng: &mut RandomGenerator) -> CoordinateVector {
    let cos_theta = rng.gen_range(-1.0..1.0);
    let sin_theta = (1.0 - cos_theta * cos_theta).max(0.0).sqrt();
    let phi = rng.gen_range(0.0..2.0 * std::f64::consts::PI);
    CoordinateVector::new(sin_theta * phi.cos(), sin_theta * phi.sin(), cos_theta)
}
